//! Selection and direct manipulation.

use super::{InteractionState, StateId, Transition};
use crate::stage::Stage;
use inkpane_core::{ControlKind, Cursor, HitInfo, KeyInput, MouseButton, PointerInput};
use kurbo::Point;

/// An active drag: the hit that started it and where, in world space.
#[derive(Debug, Clone, Copy)]
struct Drag {
    hit: HitInfo,
    down: Point,
}

/// Root state. Picks shapes, drags bodies and handles, and dispatches the
/// editing shortcuts.
#[derive(Debug, Default)]
pub struct DefaultState {
    drag: Option<Drag>,
}

impl DefaultState {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn start_drag(&mut self, stage: &mut Stage, hit: HitInfo, down: Point) {
        stage.checkpoint(&hit);
        stage.set_cursor(hit.cursor);
        self.drag = Some(Drag { hit, down });
    }
}

impl InteractionState for DefaultState {
    fn id(&self) -> StateId {
        StateId::Default
    }

    fn exit(&mut self, stage: &mut Stage) -> crate::error::RenderResult<()> {
        self.drag = None;
        stage.set_cursor(Cursor::Default);
        Ok(())
    }

    fn mouse_down(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        if input.button != MouseButton::Left {
            return Transition::Stay;
        }
        let world = stage.screen_to_world(input.position);
        let shift = input.modifiers.shift;

        // Handles of selected shapes win over picking.
        if let Some(hit) = stage.hit_selected(world) {
            if shift && hit.kind == ControlKind::Move {
                stage.unselect(hit.shape);
            } else {
                self.start_drag(stage, hit, world);
            }
            return Transition::Stay;
        }

        match stage.shape_at(world) {
            Some(shape) => {
                if shift {
                    stage.select(shape);
                } else {
                    stage.select_only(shape);
                }
                if stage.selection().contains(shape) {
                    self.start_drag(stage, HitInfo::moving(shape), world);
                }
            }
            None if !shift => {
                stage.clear_selection();
            }
            None => {}
        }
        Transition::Stay
    }

    fn mouse_move(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        let world = stage.screen_to_world(input.position);
        match self.drag {
            Some(drag) => {
                stage.apply_gesture(&drag.hit, drag.down, world);
            }
            None => {
                stage.hover(world);
            }
        }
        Transition::Stay
    }

    fn mouse_up(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        if self.drag.take().is_some() {
            let world = stage.screen_to_world(input.position);
            stage.hover(world);
        }
        Transition::Stay
    }

    fn mouse_leave(&mut self, stage: &mut Stage, _input: &PointerInput) -> Transition {
        self.drag = None;
        stage.set_cursor(Cursor::Default);
        Transition::Stay
    }

    fn key_down(&mut self, stage: &mut Stage, input: &KeyInput) -> Transition {
        if input.is("Escape") {
            self.drag = None;
            stage.clear_selection();
            return Transition::Root;
        }
        if input.is("Backspace") || input.is("Delete") {
            self.drag = None;
            stage.delete_selected();
            return Transition::Stay;
        }
        if input.modifiers.command() {
            if input.is("g") {
                if input.modifiers.shift {
                    stage.ungroup_selected();
                } else {
                    stage.group_selected();
                }
            }
            return Transition::Stay;
        }
        if self.drag.is_some() {
            return Transition::Stay;
        }
        if input.is(" ") {
            return Transition::To(StateId::Panning);
        }
        if input.is("z") {
            return Transition::To(StateId::Zooming);
        }
        Transition::Stay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::surface::RecordingSurfaces;
    use inkpane_core::{Modifiers, Rectangle, Scene, EDIT_PANE, MAIN_PANE};
    use kurbo::Rect;

    fn stage_with(rects: &[Rect]) -> (Stage, Vec<inkpane_core::ElementId>) {
        let mut stage = Stage::new(Scene::new(), RecordingSurfaces::new(), StageConfig::default());
        let ids = rects
            .iter()
            .map(|r| {
                stage
                    .add_shape(Rectangle::new(r.origin(), r.width(), r.height()).unwrap())
                    .unwrap()
            })
            .collect();
        (stage, ids)
    }

    fn at(x: f64, y: f64) -> PointerInput {
        PointerInput::at(Point::new(x, y))
    }

    #[test]
    fn test_click_selects_and_drag_moves() {
        let (mut stage, ids) = stage_with(&[Rect::new(0.0, 0.0, 100.0, 100.0)]);
        let mut state = DefaultState::default();

        state.mouse_down(&mut stage, &at(50.0, 50.0));
        assert_eq!(stage.selection().shapes(), &[ids[0]]);
        assert_eq!(stage.scene().pane_of(ids[0]), EDIT_PANE);
        assert!(state.is_dragging());

        state.mouse_move(&mut stage, &at(70.0, 60.0));
        state.mouse_move(&mut stage, &at(80.0, 70.0));
        state.mouse_up(&mut stage, &at(80.0, 70.0));
        assert!(!state.is_dragging());
        assert_eq!(stage.scene().world_bounds(ids[0]), Rect::new(30.0, 20.0, 130.0, 120.0));
    }

    #[test]
    fn test_empty_click_clears_selection() {
        let (mut stage, ids) = stage_with(&[Rect::new(0.0, 0.0, 100.0, 100.0)]);
        let mut state = DefaultState::default();
        stage.select(ids[0]);

        state.mouse_down(&mut stage, &at(500.0, 500.0));
        assert!(stage.selection().is_empty());
        assert_eq!(stage.scene().pane_of(ids[0]), MAIN_PANE);
        assert!(!state.is_dragging());
    }

    #[test]
    fn test_handle_beats_picking() {
        let (mut stage, ids) = stage_with(&[Rect::new(0.0, 0.0, 100.0, 100.0), Rect::new(95.0, 95.0, 195.0, 195.0)]);
        let mut state = DefaultState::default();
        stage.select(ids[0]);

        state.mouse_down(&mut stage, &at(100.0, 100.0));
        assert_eq!(stage.selection().shapes(), &[ids[0]]);
        assert_eq!(stage.cursor(), Cursor::SeResize);
        state.mouse_move(&mut stage, &at(120.0, 110.0));
        assert_eq!(stage.scene().world_bounds(ids[0]), Rect::new(0.0, 0.0, 120.0, 110.0));
    }

    #[test]
    fn test_shift_click_toggles() {
        let (mut stage, ids) = stage_with(&[Rect::new(0.0, 0.0, 50.0, 50.0), Rect::new(100.0, 0.0, 150.0, 50.0)]);
        let mut state = DefaultState::default();
        let shift = Modifiers::shift();

        state.mouse_down(&mut stage, &at(25.0, 25.0));
        state.mouse_up(&mut stage, &at(25.0, 25.0));
        state.mouse_down(&mut stage, &at(125.0, 25.0).with_modifiers(shift));
        state.mouse_up(&mut stage, &at(125.0, 25.0));
        assert_eq!(stage.selection().shapes(), &[ids[0], ids[1]]);

        state.mouse_down(&mut stage, &at(25.0, 25.0).with_modifiers(shift));
        assert_eq!(stage.selection().shapes(), &[ids[1]]);
        assert!(!state.is_dragging());
    }

    #[test]
    fn test_right_button_ignored() {
        let (mut stage, _) = stage_with(&[Rect::new(0.0, 0.0, 50.0, 50.0)]);
        let mut state = DefaultState::default();
        state.mouse_down(&mut stage, &at(25.0, 25.0).with_button(MouseButton::Right));
        assert!(stage.selection().is_empty());
    }

    #[test]
    fn test_keys() {
        let (mut stage, ids) = stage_with(&[Rect::new(0.0, 0.0, 50.0, 50.0), Rect::new(100.0, 0.0, 150.0, 50.0)]);
        let mut state = DefaultState::default();

        assert_eq!(state.key_down(&mut stage, &KeyInput::new(" ")), Transition::To(StateId::Panning));
        assert_eq!(state.key_down(&mut stage, &KeyInput::new("Z")), Transition::To(StateId::Zooming));

        stage.select(ids[0]);
        stage.select(ids[1]);
        let command = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        state.key_down(&mut stage, &KeyInput::new("g").with_modifiers(command));
        assert_eq!(stage.selection().len(), 1);
        assert!(stage.scene().is_group(stage.selection().shapes()[0]));

        let ungroup = Modifiers { shift: true, ..command };
        state.key_down(&mut stage, &KeyInput::new("G").with_modifiers(ungroup));
        assert_eq!(stage.selection().shapes(), &[ids[0], ids[1]]);

        assert_eq!(state.key_down(&mut stage, &KeyInput::new("Backspace")), Transition::Stay);
        assert!(!stage.scene().contains(ids[0]));
        assert!(!stage.scene().contains(ids[1]));
    }

    #[test]
    fn test_escape_clears_and_returns_root() {
        let (mut stage, ids) = stage_with(&[Rect::new(0.0, 0.0, 50.0, 50.0)]);
        let mut state = DefaultState::default();
        stage.select(ids[0]);
        assert_eq!(state.key_down(&mut stage, &KeyInput::new("Escape")), Transition::Root);
        assert!(stage.selection().is_empty());
    }

    #[test]
    fn test_hover_updates_cursor() {
        let (mut stage, _) = stage_with(&[Rect::new(0.0, 0.0, 50.0, 50.0)]);
        let mut state = DefaultState::default();
        state.mouse_move(&mut stage, &at(25.0, 25.0));
        assert_eq!(stage.cursor(), Cursor::Move);
        state.mouse_move(&mut stage, &at(250.0, 25.0));
        assert_eq!(stage.cursor(), Cursor::Default);
    }
}
