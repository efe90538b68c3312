//! Viewport zooming.

use super::{InteractionState, StateId, Transition};
use crate::error::RenderResult;
use crate::stage::Stage;
use inkpane_core::{Cursor, KeyInput, Modifiers, PointerInput};
use kurbo::{Point, Vec2};

/// Vertical drag distance, in screen pixels, that scales the zoom by e.
const DRAG_ZOOM_SCALE: f64 = 200.0;

/// Zooms around the point where the drag started: dragging up zooms in.
/// The wheel zooms by the configured step around the pointer.
#[derive(Debug, Default)]
pub struct ZoomingState {
    /// Fixed screen anchor and the last pointer y.
    anchor: Option<(Point, f64)>,
}

impl InteractionState for ZoomingState {
    fn id(&self) -> StateId {
        StateId::Zooming
    }

    fn enter(&mut self, stage: &mut Stage) -> RenderResult<()> {
        stage.set_cursor(Cursor::ZoomIn);
        Ok(())
    }

    fn exit(&mut self, stage: &mut Stage) -> RenderResult<()> {
        self.anchor = None;
        stage.set_cursor(Cursor::Default);
        Ok(())
    }

    fn mouse_down(&mut self, _stage: &mut Stage, input: &PointerInput) -> Transition {
        self.anchor = Some((input.position, input.position.y));
        Transition::Stay
    }

    fn mouse_move(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        if let Some((anchor, last_y)) = self.anchor {
            let dy = input.position.y - last_y;
            stage.zoom_at(anchor, (-dy / DRAG_ZOOM_SCALE).exp());
            self.anchor = Some((anchor, input.position.y));
        }
        Transition::Stay
    }

    fn mouse_up(&mut self, _stage: &mut Stage, _input: &PointerInput) -> Transition {
        self.anchor = None;
        Transition::Stay
    }

    fn wheel(&mut self, stage: &mut Stage, position: Point, delta: Vec2, _modifiers: Modifiers) -> Transition {
        let step = stage.config().zoom_step;
        if delta.y < 0.0 {
            stage.zoom_at(position, step);
        } else if delta.y > 0.0 {
            stage.zoom_at(position, 1.0 / step);
        }
        Transition::Stay
    }

    fn key_down(&mut self, _stage: &mut Stage, input: &KeyInput) -> Transition {
        if input.is("Escape") || input.is("z") { Transition::Root } else { Transition::Stay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::surface::RecordingSurfaces;
    use inkpane_core::Scene;

    fn stage() -> Stage {
        Stage::new(Scene::new(), RecordingSurfaces::new(), StageConfig::default())
    }

    #[test]
    fn test_drag_up_zooms_in_around_anchor() {
        let mut stage = stage();
        let mut state = ZoomingState::default();
        let anchor = Point::new(100.0, 100.0);
        let world_before = stage.screen_to_world(anchor);

        state.mouse_down(&mut stage, &PointerInput::at(anchor));
        state.mouse_move(&mut stage, &PointerInput::at(Point::new(100.0, 50.0)));
        state.mouse_move(&mut stage, &PointerInput::at(Point::new(100.0, -100.0)));
        state.mouse_up(&mut stage, &PointerInput::at(Point::new(100.0, -100.0)));

        assert!((stage.viewport().zoom - 1.0_f64.exp()).abs() < 1e-9);
        let world_after = stage.screen_to_world(anchor);
        assert!((world_before - world_after).hypot() < 1e-9);
    }

    #[test]
    fn test_wheel_steps() {
        let mut stage = stage();
        let mut state = ZoomingState::default();
        state.wheel(&mut stage, Point::ZERO, Vec2::new(0.0, -1.0), Modifiers::NONE);
        assert!((stage.viewport().zoom - 1.1).abs() < 1e-9);
        state.wheel(&mut stage, Point::ZERO, Vec2::new(0.0, 1.0), Modifiers::NONE);
        assert!((stage.viewport().zoom - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_z_or_escape_leaves() {
        let mut stage = stage();
        let mut state = ZoomingState::default();
        assert_eq!(state.key_down(&mut stage, &KeyInput::new("Z")), Transition::Root);
        assert_eq!(state.key_down(&mut stage, &KeyInput::new("Escape")), Transition::Root);
        assert_eq!(state.key_down(&mut stage, &KeyInput::new("x")), Transition::Stay);
    }
}
