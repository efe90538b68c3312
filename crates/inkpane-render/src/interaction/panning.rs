//! Viewport panning.

use super::{InteractionState, StateId, Transition};
use crate::error::RenderResult;
use crate::pane::{PaneKind, BACKGROUND_PANE};
use crate::stage::Stage;
use inkpane_core::{Cursor, KeyInput, PointerInput};
use kurbo::Point;

/// Drags the viewport while the pointer is held. Shows the background grid
/// underneath the shapes for as long as the mode is active.
#[derive(Debug, Default)]
pub struct PanningState {
    /// Last pointer position, in screen space.
    last: Option<Point>,
}

impl InteractionState for PanningState {
    fn id(&self) -> StateId {
        StateId::Panning
    }

    fn enter(&mut self, stage: &mut Stage) -> RenderResult<()> {
        stage.acquire_pane(BACKGROUND_PANE, PaneKind::Background);
        stage.move_pane_to_bottom(BACKGROUND_PANE)?;
        stage.set_cursor(Cursor::Grab);
        Ok(())
    }

    fn exit(&mut self, stage: &mut Stage) -> RenderResult<()> {
        self.last = None;
        stage.set_cursor(Cursor::Default);
        stage.release_pane(BACKGROUND_PANE)?;
        Ok(())
    }

    fn mouse_down(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        self.last = Some(input.position);
        stage.set_cursor(Cursor::Grabbing);
        Transition::Stay
    }

    fn mouse_move(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        if let Some(last) = self.last {
            stage.pan(input.position - last);
            self.last = Some(input.position);
        }
        Transition::Stay
    }

    fn mouse_up(&mut self, stage: &mut Stage, _input: &PointerInput) -> Transition {
        self.last = None;
        stage.set_cursor(Cursor::Grab);
        Transition::Stay
    }

    fn mouse_leave(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        self.mouse_up(stage, input)
    }

    fn key_down(&mut self, _stage: &mut Stage, input: &KeyInput) -> Transition {
        if input.is("Escape") { Transition::Root } else { Transition::Stay }
    }

    fn key_up(&mut self, _stage: &mut Stage, input: &KeyInput) -> Transition {
        if input.is(" ") { Transition::Root } else { Transition::Stay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::interaction::InteractionMachine;
    use crate::surface::RecordingSurfaces;
    use inkpane_core::{InputEvent, Scene, EDIT_PANE, MAIN_PANE};

    #[test]
    fn test_space_pans_over_background() {
        let mut stage = Stage::new(Scene::new(), RecordingSurfaces::new(), StageConfig::default());
        let mut machine = InteractionMachine::new();

        let space = KeyInput::new(" ");
        assert_eq!(machine.handle(&mut stage, &InputEvent::KeyDown(space.clone())).unwrap(), StateId::Panning);
        assert_eq!(stage.pane_names(), vec![BACKGROUND_PANE, MAIN_PANE, EDIT_PANE]);
        assert_eq!(stage.cursor(), Cursor::Grab);

        machine
            .handle(&mut stage, &InputEvent::MouseDown(PointerInput::at(Point::new(10.0, 10.0))))
            .unwrap();
        machine
            .handle(&mut stage, &InputEvent::MouseMove(PointerInput::at(Point::new(40.0, 30.0))))
            .unwrap();
        machine
            .handle(&mut stage, &InputEvent::MouseUp(PointerInput::at(Point::new(40.0, 30.0))))
            .unwrap();
        let world = stage.screen_to_world(Point::new(30.0, 20.0));
        assert!(world.x.abs() < 1e-10 && world.y.abs() < 1e-10);

        // Moving without a button held does nothing.
        machine
            .handle(&mut stage, &InputEvent::MouseMove(PointerInput::at(Point::new(90.0, 90.0))))
            .unwrap();
        assert!((stage.viewport().offset.x - 30.0).abs() < 1e-10);

        assert_eq!(machine.handle(&mut stage, &InputEvent::KeyUp(space)).unwrap(), StateId::Default);
        assert!(stage.pane(BACKGROUND_PANE).is_none());
        assert_eq!(stage.cursor(), Cursor::Default);
    }
}
