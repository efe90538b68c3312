//! Sizing a new shape with the pointer.

use super::{InteractionState, StateId, Transition};
use crate::error::RenderResult;
use crate::stage::Stage;
use inkpane_core::{Cursor, ElementId, KeyInput, PointerInput, EDIT_PANE, MAIN_PANE};
use kurbo::{Point, Rect};

/// Shapes released with both extents below this are discarded. One zero
/// extent is kept so horizontal and vertical lines survive.
const MIN_EXTENT: f64 = 1e-6;

/// Places the pending shape at the mouse-down point and stretches it to
/// the pointer. The shape is drawn on the edit pane while it is being
/// sized and moves to the main pane when released.
#[derive(Debug, Default)]
pub struct CreatingShapeState {
    pending: Option<ElementId>,
    /// Mouse-down point in world space.
    origin: Option<Point>,
}

impl CreatingShapeState {
    pub fn pending(&self) -> Option<ElementId> {
        self.pending
    }

    fn abandon(&mut self, stage: &mut Stage) {
        self.origin = None;
        if let Some(shape) = self.pending.take() {
            stage.discard(shape);
            log::debug!("Discarded unfinished shape {}", shape);
        }
    }

    fn stretch(&self, stage: &mut Stage, to: Point) -> Option<Rect> {
        let (shape, origin) = (self.pending?, self.origin?);
        let bounds = Rect::from_points(origin, to);
        stage.scene_mut().set_bounds(shape, bounds);
        Some(stage.scene().bounding_box(shape))
    }
}

impl InteractionState for CreatingShapeState {
    fn id(&self) -> StateId {
        StateId::CreatingShape
    }

    fn enter(&mut self, stage: &mut Stage) -> RenderResult<()> {
        stage.set_cursor(Cursor::Crosshair);
        Ok(())
    }

    fn exit(&mut self, stage: &mut Stage) -> RenderResult<()> {
        self.abandon(stage);
        stage.set_cursor(Cursor::Default);
        Ok(())
    }

    fn begin_shape(&mut self, stage: &mut Stage, shape: ElementId) -> bool {
        self.abandon(stage);
        self.pending = Some(shape);
        true
    }

    fn mouse_down(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        let Some(shape) = self.pending else {
            return Transition::Stay;
        };
        if self.origin.is_some() {
            return Transition::Stay;
        }
        let world = stage.screen_to_world(input.position);

        // Collapse the shape onto the down point before it joins the scene,
        // so it only ever grows while attached.
        let scene = stage.scene_mut();
        scene.set_bounds(shape, Rect::from_points(world, world));
        scene.set_pane(shape, Some(EDIT_PANE));
        if !scene.add(shape) {
            log::debug!("Insertion of new shape {} was vetoed", shape);
            self.abandon(stage);
            return Transition::Root;
        }
        self.origin = Some(world);
        Transition::Stay
    }

    fn mouse_move(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        let world = stage.screen_to_world(input.position);
        self.stretch(stage, world);
        Transition::Stay
    }

    fn mouse_up(&mut self, stage: &mut Stage, input: &PointerInput) -> Transition {
        let world = stage.screen_to_world(input.position);
        let Some(bounds) = self.stretch(stage, world) else {
            return Transition::Stay;
        };
        if bounds.width() < MIN_EXTENT && bounds.height() < MIN_EXTENT {
            self.abandon(stage);
            return Transition::Root;
        }

        if let Some(shape) = self.pending.take() {
            stage.scene_mut().set_pane(shape, Some(MAIN_PANE));
            stage.mark_dirty(MAIN_PANE);
            stage.mark_dirty(EDIT_PANE);
            log::info!("Created shape {} at {:?}", shape, bounds);
        }
        self.origin = None;
        Transition::Root
    }

    fn key_down(&mut self, _stage: &mut Stage, input: &KeyInput) -> Transition {
        if input.is("Escape") { Transition::Root } else { Transition::Stay }
    }
}
