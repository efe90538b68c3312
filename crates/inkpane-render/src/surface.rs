//! Drawing surface creation.
//!
//! The stage asks a [`SurfaceFactory`] for a fresh context whenever a pane is
//! first acquired. Hosts back it with real canvases; [`RecordingSurfaces`]
//! hands out recording contexts that stay inspectable after the stage takes
//! ownership of them.

use inkpane_core::{DrawContext, RecordingContext};
use kurbo::{Affine, Point, Rect, Size};
use peniko::Color;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Creates one drawing context per pane.
pub trait SurfaceFactory {
    fn create_surface(&mut self, pane: &str, size: Size) -> Box<dyn DrawContext>;
}

/// Factory producing headless recording surfaces.
///
/// Clones share the same registry, so a test can keep one clone and hand
/// the other to the stage.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurfaces {
    surfaces: Rc<RefCell<HashMap<String, Rc<RefCell<RecordingContext>>>>>,
}

impl RecordingSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent surface created for `pane`.
    pub fn surface(&self, pane: &str) -> Option<Rc<RefCell<RecordingContext>>> {
        self.surfaces.borrow().get(pane).cloned()
    }

    /// Forget every recorded call on every surface.
    pub fn clear_all(&self) {
        for surface in self.surfaces.borrow().values() {
            surface.borrow_mut().clear();
        }
    }
}

impl SurfaceFactory for RecordingSurfaces {
    fn create_surface(&mut self, pane: &str, size: Size) -> Box<dyn DrawContext> {
        let surface = Rc::new(RefCell::new(RecordingContext::new(size)));
        self.surfaces.borrow_mut().insert(pane.to_owned(), Rc::clone(&surface));
        Box::new(SharedSurface(surface))
    }
}

/// A recording context shared with its factory.
#[derive(Debug)]
struct SharedSurface(Rc<RefCell<RecordingContext>>);

impl DrawContext for SharedSurface {
    fn size(&self) -> Size {
        self.0.borrow().size()
    }

    fn save(&mut self) {
        self.0.borrow_mut().save();
    }

    fn restore(&mut self) {
        self.0.borrow_mut().restore();
    }

    fn transform(&mut self, affine: Affine) {
        self.0.borrow_mut().transform(affine);
    }

    fn set_transform(&mut self, affine: Affine) {
        self.0.borrow_mut().set_transform(affine);
    }

    fn begin_path(&mut self) {
        self.0.borrow_mut().begin_path();
    }

    fn move_to(&mut self, p: Point) {
        self.0.borrow_mut().move_to(p);
    }

    fn line_to(&mut self, p: Point) {
        self.0.borrow_mut().line_to(p);
    }

    fn quad_to(&mut self, c: Point, p: Point) {
        self.0.borrow_mut().quad_to(c, p);
    }

    fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.0.borrow_mut().curve_to(c1, c2, p);
    }

    fn close_path(&mut self) {
        self.0.borrow_mut().close_path();
    }

    fn rect(&mut self, rect: Rect) {
        self.0.borrow_mut().rect(rect);
    }

    fn fill(&mut self) {
        self.0.borrow_mut().fill();
    }

    fn stroke(&mut self) {
        self.0.borrow_mut().stroke();
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.0.borrow_mut().fill_rect(rect);
    }

    fn stroke_rect(&mut self, rect: Rect) {
        self.0.borrow_mut().stroke_rect(rect);
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.0.borrow_mut().clear_rect(rect);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.0.borrow_mut().set_fill_color(color);
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.0.borrow_mut().set_stroke_color(color);
    }

    fn set_line_width(&mut self, width: f64) {
        self.0.borrow_mut().set_line_width(width);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.0.borrow_mut().set_global_alpha(alpha);
    }

    fn set_line_dash(&mut self, dashes: &[f64]) {
        self.0.borrow_mut().set_line_dash(dashes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpane_core::DrawOp;

    #[test]
    fn test_surface_shared_with_factory() {
        let surfaces = RecordingSurfaces::new();
        let mut factory = surfaces.clone();
        let mut ctx = factory.create_surface("main", Size::new(100.0, 100.0));
        ctx.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

        let recorded = surfaces.surface("main").unwrap();
        assert_eq!(recorded.borrow().ops(), &[DrawOp::FillRect(Rect::new(0.0, 0.0, 10.0, 10.0))]);
        assert_eq!(ctx.size(), Size::new(100.0, 100.0));

        surfaces.clear_all();
        assert!(recorded.borrow().ops().is_empty());
    }
}
