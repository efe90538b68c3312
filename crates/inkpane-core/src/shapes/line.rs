//! Line shape.

use super::ShapeGeometry;
use crate::context::DrawContext;
use crate::controller::{LineController, ShapeController};
use crate::geometry::{remap_point, EPSILON};
use crate::property::PaintState;
use kurbo::{Line as KurboLine, Point, Rect};
use std::any::Any;
use std::rc::Rc;

/// A straight segment between two endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    /// Get the midpoint of the line.
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Endpoint by index: 0 is the start, anything else the end.
    pub fn endpoint(&self, index: usize) -> Point {
        if index == 0 { self.start } else { self.end }
    }

    pub fn set_endpoint(&mut self, index: usize, point: Point) {
        if index == 0 {
            self.start = point;
        } else {
            self.end = point;
        }
    }

    pub fn as_kurbo(&self) -> KurboLine {
        KurboLine::new(self.start, self.end)
    }

    /// Distance from `point` to the segment.
    pub fn distance_to(&self, point: Point) -> f64 {
        let line_vec = self.end - self.start;
        let point_vec = point - self.start;

        let line_len_sq = line_vec.hypot2();
        if line_len_sq < f64::EPSILON {
            return point_vec.hypot();
        }

        // Project point onto line, clamped to segment
        let t = (point_vec.dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
        let projection = self.start + line_vec * t;
        (point - projection).hypot()
    }
}

impl ShapeGeometry for Line {
    fn type_name(&self) -> &'static str {
        "line"
    }

    fn eval_bounding_box(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn set_bounds(&mut self, bounds: Rect) {
        let old = self.eval_bounding_box();
        // A collapsed line regrows along the diagonal.
        if old.width() <= EPSILON && old.height() <= EPSILON {
            self.start = Point::new(bounds.x0, bounds.y0);
            self.end = Point::new(bounds.x1, bounds.y1);
            return;
        }
        self.start = remap_point(self.start, old, bounds);
        self.end = remap_point(self.end, old, bounds);
    }

    fn draw(&self, ctx: &mut dyn DrawContext, paint: PaintState) {
        if !paint.stroke {
            return;
        }
        ctx.begin_path();
        ctx.move_to(self.start);
        ctx.line_to(self.end);
        ctx.stroke();
    }

    fn contains_local(&self, _bbox: Rect, point: Point, tolerance: f64) -> bool {
        self.distance_to(point) <= tolerance
    }

    fn controller(&self) -> Rc<dyn ShapeController> {
        Rc::new(LineController::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
