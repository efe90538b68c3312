//! Ellipse shape.

use super::{ShapeGeometry, fill_and_stroke};
use crate::context::{DrawContext, trace_path};
use crate::error::{Result, ensure_non_negative};
use crate::property::PaintState;
use kurbo::{Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape, Vec2};
use std::any::Any;

/// An axis-aligned ellipse.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    /// Center point.
    pub center: Point,
    radius_x: f64,
    radius_y: f64,
}

impl Ellipse {
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Result<Self> {
        ensure_non_negative("radius_x", radius_x)?;
        ensure_non_negative("radius_y", radius_y)?;
        Ok(Self {
            center,
            radius_x,
            radius_y,
        })
    }

    /// Create an ellipse inscribed in a bounding rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            center: rect.center(),
            radius_x: rect.width() / 2.0,
            radius_y: rect.height() / 2.0,
        }
    }

    pub fn radii(&self) -> Vec2 {
        Vec2::new(self.radius_x, self.radius_y)
    }

    pub fn set_radii(&mut self, radius_x: f64, radius_y: f64) -> Result<()> {
        ensure_non_negative("radius_x", radius_x)?;
        ensure_non_negative("radius_y", radius_y)?;
        self.radius_x = radius_x;
        self.radius_y = radius_y;
        Ok(())
    }

    pub fn as_kurbo(&self) -> KurboEllipse {
        KurboEllipse::new(self.center, self.radii(), 0.0)
    }
}

impl ShapeGeometry for Ellipse {
    fn type_name(&self) -> &'static str {
        "ellipse"
    }

    fn eval_bounding_box(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.center = bounds.center();
        self.radius_x = (bounds.width() / 2.0).max(0.0);
        self.radius_y = (bounds.height() / 2.0).max(0.0);
    }

    fn draw(&self, ctx: &mut dyn DrawContext, paint: PaintState) {
        ctx.begin_path();
        trace_path(ctx, &self.as_kurbo().to_path(0.1));
        fill_and_stroke(ctx, paint);
    }

    /// Exact ellipse test rather than the bounding box.
    fn contains_local(&self, _bbox: Rect, point: Point, _tolerance: f64) -> bool {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 {
            return false;
        }
        let dx = (point.x - self.center.x) / self.radius_x;
        let dy = (point.y - self.center.y) / self.radius_y;
        dx * dx + dy * dy <= 1.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipse_from_rect() {
        let ellipse = Ellipse::from_rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!((ellipse.center.x - 50.0).abs() < f64::EPSILON);
        assert!((ellipse.center.y - 25.0).abs() < f64::EPSILON);
        assert!((ellipse.radii().x - 50.0).abs() < f64::EPSILON);
        assert!((ellipse.radii().y - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ellipse_bounds_round_trip() {
        let mut ellipse = Ellipse::new(Point::ZERO, 1.0, 1.0).unwrap();
        ellipse.set_bounds(Rect::new(10.0, 20.0, 30.0, 60.0));
        assert_eq!(ellipse.eval_bounding_box(), Rect::new(10.0, 20.0, 30.0, 60.0));
    }

    #[test]
    fn test_ellipse_contains() {
        let ellipse = Ellipse::new(Point::new(50.0, 50.0), 50.0, 25.0).unwrap();
        let bbox = ellipse.eval_bounding_box();
        assert!(ellipse.contains_local(bbox, Point::new(50.0, 50.0), 0.0));
        assert!(!ellipse.contains_local(bbox, Point::new(2.0, 27.0), 0.0));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut ellipse = Ellipse::new(Point::ZERO, 5.0, 5.0).unwrap();
        assert!(ellipse.set_radii(-1.0, 3.0).is_err());
        assert!((ellipse.radii().x - 5.0).abs() < f64::EPSILON);
    }
}
