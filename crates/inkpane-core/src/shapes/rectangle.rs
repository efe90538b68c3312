//! Rectangle shape.

use super::{ShapeGeometry, fill_and_stroke};
use crate::context::{DrawContext, trace_path};
use crate::error::{Result, ensure_non_negative};
use crate::property::PaintState;
use kurbo::{Point, Rect, RoundedRect, Shape as KurboShape};
use std::any::Any;

/// A rectangle with optional rounded corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    /// Top-left corner position.
    pub position: Point,
    width: f64,
    height: f64,
    corner_radius: f64,
}

impl Rectangle {
    /// Create a new rectangle. Negative sizes are rejected.
    pub fn new(position: Point, width: f64, height: f64) -> Result<Self> {
        ensure_non_negative("width", width)?;
        ensure_non_negative("height", height)?;
        Ok(Self {
            position,
            width,
            height,
            corner_radius: 0.0,
        })
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let rect = Rect::from_points(p1, p2);
        Self {
            position: rect.origin(),
            width: rect.width(),
            height: rect.height(),
            corner_radius: 0.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    pub fn set_width(&mut self, width: f64) -> Result<()> {
        ensure_non_negative("width", width)?;
        self.width = width;
        Ok(())
    }

    pub fn set_height(&mut self, height: f64) -> Result<()> {
        ensure_non_negative("height", height)?;
        self.height = height;
        Ok(())
    }

    /// Corner radius (0 = sharp corners).
    pub fn set_corner_radius(&mut self, radius: f64) -> Result<()> {
        ensure_non_negative("corner radius", radius)?;
        self.corner_radius = radius;
        Ok(())
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }
}

impl ShapeGeometry for Rectangle {
    fn type_name(&self) -> &'static str {
        "rectangle"
    }

    fn eval_bounding_box(&self) -> Rect {
        self.as_rect()
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.position = bounds.origin();
        self.width = bounds.width().max(0.0);
        self.height = bounds.height().max(0.0);
    }

    fn draw(&self, ctx: &mut dyn DrawContext, paint: PaintState) {
        ctx.begin_path();
        if self.corner_radius > 0.0 {
            let radius = self.corner_radius.min(self.width / 2.0).min(self.height / 2.0);
            let rounded = RoundedRect::from_rect(self.as_rect(), radius);
            trace_path(ctx, &rounded.to_path(0.1));
        } else {
            ctx.rect(self.as_rect());
        }
        fill_and_stroke(ctx, paint);
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
    use crate::context::{DrawOp, RecordingContext};
    use crate::error::Error;
    use kurbo::Size;

    #[test]
    fn test_rectangle_creation() {
        let rect = Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0).unwrap();
        assert!((rect.position.x - 10.0).abs() < f64::EPSILON);
        assert!((rect.width() - 100.0).abs() < f64::EPSILON);
        assert!((rect.height() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rectangle_from_corners() {
        let rect = Rectangle::from_corners(Point::new(100.0, 100.0), Point::new(0.0, 0.0));
        assert!((rect.position.x - 0.0).abs() < f64::EPSILON);
        assert!((rect.width() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_sizes_rejected() {
        assert!(matches!(
            Rectangle::new(Point::ZERO, -1.0, 5.0),
            Err(Error::NegativeLength { what: "width", .. })
        ));
        let mut rect = Rectangle::new(Point::ZERO, 10.0, 10.0).unwrap();
        assert!(rect.set_corner_radius(-2.0).is_err());
        assert!((rect.corner_radius() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_bounds() {
        let mut rect = Rectangle::new(Point::ZERO, 10.0, 10.0).unwrap();
        rect.set_bounds(Rect::new(5.0, 5.0, 25.0, 45.0));
        assert_eq!(rect.eval_bounding_box(), Rect::new(5.0, 5.0, 25.0, 45.0));
    }

    #[test]
    fn test_draw_plain() {
        let rect = Rectangle::new(Point::ZERO, 10.0, 10.0).unwrap();
        let mut ctx = RecordingContext::new(Size::new(50.0, 50.0));
        rect.draw(&mut ctx, PaintState { fill: true, stroke: false });
        assert_eq!(
            ctx.ops(),
            &[DrawOp::BeginPath, DrawOp::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)), DrawOp::Fill]
        );
    }

    #[test]
    fn test_draw_rounded_uses_path() {
        let mut rect = Rectangle::new(Point::ZERO, 40.0, 20.0).unwrap();
        rect.set_corner_radius(4.0).unwrap();
        let mut ctx = RecordingContext::new(Size::new(50.0, 50.0));
        rect.draw(&mut ctx, PaintState { fill: false, stroke: true });
        assert!(ctx.count(|op| matches!(op, DrawOp::CurveTo(..))) > 0);
        assert_eq!(ctx.ops().last(), Some(&DrawOp::Stroke));
    }
}
