//! Shape geometry.
//!
//! A scene element is either a [`Group`] or a leaf carrying a boxed
//! [`ShapeGeometry`]. Geometry lives in the element's own coordinate space;
//! placement, rotation and scale are handled by the scene.

mod ellipse;
mod group;
mod line;
mod rectangle;

pub use ellipse::Ellipse;
pub use group::Group;
pub use line::Line;
pub use rectangle::Rectangle;

use crate::context::DrawContext;
use crate::controller::{GenericController, ShapeController};
use crate::geometry::contains_inclusive;
use crate::property::PaintState;
use kurbo::{Point, Rect};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Leaf shape contract.
pub trait ShapeGeometry: fmt::Debug + 'static {
    /// Short type name, used in logs.
    fn type_name(&self) -> &'static str;

    /// Axis-aligned bounding box in shape space.
    fn eval_bounding_box(&self) -> Rect;

    /// Refit the geometry to `bounds`.
    fn set_bounds(&mut self, bounds: Rect);

    /// Whether `bounds` is acceptable for this shape.
    fn can_set_bounds(&self, _bounds: Rect) -> bool {
        true
    }

    /// Paint the outline. Styles are already applied to `ctx`.
    fn draw(&self, ctx: &mut dyn DrawContext, paint: PaintState);

    /// Point-in-shape test in shape space. `tolerance` is how far outside
    /// a thin outline a point may fall and still count.
    fn contains_local(&self, bbox: Rect, point: Point, _tolerance: f64) -> bool {
        contains_inclusive(bbox, point)
    }

    /// Create this shape's controller.
    fn controller(&self) -> Rc<dyn ShapeController> {
        Rc::new(GenericController::new())
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// What an element holds.
#[derive(Debug)]
pub enum ShapeContent {
    Group(Group),
    Leaf(Box<dyn ShapeGeometry>),
}

impl ShapeContent {
    pub fn is_group(&self) -> bool {
        matches!(self, ShapeContent::Group(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ShapeContent::Group(_) => "group",
            ShapeContent::Leaf(geometry) => geometry.type_name(),
        }
    }

    pub fn geometry(&self) -> Option<&dyn ShapeGeometry> {
        match self {
            ShapeContent::Group(_) => None,
            ShapeContent::Leaf(geometry) => Some(geometry.as_ref()),
        }
    }

    pub(crate) fn controller(&self) -> Rc<dyn ShapeController> {
        match self {
            ShapeContent::Group(_) => Rc::new(GenericController::new()),
            ShapeContent::Leaf(geometry) => geometry.controller(),
        }
    }
}

/// Paint a closed outline according to `paint`.
pub(crate) fn fill_and_stroke(ctx: &mut dyn DrawContext, paint: PaintState) {
    if paint.fill {
        ctx.fill();
    }
    if paint.stroke {
        ctx.stroke();
    }
}
