//! Paint properties and shared definitions.

use crate::clock::{ElementId, Tick};
use crate::context::DrawContext;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Names of the paint properties carried by every shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyName {
    Fill,
    Stroke,
    StrokeWidth,
    Opacity,
}

/// Which style a paint is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintTarget {
    Fill,
    Stroke,
}

/// A paint source. Implementations configure the drawing context before a
/// shape fills or strokes its outline.
pub trait Paint: fmt::Debug {
    fn apply(&self, shape: ElementId, target: PaintTarget, ctx: &mut dyn DrawContext);
}

pub type PaintRef = Rc<dyn Paint>;

/// Flat color paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidColor(pub Color);

impl Paint for SolidColor {
    fn apply(&self, _shape: ElementId, target: PaintTarget, ctx: &mut dyn DrawContext) {
        match target {
            PaintTarget::Fill => ctx.set_fill_color(self.0),
            PaintTarget::Stroke => ctx.set_stroke_color(self.0),
        }
    }
}

/// Shorthand for a shared solid color paint.
pub fn solid(color: Color) -> PaintRef {
    Rc::new(SolidColor(color))
}

/// Named, inheritable value stored on a shape and looked up by descendants.
#[derive(Debug, Clone)]
pub enum Definition {
    Paint(PaintRef),
    Value(serde_json::Value),
}

/// A style value with an inherit flag and a change stamp.
///
/// An unset property with `inherit` enabled resolves to the nearest ancestor
/// that sets it.
#[derive(Debug, Clone)]
pub struct Property<T> {
    name: PropertyName,
    value: Option<T>,
    inherit: bool,
    changed: Tick,
}

impl<T: Clone> Property<T> {
    /// An unset property that inherits from its ancestors.
    pub fn inherited(name: PropertyName) -> Self {
        Self {
            name,
            value: None,
            inherit: true,
            changed: Tick::ZERO,
        }
    }

    /// A property with an explicit value.
    pub fn with_value(name: PropertyName, value: T) -> Self {
        Self {
            name,
            value: Some(value),
            inherit: false,
            changed: Tick::ZERO,
        }
    }

    pub fn name(&self) -> PropertyName {
        self.name
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn inherits(&self) -> bool {
        self.inherit
    }

    pub fn changed(&self) -> Tick {
        self.changed
    }

    pub(crate) fn set(&mut self, value: Option<T>, tick: Tick) {
        self.value = value;
        self.changed = tick;
    }

    pub(crate) fn set_inherit(&mut self, inherit: bool, tick: Tick) {
        self.inherit = inherit;
        self.changed = tick;
    }
}

/// The paint state of one shape.
#[derive(Debug, Clone)]
pub struct Paintable {
    pub(crate) fill: Property<PaintRef>,
    pub(crate) stroke: Property<PaintRef>,
    pub(crate) stroke_width: Property<f64>,
    pub(crate) opacity: Property<f64>,
}

impl Default for Paintable {
    fn default() -> Self {
        Self {
            fill: Property::inherited(PropertyName::Fill),
            stroke: Property::inherited(PropertyName::Stroke),
            stroke_width: Property::inherited(PropertyName::StrokeWidth),
            opacity: Property::with_value(PropertyName::Opacity, 1.0),
        }
    }
}

impl Paintable {
    pub fn fill(&self) -> &Property<PaintRef> {
        &self.fill
    }

    pub fn stroke(&self) -> &Property<PaintRef> {
        &self.stroke
    }

    pub fn stroke_width(&self) -> &Property<f64> {
        &self.stroke_width
    }

    pub fn opacity(&self) -> &Property<f64> {
        &self.opacity
    }

    pub(crate) fn set_inherit(&mut self, name: PropertyName, inherit: bool, tick: Tick) {
        match name {
            PropertyName::Fill => self.fill.set_inherit(inherit, tick),
            PropertyName::Stroke => self.stroke.set_inherit(inherit, tick),
            PropertyName::StrokeWidth => self.stroke_width.set_inherit(inherit, tick),
            PropertyName::Opacity => self.opacity.set_inherit(inherit, tick),
        }
    }
}

/// What a leaf should do with its outline after styles were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintState {
    pub fill: bool,
    pub stroke: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawOp, RecordingContext};
    use crate::clock::Context;
    use kurbo::Size;

    #[test]
    fn test_default_paintable_inherits() {
        let paint = Paintable::default();
        assert!(paint.fill().inherits());
        assert!(!paint.fill().is_set());
        assert!(!paint.opacity().inherits());
        assert_eq!(paint.opacity().get(), Some(&1.0));
    }

    #[test]
    fn test_property_set_stamps_tick() {
        let ctx = Context::new();
        let mut width = Property::inherited(PropertyName::StrokeWidth);
        let tick = ctx.tick();
        width.set(Some(3.0), tick);
        assert_eq!(width.get(), Some(&3.0));
        assert_eq!(width.changed(), tick);
    }

    #[test]
    fn test_solid_color_sets_style() {
        let ctx = Context::new();
        let mut recording = RecordingContext::new(Size::new(10.0, 10.0));
        let red = Color::from_rgba8(255, 0, 0, 255);
        SolidColor(red).apply(ctx.next_id(), PaintTarget::Stroke, &mut recording);
        assert_eq!(recording.ops(), &[DrawOp::StrokeColor(red)]);
    }
}
