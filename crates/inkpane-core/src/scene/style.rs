//! Paint properties and style resolution.

use super::Scene;
use crate::clock::{ElementId, Tick};
use crate::context::DrawContext;
use crate::error::{Error, Result, ensure_non_negative};
use crate::events::Event;
use crate::property::{PaintRef, PaintState, PaintTarget, Paintable, Property, PropertyName};

/// Stroke width used when no element in the chain sets one.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

impl Scene {
    fn set_property(&mut self, id: ElementId, property: PropertyName, apply: impl FnOnce(&mut Paintable, Tick)) -> bool {
        if !self.contains(id) {
            return false;
        }
        let event = Event::PropertyChanged { element: id, property };
        if !self.validate(&[id], &event) {
            return false;
        }
        let tick = self.tick();
        if let Some(shape) = self.get_mut(id) {
            apply(&mut shape.paint, tick);
        }
        self.notify(&[id], &event);
        true
    }

    /// Set or clear the fill paint.
    pub fn set_fill(&mut self, id: ElementId, paint: Option<PaintRef>) -> bool {
        self.set_property(id, PropertyName::Fill, |p, tick| p.fill.set(paint, tick))
    }

    /// Set or clear the stroke paint.
    pub fn set_stroke(&mut self, id: ElementId, paint: Option<PaintRef>) -> bool {
        self.set_property(id, PropertyName::Stroke, |p, tick| p.stroke.set(paint, tick))
    }

    pub fn set_stroke_width(&mut self, id: ElementId, width: f64) -> Result<bool> {
        ensure_non_negative("stroke width", width)?;
        Ok(self.set_property(id, PropertyName::StrokeWidth, |p, tick| {
            p.stroke_width.set(Some(width), tick)
        }))
    }

    /// Opacity in `0.0..=1.0`.
    pub fn set_opacity(&mut self, id: ElementId, opacity: f64) -> Result<bool> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(Error::OutOfRange {
                what: "opacity",
                value: opacity,
            });
        }
        Ok(self.set_property(id, PropertyName::Opacity, |p, tick| {
            p.opacity.set(Some(opacity), tick)
        }))
    }

    pub fn set_inherit(&mut self, id: ElementId, property: PropertyName, inherit: bool) -> bool {
        self.set_property(id, property, |p, tick| p.set_inherit(property, inherit, tick))
    }

    fn resolve<T: Clone>(&self, id: ElementId, pick: impl Fn(&Paintable) -> &Property<T>) -> Option<T> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let shape = self.get(cur)?;
            let property = pick(&shape.paint);
            if let Some(value) = property.get() {
                return Some(value.clone());
            }
            if !property.inherits() {
                return None;
            }
            current = shape.node.parent;
        }
        None
    }

    /// Effective fill, following inheritance.
    pub fn fill(&self, id: ElementId) -> Option<PaintRef> {
        self.resolve(id, Paintable::fill)
    }

    /// Effective stroke, following inheritance.
    pub fn stroke(&self, id: ElementId) -> Option<PaintRef> {
        self.resolve(id, Paintable::stroke)
    }

    pub fn stroke_width(&self, id: ElementId) -> f64 {
        self.resolve(id, Paintable::stroke_width).unwrap_or(DEFAULT_STROKE_WIDTH)
    }

    /// The element's own opacity.
    pub fn opacity(&self, id: ElementId) -> f64 {
        self.get(id).and_then(|s| s.paint.opacity.get().copied()).unwrap_or(1.0)
    }

    /// Product of the opacities from the root down to `id`.
    pub fn effective_opacity(&self, id: ElementId) -> f64 {
        let mut alpha = 1.0;
        let mut current = Some(id);
        while let Some(cur) = current {
            alpha *= self.opacity(cur);
            current = self.parent(cur);
        }
        alpha
    }

    /// Configure `ctx` with the element's resolved styles.
    pub fn apply_styles(&self, id: ElementId, ctx: &mut dyn DrawContext) -> PaintState {
        let fill = self.fill(id);
        let stroke = self.stroke(id);
        if let Some(paint) = &fill {
            paint.apply(id, PaintTarget::Fill, ctx);
        }
        if let Some(paint) = &stroke {
            paint.apply(id, PaintTarget::Stroke, ctx);
            ctx.set_line_width(self.stroke_width(id));
        }
        ctx.set_global_alpha(self.effective_opacity(id));
        PaintState {
            fill: fill.is_some(),
            stroke: stroke.is_some(),
        }
    }
}
