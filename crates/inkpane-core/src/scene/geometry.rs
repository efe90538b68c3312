//! Bounds, transforms and hit testing.

use super::Scene;
use crate::clock::{ElementId, Tick};
use crate::element::Transformable;
use crate::events::Event;
use crate::geometry::{Transform, is_valid_bounds, rect_to_rect, union_all};
use crate::shapes::{ShapeContent, ShapeGeometry};
use kurbo::{Affine, Point, Rect, Vec2};

impl Scene {
    /// Bounding box in the element's own space. Cached until the element is
    /// marked transformed or a descendant changes.
    pub fn bounding_box(&self, id: ElementId) -> Rect {
        let Some(shape) = self.get(id) else {
            return Rect::ZERO;
        };
        if let Some(bbox) = shape.transform.cached_bbox() {
            return bbox;
        }
        let bbox = match &shape.content {
            ShapeContent::Leaf(geometry) => geometry.eval_bounding_box(),
            ShapeContent::Group(group) => group.explicit_bounds().unwrap_or_else(|| {
                union_all(shape.node.children.iter().map(|c| self.bounds_in_parent(*c))).unwrap_or(Rect::ZERO)
            }),
        };
        shape.transform.store_bbox(bbox);
        bbox
    }

    /// Bounding box mapped into the parent's space.
    pub fn bounds_in_parent(&self, id: ElementId) -> Rect {
        self.local_transform(id).affine().transform_rect_bbox(self.bounding_box(id))
    }

    /// Bounding box mapped into world space.
    pub fn world_bounds(&self, id: ElementId) -> Rect {
        self.global_transform(id).affine().transform_rect_bbox(self.bounding_box(id))
    }

    /// Base placement matrix, without rotation and scale.
    pub fn matrix(&self, id: ElementId) -> Transform {
        self.get(id).map(|s| *s.transform.matrix()).unwrap_or_default()
    }

    /// Effective local transform: placement, rotation about the center and
    /// scale about the origin of the bounding box.
    pub fn local_transform(&self, id: ElementId) -> Transform {
        match self.get(id) {
            Some(shape) => {
                let affine = shape.transform.effective(self.bounding_box(id));
                Transform::stamped(affine, shape.transform.last_transformed())
            }
            None => Transform::IDENTITY,
        }
    }

    /// Transform from the element's space to world space.
    pub fn global_transform(&self, id: ElementId) -> Transform {
        self.global_entry(id)
            .map(|(affine, stamp)| Transform::stamped(affine, stamp))
            .unwrap_or_default()
    }

    fn global_entry(&self, id: ElementId) -> Option<(Affine, Tick)> {
        let shape = self.get(id)?;
        let parent = shape.node.parent.and_then(|p| self.global_entry(p));
        if let Some(cached) = shape.transform.cached_global(parent.map(|(_, stamp)| stamp)) {
            return Some(cached);
        }
        let local = shape.transform.effective(self.bounding_box(id));
        let affine = parent.map_or(local, |(outer, _)| outer * local);
        let stamp = self.tick();
        shape.transform.store_global(affine, stamp);
        Some((affine, stamp))
    }

    /// Transform from the element's placement frame (no rotation or scale)
    /// to world space.
    pub fn placement_transform(&self, id: ElementId) -> Transform {
        let Some(shape) = self.get(id) else {
            return Transform::IDENTITY;
        };
        let outer = shape
            .node
            .parent
            .map_or(Affine::IDENTITY, |p| self.global_transform(p).affine());
        Transform::from_affine(outer * shape.transform.placement())
    }

    pub fn local_to_global(&self, id: ElementId, point: Point) -> Point {
        self.global_transform(id).apply(point)
    }

    /// `None` when the global transform is singular.
    pub fn global_to_local(&self, id: ElementId, point: Point) -> Option<Point> {
        self.global_transform(id).apply_inverse(point)
    }

    /// Whether a world-space point lies inside the element.
    pub fn contains_point(&self, id: ElementId, point: Point) -> bool {
        let Some(shape) = self.get(id) else {
            return false;
        };
        match &shape.content {
            ShapeContent::Group(_) => shape
                .node
                .children
                .iter()
                .rev()
                .any(|child| self.contains_point(*child, point)),
            ShapeContent::Leaf(geometry) => match self.global_to_local(id, point) {
                Some(local) => geometry.contains_local(self.bounding_box(id), local, self.control_radius()),
                None => false,
            },
        }
    }

    /// Refit the element to `bounds` in its own space. Any bound-dependent
    /// scale is reset to 1.
    ///
    /// Returns `false` for invalid bounds, bounds the shape refuses, or a
    /// veto from a `BoundsChanged` listener.
    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect) -> bool {
        if !is_valid_bounds(bounds) {
            log::debug!("Rejected invalid bounds {:?} for {}", bounds, id);
            return false;
        }
        let Some(shape) = self.get(id) else {
            return false;
        };
        if let ShapeContent::Leaf(geometry) = &shape.content {
            if !geometry.can_set_bounds(bounds) {
                return false;
            }
        }

        let old = self.bounding_box(id);
        let event = Event::BoundsChanged {
            element: id,
            old,
            new: bounds,
        };
        if !self.validate(&[id], &event) {
            return false;
        }

        let tick = self.tick();
        let children = self.children(id).to_vec();
        if let Some(shape) = self.get_mut(id) {
            match &mut shape.content {
                ShapeContent::Leaf(geometry) => geometry.set_bounds(bounds),
                ShapeContent::Group(group) => {
                    if children.is_empty() || group.explicit_bounds().is_some() {
                        group.set_explicit_bounds(Some(bounds));
                    }
                }
            }
            shape.transform.set_scale(Vec2::new(1.0, 1.0), tick);
        }
        if !children.is_empty() {
            let fit = rect_to_rect(old, bounds);
            for child in children {
                if let Some(c) = self.get_mut(child) {
                    let matrix = c.transform.matrix().affine();
                    c.transform.set_matrix(fit * matrix, tick);
                }
            }
        }
        self.invalidate_ancestors(id);

        self.notify(&[id], &event);
        true
    }

    /// Translate the placement in the parent's space.
    pub fn translate(&mut self, id: ElementId, dx: f64, dy: f64) -> bool {
        self.transform_with(id, |t, tick| t.translate(dx, dy, tick))
    }

    /// Set rotation about the bounding box center, in radians.
    pub fn rotate_to(&mut self, id: ElementId, angle: f64) -> bool {
        self.transform_with(id, |t, tick| t.set_rotation(angle, tick))
    }

    pub fn rotate_by(&mut self, id: ElementId, delta: f64) -> bool {
        let current = self.rotation(id);
        self.rotate_to(id, current + delta)
    }

    pub fn rotation(&self, id: ElementId) -> f64 {
        self.get(id).map_or(0.0, |s| s.transform.rotation())
    }

    pub fn scale(&self, id: ElementId) -> Vec2 {
        self.get(id).map_or(Vec2::new(1.0, 1.0), |s| s.transform.scale())
    }

    /// Set the scale about the bounding box origin. Announced as a
    /// `ScaleChanged` event so size guards can veto it.
    pub fn scale_to(&mut self, id: ElementId, sx: f64, sy: f64) -> bool {
        if !(sx.is_finite() && sy.is_finite()) {
            return false;
        }
        let Some(shape) = self.get(id) else {
            return false;
        };
        let event = Event::ScaleChanged {
            element: id,
            old: shape.transform.scale(),
            new: Vec2::new(sx, sy),
            bounds: self.bounding_box(id),
        };
        if !self.validate(&[id], &event) {
            return false;
        }
        let tick = self.tick();
        if let Some(shape) = self.get_mut(id) {
            shape.transform.set_scale(Vec2::new(sx, sy), tick);
        }
        self.invalidate_ancestors(id);
        self.notify(&[id], &event);
        true
    }

    pub fn skew(&mut self, id: ElementId, kx: f64, ky: f64) -> bool {
        self.transform_with(id, |t, tick| t.skew(kx, ky, tick))
    }

    /// Replace the placement matrix.
    pub fn set_local_transform(&mut self, id: ElementId, affine: Affine) -> bool {
        self.transform_with(id, |t, tick| t.set_matrix(affine, tick))
    }

    fn transform_with(
        &mut self,
        id: ElementId,
        apply: impl FnOnce(&mut Transformable, Tick),
    ) -> bool {
        if !self.contains(id) {
            return false;
        }
        let event = Event::TransformChanged { element: id };
        if !self.validate(&[id], &event) {
            return false;
        }
        let tick = self.tick();
        if let Some(shape) = self.get_mut(id) {
            apply(&mut shape.transform, tick);
        }
        self.invalidate_ancestors(id);
        self.notify(&[id], &event);
        true
    }

    /// Invalidate the element's caches after an out-of-band geometry change.
    pub fn mark_transformed(&mut self, id: ElementId) {
        let tick = self.tick();
        if let Some(shape) = self.get_mut(id) {
            shape.transform.mark_transformed(tick);
        }
        self.invalidate_ancestors(id);
    }

    /// Clear cached bounds on every ancestor of `id`. Ancestors whose
    /// effective transform depends on their bounds are marked transformed.
    pub(crate) fn invalidate_ancestors(&mut self, id: ElementId) {
        if let Some(parent) = self.parent(id) {
            self.invalidate_from(parent);
        }
    }

    /// Like [`Scene::invalidate_ancestors`], starting at `id` itself.
    pub(crate) fn invalidate_from(&mut self, id: ElementId) {
        let tick = self.tick();
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(shape) = self.get_mut(cur) else {
                break;
            };
            if shape.transform.depends_on_bounds() {
                shape.transform.mark_transformed(tick);
            } else {
                shape.transform.clear_bbox();
            }
            current = shape.node.parent;
        }
    }

    /// Typed view of a leaf's geometry.
    pub fn geometry<T: ShapeGeometry>(&self, id: ElementId) -> Option<&T> {
        match &self.get(id)?.content {
            ShapeContent::Leaf(geometry) => geometry.as_any().downcast_ref::<T>(),
            ShapeContent::Group(_) => None,
        }
    }

    /// Edit a leaf's geometry. The edit is made on a copy and announced as a
    /// `BoundsChanged` event; it is committed only if no listener vetoes.
    ///
    /// Returns `None` for an unknown element, a geometry of another type or
    /// a veto.
    pub fn with_geometry_mut<T: ShapeGeometry + Clone, R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let mut edited = self.geometry::<T>(id)?.clone();
        let result = f(&mut edited);
        let event = Event::BoundsChanged {
            element: id,
            old: self.bounding_box(id),
            new: edited.eval_bounding_box(),
        };
        if !self.validate(&[id], &event) {
            return None;
        }
        if let Some(ShapeContent::Leaf(geometry)) = self.get_mut(id).map(|s| &mut s.content) {
            *geometry = Box::new(edited);
        }
        self.mark_transformed(id);
        self.notify(&[id], &event);
        Some(result)
    }
}
