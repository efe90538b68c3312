//! Scene elements.
//!
//! An element combines three concerns: its place in the tree
//! ([`TreeNode`]), its placement in the parent's coordinate space
//! ([`Transformable`]) and its paint state ([`Paintable`]). The scene owns
//! elements in an arena and walks the tree through ids.

use crate::clock::{ElementId, Tick};
use crate::controller::ShapeController;
use crate::events::EventHub;
use crate::geometry::{Transform, scale_about};
use crate::property::{Definition, Paintable};
use crate::shapes::ShapeContent;
use kurbo::{Affine, Rect, Vec2};
use std::cell::{Cell, OnceCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Tree links, metadata and the element's event hub.
#[derive(Debug)]
pub struct TreeNode {
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) metadata: HashMap<String, serde_json::Value>,
    pub(crate) definitions: HashMap<String, Definition>,
    pub(crate) hub: EventHub,
}

impl TreeNode {
    fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            metadata: HashMap::new(),
            definitions: HashMap::new(),
            hub: EventHub::new(),
        }
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub(crate) fn index_of(&self, child: ElementId) -> Option<usize> {
        self.children.iter().position(|c| *c == child)
    }
}

/// Local transform state plus the lazily computed caches depending on it.
///
/// The effective local transform is
/// `matrix * rotate(rotation, center) * scale(scale, origin)`, where center
/// and origin come from the bounding box. Rotation and scale therefore move
/// with the geometry, and every bounds change must mark the element
/// transformed.
#[derive(Debug)]
pub struct Transformable {
    matrix: Transform,
    rotation: f64,
    scale: Vec2,
    last_transformed: Tick,
    bbox: Cell<Option<Rect>>,
    global: Cell<Option<(Affine, Tick)>>,
}

impl Transformable {
    pub fn new(now: Tick) -> Self {
        Self {
            matrix: Transform::IDENTITY,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
            last_transformed: now,
            bbox: Cell::new(None),
            global: Cell::new(None),
        }
    }

    /// Base placement matrix.
    pub fn matrix(&self) -> &Transform {
        &self.matrix
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn last_transformed(&self) -> Tick {
        self.last_transformed
    }

    /// Whether the effective transform changes with the bounding box.
    pub fn depends_on_bounds(&self) -> bool {
        self.rotation != 0.0 || self.scale.x != 1.0 || self.scale.y != 1.0
    }

    /// Invalidate the bounding box and any composed transform.
    pub fn mark_transformed(&mut self, tick: Tick) {
        self.last_transformed = tick;
        self.bbox.set(None);
    }

    pub fn set_matrix(&mut self, affine: Affine, tick: Tick) {
        self.matrix.set(affine, tick);
        self.mark_transformed(tick);
    }

    pub fn translate(&mut self, dx: f64, dy: f64, tick: Tick) {
        self.matrix.translate(dx, dy, tick);
        self.mark_transformed(tick);
    }

    pub fn skew(&mut self, kx: f64, ky: f64, tick: Tick) {
        self.matrix.skew(kx, ky, tick);
        self.mark_transformed(tick);
    }

    pub fn set_rotation(&mut self, angle: f64, tick: Tick) {
        self.rotation = angle;
        self.mark_transformed(tick);
    }

    pub fn set_scale(&mut self, scale: Vec2, tick: Tick) {
        self.scale = scale;
        self.mark_transformed(tick);
    }

    pub(crate) fn cached_bbox(&self) -> Option<Rect> {
        self.bbox.get()
    }

    pub(crate) fn store_bbox(&self, bbox: Rect) {
        self.bbox.set(Some(bbox));
    }

    pub(crate) fn clear_bbox(&self) {
        self.bbox.set(None);
    }

    /// Composed transform, if still valid against the parent's stamp.
    pub(crate) fn cached_global(&self, parent_stamp: Option<Tick>) -> Option<(Affine, Tick)> {
        let (affine, stamp) = self.global.get()?;
        let fresh = stamp >= self.last_transformed && parent_stamp.is_none_or(|p| stamp >= p);
        fresh.then_some((affine, stamp))
    }

    pub(crate) fn store_global(&self, affine: Affine, stamp: Tick) {
        self.global.set(Some((affine, stamp)));
    }

    /// Effective local transform for the given bounding box.
    pub fn effective(&self, bbox: Rect) -> Affine {
        let mut affine = self.matrix.affine();
        if self.rotation != 0.0 {
            affine *= Affine::rotate_about(self.rotation, self.scaled_center(bbox));
        }
        if self.scale.x != 1.0 || self.scale.y != 1.0 {
            affine *= scale_about(self.scale.x, self.scale.y, bbox.origin());
        }
        affine
    }

    /// Center of the bounding box after scaling about its origin.
    pub fn scaled_center(&self, bbox: Rect) -> kurbo::Point {
        kurbo::Point::new(
            bbox.x0 + bbox.width() * self.scale.x / 2.0,
            bbox.y0 + bbox.height() * self.scale.y / 2.0,
        )
    }

    /// Placement without rotation and scale.
    pub fn placement(&self) -> Affine {
        self.matrix.affine()
    }
}

/// One element in the scene arena.
#[derive(Debug)]
pub struct Shape {
    pub(crate) id: ElementId,
    pub(crate) node: TreeNode,
    pub(crate) transform: Transformable,
    pub(crate) paint: Paintable,
    pub(crate) content: ShapeContent,
    pub(crate) controller: OnceCell<Rc<dyn ShapeController>>,
    pub(crate) pane: Option<String>,
}

impl Shape {
    pub(crate) fn new(id: ElementId, content: ShapeContent, now: Tick) -> Self {
        Self {
            id,
            node: TreeNode::new(),
            transform: Transformable::new(now),
            paint: Paintable::default(),
            content,
            controller: OnceCell::new(),
            pane: None,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn node(&self) -> &TreeNode {
        &self.node
    }

    pub fn transformable(&self) -> &Transformable {
        &self.transform
    }

    pub fn paint(&self) -> &Paintable {
        &self.paint
    }

    pub fn content(&self) -> &ShapeContent {
        &self.content
    }

    pub fn is_group(&self) -> bool {
        self.content.is_group()
    }

    pub(crate) fn controller(&self) -> Rc<dyn ShapeController> {
        Rc::clone(self.controller.get_or_init(|| self.content.controller()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Context;
    use kurbo::Point;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_mark_transformed_clears_bbox() {
        let ctx = Context::new();
        let mut t = Transformable::new(ctx.tick());
        t.store_bbox(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert!(t.cached_bbox().is_some());
        t.mark_transformed(ctx.tick());
        assert!(t.cached_bbox().is_none());
    }

    #[test]
    fn test_global_cache_staleness() {
        let ctx = Context::new();
        let mut t = Transformable::new(ctx.tick());
        let parent = ctx.tick();
        let stamp = ctx.tick();
        t.store_global(Affine::IDENTITY, stamp);
        assert!(t.cached_global(Some(parent)).is_some());

        let newer_parent = ctx.tick();
        assert!(t.cached_global(Some(newer_parent)).is_none());

        t.mark_transformed(ctx.tick());
        assert!(t.cached_global(None).is_none());
    }

    #[test]
    fn test_rotation_about_center() {
        let ctx = Context::new();
        let mut t = Transformable::new(ctx.tick());
        t.set_rotation(FRAC_PI_2, ctx.tick());
        let bbox = Rect::new(0.0, 0.0, 10.0, 10.0);
        let center = t.effective(bbox) * Point::new(5.0, 5.0);
        assert!((center - Point::new(5.0, 5.0)).hypot() < 1e-9);
        let corner = t.effective(bbox) * Point::new(0.0, 0.0);
        assert!((corner - Point::new(10.0, 0.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_scale_about_origin() {
        let ctx = Context::new();
        let mut t = Transformable::new(ctx.tick());
        t.set_scale(Vec2::new(2.0, 3.0), ctx.tick());
        let bbox = Rect::new(10.0, 10.0, 20.0, 20.0);
        let p = t.effective(bbox) * Point::new(20.0, 20.0);
        assert!((p - Point::new(30.0, 40.0)).hypot() < 1e-9);
        assert!(t.depends_on_bounds());
    }
}
