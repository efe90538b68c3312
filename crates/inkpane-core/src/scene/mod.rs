//! The scene graph.
//!
//! A [`Scene`] owns every element in an arena keyed by [`ElementId`]. The
//! root group holds the layers; shapes live inside layers and groups. All
//! mutations go through the scene so that caches are invalidated and both
//! dispatch phases fire in order.
//!
//! Elements are chained to the scene hub while attached under the root, so
//! scene-level listeners see every element event exactly once.

mod geometry;
mod style;
mod tree;

use crate::clock::{Context, ElementId, Tick};
use crate::controller::{CONTROL_RADIUS, ROTATE_HANDLE_OFFSET, ShapeController};
use crate::element::Shape;
use crate::events::{Event, EventHub, Phase, dispatch_all};
use crate::shapes::{Group, ShapeContent, ShapeGeometry};
use std::collections::HashMap;
use std::rc::Rc;

/// Pane shapes are drawn into while at rest.
pub const MAIN_PANE: &str = "main";
/// Pane selected shapes are drawn into while being edited.
pub const EDIT_PANE: &str = "edit";

/// Metadata key holding a layer's display name.
pub const NAME_KEY: &str = "name";

/// Scene graph arena with its own event hub and clock.
#[derive(Debug)]
pub struct Scene {
    context: Context,
    shapes: HashMap<ElementId, Shape>,
    root: ElementId,
    selected_layer: ElementId,
    hub: EventHub,
    control_radius: f64,
    rotate_handle_offset: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene with a root group and one selected layer.
    pub fn new() -> Self {
        Self::with_context(Context::new())
    }

    /// Create a scene drawing ids and ticks from `context`.
    pub fn with_context(context: Context) -> Self {
        let root_id = context.next_id();
        let root = Shape::new(root_id, ShapeContent::Group(Group::new()), context.tick());
        let hub = EventHub::new();
        if let Err(err) = root.node.hub.chain(&hub) {
            log::error!("Failed to chain root hub: {}", err);
        }

        let mut shapes = HashMap::new();
        shapes.insert(root_id, root);

        let mut scene = Self {
            context,
            shapes,
            root: root_id,
            selected_layer: root_id,
            hub,
            control_radius: CONTROL_RADIUS,
            rotate_handle_offset: ROTATE_HANDLE_OFFSET,
        };
        let layer = scene.add_layer("Layer 1");
        scene.selected_layer = layer;
        scene
    }

    /// The scene-wide hub every attached element forwards to.
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub(crate) fn tick(&self) -> Tick {
        self.context.tick()
    }

    /// Hit tolerance used by controllers, in shape units.
    pub fn control_radius(&self) -> f64 {
        self.control_radius
    }

    pub fn set_control_radius(&mut self, radius: f64) {
        self.control_radius = radius;
    }

    /// Distance of the rotate handle from the right edge.
    pub fn rotate_handle_offset(&self) -> f64 {
        self.rotate_handle_offset
    }

    pub fn set_rotate_handle_offset(&mut self, offset: f64) {
        self.rotate_handle_offset = offset;
    }

    /// Allocate a detached element.
    pub fn create(&mut self, content: ShapeContent) -> ElementId {
        let id = self.context.next_id();
        let shape = Shape::new(id, content, self.context.tick());
        log::debug!("Created {} {}", shape.content.type_name(), id);
        self.shapes.insert(id, shape);
        id
    }

    pub fn create_shape(&mut self, geometry: impl ShapeGeometry) -> ElementId {
        self.create(ShapeContent::Leaf(Box::new(geometry)))
    }

    pub fn create_boxed(&mut self, geometry: Box<dyn ShapeGeometry>) -> ElementId {
        self.create(ShapeContent::Leaf(geometry))
    }

    pub fn create_group(&mut self) -> ElementId {
        self.create(ShapeContent::Group(Group::new()))
    }

    pub fn get(&self, id: ElementId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Number of elements in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn is_group(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(Shape::is_group)
    }

    /// The element's own hub.
    pub fn events(&self, id: ElementId) -> Option<&EventHub> {
        self.get(id).map(|s| &s.node.hub)
    }

    /// The element's controller, created on first use.
    pub fn controller(&self, id: ElementId) -> Option<Rc<dyn ShapeController>> {
        self.get(id).map(Shape::controller)
    }

    /// Pane assigned to this element, if any.
    pub fn assigned_pane(&self, id: ElementId) -> Option<&str> {
        self.get(id).and_then(|s| s.pane.as_deref())
    }

    /// Pane this element is drawn into: its own assignment, else the
    /// nearest ancestor's, else [`MAIN_PANE`].
    pub fn pane_of(&self, id: ElementId) -> &str {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.get(cur) {
                Some(shape) => {
                    if let Some(pane) = shape.pane.as_deref() {
                        return pane;
                    }
                    current = shape.node.parent;
                }
                None => break,
            }
        }
        MAIN_PANE
    }

    pub fn set_pane(&mut self, id: ElementId, pane: Option<&str>) -> bool {
        match self.get_mut(id) {
            Some(shape) => {
                shape.pane = pane.map(str::to_owned);
                true
            }
            None => false,
        }
    }

    fn hubs(&self, ids: &[ElementId]) -> Vec<EventHub> {
        ids.iter().filter_map(|id| self.get(*id).map(|s| s.node.hub.clone())).collect()
    }

    /// Before-commit dispatch over the hubs of `ids`.
    pub(crate) fn validate(&self, ids: &[ElementId], event: &Event) -> bool {
        let hubs = self.hubs(ids);
        let refs: Vec<&EventHub> = hubs.iter().collect();
        let accepted = dispatch_all(&refs, Phase::BeforeCommit, event);
        if !accepted {
            log::debug!("Vetoed {:?}", event.kind());
        }
        accepted
    }

    /// After-commit dispatch over the hubs of `ids`.
    pub(crate) fn notify(&self, ids: &[ElementId], event: &Event) {
        let hubs = self.hubs(ids);
        let refs: Vec<&EventHub> = hubs.iter().collect();
        dispatch_all(&refs, Phase::AfterCommit, event);
    }
}
