//! The stage: one scene, its selection and index, and the panes it is
//! painted into.
//!
//! The stage owns every pane and a single [`Viewport`] shared by all of
//! them. Committed scene and selection changes are collected by a
//! [`DamageTracker`]; each frame only the panes owning damaged elements are
//! repainted.

use crate::config::StageConfig;
use crate::damage::DamageTracker;
use crate::error::{RenderError, RenderResult};
use crate::pane::{DrawSource, Pane, PaneKind};
use crate::surface::SurfaceFactory;
use crate::viewport::Viewport;
use inkpane_core::{
    Cursor, ElementId, EventHandler, HitInfo, MinimumSizeGuard, Scene, Selection, ShapeGeometry, ShapeIndex,
    Subscription, EDIT_PANE, MAIN_PANE,
};
use kurbo::{Point, Size, Vec2};
use std::cell::RefCell;
use std::rc::Rc;

pub struct Stage {
    scene: Scene,
    selection: Selection,
    index: Rc<RefCell<ShapeIndex>>,
    /// Listeners on the scene hub, removed when the scene is detached.
    scene_subscriptions: Vec<Subscription>,
    damage: Rc<RefCell<DamageTracker>>,
    /// Bottom to top.
    panes: Vec<Pane>,
    surfaces: Box<dyn SurfaceFactory>,
    viewport: Viewport,
    config: StageConfig,
    size: Size,
    cursor: Cursor,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("panes", &self.panes)
            .field("viewport", &self.viewport)
            .field("selection", &self.selection.shapes())
            .finish()
    }
}

impl Stage {
    /// Attach `scene` to a new stage with the main and edit panes.
    pub fn new(mut scene: Scene, surfaces: impl SurfaceFactory + 'static, config: StageConfig) -> Self {
        scene.set_control_radius(config.control_radius);
        scene.set_rotate_handle_offset(config.rotate_handle_offset);

        let index = Rc::new(RefCell::new(ShapeIndex::new()));
        let mut scene_subscriptions = ShapeIndex::bind(&index, &scene).to_vec();

        let damage = Rc::new(RefCell::new(DamageTracker::new()));
        scene_subscriptions.push(scene.hub().add_handler(damage.clone()));
        let guard: Rc<RefCell<dyn EventHandler>> =
            Rc::new(RefCell::new(MinimumSizeGuard::for_radius(config.control_radius)));
        scene_subscriptions.push(scene.hub().add_handler(guard));

        let selection = Selection::new();
        selection.hub().add_handler(damage.clone());

        let viewport = Viewport::with_limits(config.min_zoom, config.max_zoom);
        let size = config.canvas_size;
        let mut stage = Self {
            scene,
            selection,
            index,
            scene_subscriptions,
            damage,
            panes: Vec::new(),
            surfaces: Box::new(surfaces),
            viewport,
            config,
            size,
            cursor: Cursor::Default,
        };
        stage.acquire_pane(MAIN_PANE, PaneKind::Shapes);
        stage.acquire_pane(EDIT_PANE, PaneKind::Shapes);
        stage
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Direct scene access. Changes made here are picked up as damage on
    /// the next frame.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn index(&self) -> std::cell::Ref<'_, ShapeIndex> {
        self.index.borrow()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Cursor hint for the host.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Recreate every pane surface at `size`.
    pub fn resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        self.size = size;
        for pane in &mut self.panes {
            let context = self.surfaces.create_surface(pane.name(), size);
            pane.replace_surface(context);
        }
        log::debug!("Stage resized to {}x{}", size.width, size.height);
    }

    // -- Panes ------------------------------------------------------------

    /// Take a reference on the pane called `name`, creating it on top if it
    /// does not exist. Returns the pane's reference count.
    pub fn acquire_pane(&mut self, name: &str, kind: PaneKind) -> usize {
        if let Some(pane) = self.panes.iter_mut().find(|p| p.name() == name) {
            return pane.retain();
        }
        let context = self.surfaces.create_surface(name, self.size);
        self.panes.push(Pane::new(name, context, kind.create(), self.viewport));
        log::debug!("Acquired pane '{}' ({:?})", name, kind);
        1
    }

    /// Drop a reference on a pane. Returns `true` if that was the last one
    /// and the pane was removed.
    pub fn release_pane(&mut self, name: &str) -> RenderResult<bool> {
        let position = self.position_of(name)?;
        if self.panes[position].release() > 0 {
            return Ok(false);
        }
        self.panes.remove(position);
        self.mark_all_dirty();
        log::debug!("Released pane '{}'", name);
        Ok(true)
    }

    pub fn move_pane_to_bottom(&mut self, name: &str) -> RenderResult<()> {
        let position = self.position_of(name)?;
        let pane = self.panes.remove(position);
        self.panes.insert(0, pane);
        Ok(())
    }

    pub fn move_pane_to_top(&mut self, name: &str) -> RenderResult<()> {
        let position = self.position_of(name)?;
        let pane = self.panes.remove(position);
        self.panes.push(pane);
        Ok(())
    }

    pub fn pane(&self, name: &str) -> Option<&Pane> {
        self.panes.iter().find(|p| p.name() == name)
    }

    /// Pane names, bottom first.
    pub fn pane_names(&self) -> Vec<&str> {
        self.panes.iter().map(Pane::name).collect()
    }

    pub fn mark_dirty(&mut self, name: &str) {
        if let Some(pane) = self.panes.iter_mut().find(|p| p.name() == name) {
            pane.mark_dirty();
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for pane in &mut self.panes {
            pane.mark_dirty();
        }
    }

    fn position_of(&self, name: &str) -> RenderResult<usize> {
        self.panes
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| RenderError::UnknownPane(name.to_owned()))
    }

    // -- Viewport ---------------------------------------------------------

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.viewport.screen_to_world(screen)
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
        self.sync_viewport();
    }

    /// Zoom by `factor` around a screen point. Returns whether the zoom
    /// changed, which it does not at the limits.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) -> bool {
        let changed = self.viewport.zoom_at(anchor, factor);
        if changed {
            self.sync_viewport();
        }
        changed
    }

    /// Fit every indexed shape into view. Returns `false` when the scene is
    /// empty.
    pub fn fit_to_content(&mut self, padding: f64) -> bool {
        let Some(extent) = self.index.borrow().extent(&self.scene) else {
            return false;
        };
        self.viewport.fit_to_bounds(extent, self.size, padding);
        self.sync_viewport();
        true
    }

    fn sync_viewport(&mut self) {
        for pane in &mut self.panes {
            pane.set_viewport(self.viewport);
        }
    }

    // -- Selection --------------------------------------------------------

    /// Select `id` and move it to the edit pane.
    pub fn select(&mut self, id: ElementId) -> bool {
        let before = self.selection.shapes().to_vec();
        let changed = self.selection.add(&self.scene, id);
        self.sync_panes(&before);
        changed
    }

    pub fn unselect(&mut self, id: ElementId) -> bool {
        let before = self.selection.shapes().to_vec();
        let changed = self.selection.remove(id);
        self.sync_panes(&before);
        changed
    }

    pub fn toggle(&mut self, id: ElementId) -> bool {
        let before = self.selection.shapes().to_vec();
        let changed = self.selection.toggle(&self.scene, id);
        self.sync_panes(&before);
        changed
    }

    pub fn select_only(&mut self, id: ElementId) -> bool {
        let before = self.selection.shapes().to_vec();
        let changed = self.selection.select_only(&self.scene, id);
        self.sync_panes(&before);
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let before = self.selection.shapes().to_vec();
        let changed = self.selection.clear();
        self.sync_panes(&before);
        changed
    }

    /// Selected shapes live on the edit pane. Shapes leaving the selection
    /// go back to the main pane when they sit directly on a layer, and
    /// inherit their parent's pane otherwise.
    fn sync_panes(&mut self, before: &[ElementId]) {
        for id in before {
            if self.selection.contains(*id) || !self.scene.contains(*id) {
                continue;
            }
            let on_layer = self
                .scene
                .parent(*id)
                .is_some_and(|parent| self.scene.layers().contains(&parent));
            self.scene.set_pane(*id, on_layer.then_some(MAIN_PANE));
        }
        for id in self.selection.shapes() {
            self.scene.set_pane(*id, Some(EDIT_PANE));
        }
        self.mark_dirty(MAIN_PANE);
        self.mark_dirty(EDIT_PANE);
    }

    // -- Hit testing and gestures -----------------------------------------

    /// Hit test the selected shapes, last selected first, so their handles
    /// win over picking a new shape.
    pub fn hit_selected(&self, world: Point) -> Option<HitInfo> {
        self.selection.shapes().iter().rev().find_map(|id| {
            self.scene
                .controller(*id)
                .and_then(|controller| controller.hit_info(&self.scene, *id, world))
        })
    }

    /// Shape on the selected layer under a world point.
    pub fn shape_at(&self, world: Point) -> Option<ElementId> {
        self.index
            .borrow()
            .get_shape_at(&self.scene, world, self.scene.selected_layer())
    }

    /// Update the cursor hint for a pointer hovering at `world`.
    pub fn hover(&mut self, world: Point) -> Cursor {
        let cursor = match self.hit_selected(world) {
            Some(hit) => hit.cursor,
            None if self.shape_at(world).is_some() => Cursor::Move,
            None => Cursor::Default,
        };
        self.cursor = cursor;
        cursor
    }

    /// Snapshot every selected shape before a gesture.
    pub fn checkpoint(&mut self, hit: &HitInfo) {
        self.selection.checkpoint_shapes(&self.scene, Some(hit));
    }

    /// Apply the pointer movement `down -> current` to the selection,
    /// relative to the last checkpoint.
    pub fn apply_gesture(&mut self, hit: &HitInfo, down: Point, current: Point) -> bool {
        let changed = self.selection.apply_hit_changes(&mut self.scene, hit, down, current);
        if !changed {
            log::debug!("Gesture on {} had no effect", hit.shape);
        }
        changed
    }

    // -- Structure --------------------------------------------------------

    /// Create a detached shape. It is not indexed or drawn until added.
    pub fn create_detached(&mut self, geometry: Box<dyn ShapeGeometry>) -> ElementId {
        self.scene.create_boxed(geometry)
    }

    /// Create a shape on top of the selected layer. Returns `None` if the
    /// insertion was vetoed.
    pub fn add_shape(&mut self, geometry: impl ShapeGeometry) -> Option<ElementId> {
        let id = self.scene.create_shape(geometry);
        if self.scene.add(id) {
            Some(id)
        } else {
            self.scene.destroy(id);
            None
        }
    }

    /// Remove `id` from the scene and the selection and drop it.
    pub fn discard(&mut self, id: ElementId) -> bool {
        let before = self.selection.shapes().to_vec();
        self.selection.remove(id);
        self.scene.remove_from_parent(id);
        let destroyed = self.scene.destroy(id);
        self.sync_panes(&before);
        destroyed
    }

    /// Detach and drop every selected shape. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let before = self.selection.shapes().to_vec();
        let removed = self.selection.remove_from_parents(&mut self.scene);
        for id in &removed {
            self.scene.destroy(*id);
        }
        self.sync_panes(&before);
        log::info!("Deleted {} selected shape(s)", removed.len());
        removed.len()
    }

    pub fn group_selected(&mut self) -> Vec<ElementId> {
        let before = self.selection.shapes().to_vec();
        let groups = self.selection.group(&mut self.scene);
        self.sync_panes(&before);
        groups
    }

    pub fn ungroup_selected(&mut self) -> Vec<ElementId> {
        let before = self.selection.shapes().to_vec();
        let released = self.selection.ungroup(&mut self.scene);
        self.sync_panes(&before);
        released
    }

    // -- Frames -----------------------------------------------------------

    /// Turn queued damage into dirty panes, then repaint the dirty ones.
    /// Returns how many panes were painted.
    pub fn render_frame(&mut self) -> usize {
        let touched = self.damage.borrow_mut().drain();
        for id in touched {
            let name = self.scene.pane_of(id);
            for pane in self.panes.iter_mut().filter(|p| p.name() == name) {
                pane.mark_dirty();
            }
        }

        let source = DrawSource {
            scene: &self.scene,
            selection: &self.selection,
            config: &self.config,
        };
        let mut painted = 0;
        for pane in &mut self.panes {
            if pane.paint(&source, false) {
                painted += 1;
            }
        }
        log::trace!("Repainted {} of {} pane(s)", painted, self.panes.len());
        painted
    }

    /// Tear the stage down and hand back its scene, with every listener the
    /// stage installed removed and nothing left on the edit pane.
    pub fn detach_scene(mut self) -> Scene {
        self.clear_selection();
        for subscription in self.scene_subscriptions.drain(..) {
            self.scene.hub().remove(subscription);
        }
        self.scene
    }
}
