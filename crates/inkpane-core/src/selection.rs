//! The set of selected shapes.
//!
//! Membership changes are announced on the selection's own hub as
//! `ShapesSelected` / `ShapesUnselected` with the usual two phases. The
//! selection also drives gestures: it checkpoints every member before a drag
//! and applies the drag relative to those snapshots.

use crate::clock::ElementId;
use crate::controller::{HitInfo, Snapshot};
use crate::events::{Event, EventHub};
use crate::geometry::union_all;
use crate::scene::Scene;
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// Ordered set of selected elements.
#[derive(Debug, Default)]
pub struct Selection {
    members: Vec<ElementId>,
    snapshots: HashMap<ElementId, Snapshot>,
    hub: EventHub,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn shapes(&self) -> &[ElementId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.members.contains(&id)
    }

    /// Add `id`. Returns `false` if already selected, unknown or vetoed.
    pub fn add(&mut self, scene: &Scene, id: ElementId) -> bool {
        if self.contains(id) || !scene.contains(id) {
            return false;
        }
        let event = Event::ShapesSelected { shapes: vec![id] };
        if !self.hub.validate_before(&event) {
            return false;
        }
        self.members.push(id);
        if let Some(controller) = scene.controller(id) {
            self.snapshots.insert(id, controller.snapshot(scene, id, None));
        }
        self.hub.trigger_on(&event);
        true
    }

    /// Remove `id`. Returns `false` if not selected or vetoed.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(position) = self.members.iter().position(|m| *m == id) else {
            return false;
        };
        let event = Event::ShapesUnselected { shapes: vec![id] };
        if !self.hub.validate_before(&event) {
            return false;
        }
        self.members.remove(position);
        self.snapshots.remove(&id);
        self.hub.trigger_on(&event);
        true
    }

    /// Flip membership of `id`. Returns whether the membership changed.
    pub fn toggle(&mut self, scene: &Scene, id: ElementId) -> bool {
        if self.contains(id) {
            self.remove(id)
        } else {
            self.add(scene, id)
        }
    }

    /// Unselect everything as one event.
    pub fn clear(&mut self) -> bool {
        if self.members.is_empty() {
            return false;
        }
        let event = Event::ShapesUnselected {
            shapes: self.members.clone(),
        };
        if !self.hub.validate_before(&event) {
            return false;
        }
        self.members.clear();
        self.snapshots.clear();
        self.hub.trigger_on(&event);
        true
    }

    /// Replace the selection with exactly `id`.
    pub fn select_only(&mut self, scene: &Scene, id: ElementId) -> bool {
        if self.members == [id] {
            return true;
        }
        if !self.members.is_empty() && !self.clear() {
            return false;
        }
        self.add(scene, id)
    }

    /// Visit members in selection order.
    pub fn for_each(&self, mut f: impl FnMut(ElementId)) {
        for id in &self.members {
            f(*id);
        }
    }

    /// Capture every member's state before a gesture. `hit` is handed to the
    /// member it belongs to so controllers can save gesture-specific state.
    pub fn checkpoint_shapes(&mut self, scene: &Scene, hit: Option<&HitInfo>) {
        self.snapshots.clear();
        for id in &self.members {
            let Some(controller) = scene.controller(*id) else {
                continue;
            };
            let own_hit = hit.filter(|h| h.shape == *id);
            self.snapshots.insert(*id, controller.snapshot(scene, *id, own_hit));
        }
    }

    pub fn snapshot(&self, id: ElementId) -> Option<&Snapshot> {
        self.snapshots.get(&id)
    }

    /// Apply a gesture to the selection. The hit element gets the exact
    /// hit; other members follow as body moves when the hit is a move.
    ///
    /// Returns `true` if any member changed.
    pub fn apply_hit_changes(&self, scene: &mut Scene, hit: &HitInfo, down: Point, current: Point) -> bool {
        let mut changed = false;
        for id in &self.members {
            let Some(saved) = self.snapshots.get(id) else {
                continue;
            };
            let member_hit = if *id == hit.shape {
                *hit
            } else if hit.kind == crate::controller::ControlKind::Move {
                HitInfo::moving(*id)
            } else {
                continue;
            };
            if let Some(controller) = scene.controller(*id) {
                changed |= controller.apply_hit_changes(scene, &member_hit, saved, down, current);
            }
        }
        changed
    }

    /// Union of the members' world bounds.
    pub fn union_bounds(&self, scene: &Scene) -> Option<Rect> {
        union_all(self.members.iter().map(|id| scene.world_bounds(*id)))
    }

    /// Drop members that are no longer attached to the scene.
    pub fn retain_attached(&mut self, scene: &Scene) {
        let detached: Vec<ElementId> = self.members.iter().copied().filter(|id| !scene.is_in_scene(*id)).collect();
        for id in detached {
            self.remove(id);
        }
    }

    /// Group selected siblings, one group per parent with at least two
    /// selected children. Grouped members are replaced by their group in
    /// the selection. Returns the new groups.
    pub fn group(&mut self, scene: &mut Scene) -> Vec<ElementId> {
        let mut partitions: Vec<(ElementId, Vec<ElementId>)> = Vec::new();
        for id in &self.members {
            let Some(parent) = scene.parent(*id) else {
                continue;
            };
            match partitions.iter_mut().find(|(p, _)| *p == parent) {
                Some((_, members)) => members.push(*id),
                None => partitions.push((parent, vec![*id])),
            }
        }

        let mut groups = Vec::new();
        for (_, members) in partitions.into_iter().filter(|(_, m)| m.len() >= 2) {
            if let Some(group) = scene.group(&members) {
                for member in &members {
                    self.remove(*member);
                }
                self.add(scene, group);
                groups.push(group);
            }
        }
        groups
    }

    /// Ungroup every selected group. Their children replace them in the
    /// selection. Returns the released children.
    pub fn ungroup(&mut self, scene: &mut Scene) -> Vec<ElementId> {
        let groups: Vec<ElementId> = self.members.iter().copied().filter(|id| scene.is_group(*id)).collect();
        let mut released = Vec::new();
        for group in groups {
            match scene.ungroup(group) {
                Ok(children) => {
                    if !scene.contains(group) {
                        self.remove(group);
                    }
                    for child in &children {
                        self.add(scene, *child);
                    }
                    released.extend(children);
                }
                Err(err) => log::warn!("Could not ungroup {}: {}", group, err),
            }
        }
        released
    }

    /// Detach every member from its parent and clear the selection.
    /// Returns the detached elements.
    pub fn remove_from_parents(&mut self, scene: &mut Scene) -> Vec<ElementId> {
        let members = self.members.clone();
        self.clear();
        members.into_iter().filter(|id| scene.remove_from_parent(*id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::shapes::Rectangle;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect(scene: &mut Scene, x: f64, y: f64, w: f64, h: f64) -> ElementId {
        let id = scene.create_shape(Rectangle::new(Point::new(x, y), w, h).unwrap());
        scene.add(id);
        id
    }

    #[test]
    fn test_add_remove_events() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let mut selection = Selection::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        selection.hub().on_after(EventKind::ShapesSelected, move |e| {
            sink.borrow_mut().push(e.clone());
            true
        });
        assert!(selection.add(&scene, a));
        assert!(!selection.add(&scene, a));
        assert_eq!(log.borrow().as_slice(), &[Event::ShapesSelected { shapes: vec![a] }]);
        assert!(selection.remove(a));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_veto_selection() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let mut selection = Selection::new();
        selection.hub().on_before(EventKind::ShapesSelected, |_| false);
        assert!(!selection.add(&scene, a));
        assert!(!selection.contains(a));
    }

    #[test]
    fn test_toggle_membership() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let mut selection = Selection::new();
        assert!(selection.toggle(&scene, a));
        assert!(selection.contains(a));
        assert!(selection.toggle(&scene, a));
        assert!(!selection.contains(a));
    }

    #[test]
    fn test_move_all_members() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut scene, 50.0, 50.0, 10.0, 10.0);
        let mut selection = Selection::new();
        selection.add(&scene, a);
        selection.add(&scene, b);

        let hit = HitInfo::moving(a);
        selection.checkpoint_shapes(&scene, Some(&hit));
        assert!(selection.apply_hit_changes(&mut scene, &hit, Point::new(5.0, 5.0), Point::new(15.0, 25.0)));
        assert_eq!(scene.bounding_box(a), Rect::new(10.0, 20.0, 20.0, 30.0));
        assert_eq!(scene.bounding_box(b), Rect::new(60.0, 70.0, 70.0, 80.0));

        // Applying again uses the same snapshot, not the moved state.
        selection.apply_hit_changes(&mut scene, &hit, Point::new(5.0, 5.0), Point::new(15.0, 25.0));
        assert_eq!(scene.bounding_box(a), Rect::new(10.0, 20.0, 20.0, 30.0));
    }

    #[test]
    fn test_group_replaces_members() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 10.0, 10.0, 10.0, 10.0);
        let b = rect(&mut scene, 40.0, 30.0, 10.0, 10.0);
        let mut selection = Selection::new();
        selection.add(&scene, a);
        selection.add(&scene, b);

        let groups = selection.group(&mut scene);
        assert_eq!(groups.len(), 1);
        assert_eq!(selection.shapes(), groups.as_slice());
        assert_eq!(scene.parent(a), Some(groups[0]));
        assert_eq!(scene.bounds_in_parent(groups[0]), Rect::new(10.0, 10.0, 50.0, 40.0));

        let released = selection.ungroup(&mut scene);
        assert_eq!(released, vec![a, b]);
        assert_eq!(scene.bounds_in_parent(a), Rect::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn test_vetoed_ungroup_keeps_group_selected() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 10.0, 10.0, 10.0, 10.0);
        let b = rect(&mut scene, 40.0, 30.0, 10.0, 10.0);
        let mut selection = Selection::new();
        selection.add(&scene, a);
        selection.add(&scene, b);
        let groups = selection.group(&mut scene);

        scene.hub().on_before(EventKind::ElementRemoved, |_| false);
        assert!(selection.ungroup(&mut scene).is_empty());
        assert_eq!(selection.shapes(), groups.as_slice());
        assert!(scene.contains(a));
        assert!(scene.contains(b));
        assert_eq!(scene.children(groups[0]), &[a, b]);
    }

    #[test]
    fn test_select_only_needs_clear() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect(&mut scene, 20.0, 0.0, 10.0, 10.0);
        let c = rect(&mut scene, 40.0, 0.0, 10.0, 10.0);
        let mut selection = Selection::new();
        assert!(selection.select_only(&scene, a));
        selection.add(&scene, b);

        selection.hub().on_before(EventKind::ShapesUnselected, |_| false);
        assert!(!selection.select_only(&scene, c));
        assert_eq!(selection.shapes(), &[a, b]);
    }

    #[test]
    fn test_remove_from_parents() {
        let mut scene = Scene::new();
        let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let mut selection = Selection::new();
        selection.add(&scene, a);
        assert_eq!(selection.remove_from_parents(&mut scene), vec![a]);
        assert!(!scene.is_in_scene(a));
        assert!(selection.is_empty());
    }
}
