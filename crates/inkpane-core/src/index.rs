//! Flat registry of scene elements for topmost-shape queries.
//!
//! Slots are tombstoned on removal so an element re-added later (for
//! example after being regrouped) gets its old slot back. New elements reuse
//! the oldest tombstone before the slot vector grows.

use crate::clock::ElementId;
use crate::error::{Error, Result};
use crate::events::{Event, EventKind, Subscription};
use crate::geometry::union_all;
use crate::scene::Scene;
use kurbo::{Point, Rect};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct ShapeIndex {
    slots: Vec<Option<ElementId>>,
    slot_of: HashMap<ElementId, usize>,
    /// Tombstoned slots with their former owner, oldest first.
    free: VecDeque<(usize, ElementId)>,
}

impl ShapeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id`, returning its slot.
    ///
    /// An element that held a slot before gets the same slot back; that
    /// fails with [`Error::SlotOccupied`] if the slot is live.
    pub fn add(&mut self, id: ElementId) -> Result<usize> {
        if let Some(&slot) = self.slot_of.get(&id) {
            return match self.slots[slot] {
                None => {
                    self.slots[slot] = Some(id);
                    self.free.retain(|(s, _)| *s != slot);
                    Ok(slot)
                }
                Some(owner) => Err(Error::SlotOccupied { slot, id: owner }),
            };
        }

        let slot = match self.free.pop_front() {
            Some((slot, former)) => {
                self.slot_of.remove(&former);
                self.slots[slot] = Some(id);
                slot
            }
            None => {
                self.slots.push(Some(id));
                self.slots.len() - 1
            }
        };
        self.slot_of.insert(id, slot);
        Ok(slot)
    }

    /// Tombstone the element's slot, keeping the mapping for a later re-add.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(&slot) = self.slot_of.get(&id) else {
            return false;
        };
        if self.slots[slot] != Some(id) {
            return false;
        }
        self.slots[slot] = None;
        self.free.push_back((slot, id));
        true
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.slot_of.get(&id).is_some_and(|slot| self.slots[*slot] == Some(id))
    }

    pub fn slot_of(&self, id: ElementId) -> Option<usize> {
        self.slot_of.get(&id).copied()
    }

    /// Live occupant of `slot`.
    pub fn get(&self, slot: usize) -> Option<ElementId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slots, live and tombstoned.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// First registered direct child of `root`, in child order, containing
    /// the world-space point. Grandchildren are not searched.
    pub fn get_shape_at(&self, scene: &Scene, point: Point, root: ElementId) -> Option<ElementId> {
        scene
            .children(root)
            .iter()
            .copied()
            .find(|child| self.contains(*child) && scene.contains_point(*child, point))
    }

    /// Registered elements attached to the scene whose world bounds
    /// intersect `rect`, in slot order.
    pub fn shapes_in_rect(&self, scene: &Scene, rect: Rect) -> Vec<ElementId> {
        self.slots
            .iter()
            .flatten()
            .copied()
            .filter(|id| scene.is_in_scene(*id))
            .filter(|id| {
                let bounds = scene.world_bounds(*id);
                bounds.intersect(rect).area() > 0.0 || rect.contains(bounds.origin())
            })
            .collect()
    }

    /// Union of the world bounds of every attached registered element.
    pub fn extent(&self, scene: &Scene) -> Option<Rect> {
        union_all(
            self.slots
                .iter()
                .flatten()
                .filter(|id| scene.is_in_scene(**id))
                .map(|id| scene.world_bounds(*id)),
        )
    }

    /// Register everything under the root and keep the index in sync with
    /// the scene hub. Returns the subscriptions for later unbinding.
    pub fn bind(index: &Rc<RefCell<ShapeIndex>>, scene: &Scene) -> [Subscription; 2] {
        {
            let mut this = index.borrow_mut();
            for id in scene.descendants(scene.root()).into_iter().skip(1) {
                if let Err(err) = this.add(id) {
                    log::warn!("Index bind: {}", err);
                }
            }
        }

        let weak = Rc::downgrade(index);
        let added = scene.hub().on_after(EventKind::ElementAdded, move |event| {
            if let (Event::ElementAdded { child, descendants, .. }, Some(index)) = (event, weak.upgrade()) {
                match index.try_borrow_mut() {
                    Ok(mut index) => {
                        for id in std::iter::once(child).chain(descendants) {
                            if let Err(err) = index.add(*id) {
                                log::warn!("Index add: {}", err);
                            }
                        }
                    }
                    Err(_) => log::warn!("Index busy; {} not registered", child),
                }
            }
            true
        });

        let weak = Rc::downgrade(index);
        let removed = scene.hub().on_after(EventKind::ElementRemoved, move |event| {
            if let (Event::ElementRemoved { child, descendants, .. }, Some(index)) = (event, weak.upgrade()) {
                match index.try_borrow_mut() {
                    Ok(mut index) => {
                        for id in std::iter::once(child).chain(descendants) {
                            index.remove(*id);
                        }
                    }
                    Err(_) => log::warn!("Index busy; {} not unregistered", child),
                }
            }
            true
        });

        [added, removed]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Context;
    use crate::shapes::Rectangle;

    #[test]
    fn test_readd_reuses_slot() {
        let ctx = Context::new();
        let (a, b) = (ctx.next_id(), ctx.next_id());
        let mut index = ShapeIndex::new();
        assert_eq!(index.add(a).unwrap(), 0);
        assert_eq!(index.add(b).unwrap(), 1);
        assert!(index.remove(a));
        assert!(!index.contains(a));
        assert_eq!(index.add(a).unwrap(), 0);
        assert_eq!(index.capacity(), 2);
        assert_eq!(index.get(0), Some(a));
        assert_eq!(index.slot_of(b), Some(1));
    }

    #[test]
    fn test_new_shape_reuses_oldest_tombstone() {
        let ctx = Context::new();
        let (a, b, c) = (ctx.next_id(), ctx.next_id(), ctx.next_id());
        let mut index = ShapeIndex::new();
        index.add(a).unwrap();
        index.add(b).unwrap();
        index.remove(b);
        index.remove(a);
        assert_eq!(index.add(c).unwrap(), 1);
        assert_eq!(index.add(a).unwrap(), 0);
        // b lost its slot to c and is appended on return.
        assert_eq!(index.add(b).unwrap(), 2);
    }

    #[test]
    fn test_double_add_fails() {
        let ctx = Context::new();
        let a = ctx.next_id();
        let mut index = ShapeIndex::new();
        index.add(a).unwrap();
        assert_eq!(index.add(a), Err(Error::SlotOccupied { slot: 0, id: a }));
    }

    #[test]
    fn test_bound_index_tracks_scene() {
        let mut scene = Scene::new();
        let index = Rc::new(RefCell::new(ShapeIndex::new()));
        ShapeIndex::bind(&index, &scene);

        let a = scene.create_shape(Rectangle::new(Point::ZERO, 10.0, 10.0).unwrap());
        let b = scene.create_shape(Rectangle::new(Point::new(5.0, 5.0), 10.0, 10.0).unwrap());
        scene.add(a);
        scene.add(b);
        assert!(index.borrow().contains(a));

        let layer = scene.selected_layer();
        assert_eq!(index.borrow().get_shape_at(&scene, Point::new(7.0, 7.0), layer), Some(a));
        assert_eq!(index.borrow().get_shape_at(&scene, Point::new(12.0, 12.0), layer), Some(b));
        assert_eq!(index.borrow().get_shape_at(&scene, Point::new(50.0, 50.0), layer), None);

        scene.remove_from_parent(a);
        assert!(!index.borrow().contains(a));
        assert_eq!(index.borrow().get_shape_at(&scene, Point::new(7.0, 7.0), layer), Some(b));
    }

    #[test]
    fn test_group_added_whole_indexes_subtree() {
        let mut scene = Scene::new();
        let index = Rc::new(RefCell::new(ShapeIndex::new()));
        ShapeIndex::bind(&index, &scene);

        let group = scene.create_group();
        let a = scene.create_shape(Rectangle::new(Point::new(200.0, 200.0), 10.0, 10.0).unwrap());
        assert!(scene.add_child(group, a, None));
        assert!(!index.borrow().contains(a));

        assert!(scene.add(group));
        assert!(index.borrow().contains(group));
        assert!(index.borrow().contains(a));
        let found = index.borrow().shapes_in_rect(&scene, Rect::new(195.0, 195.0, 215.0, 215.0));
        assert!(found.contains(&a));

        assert!(scene.remove_from_parent(group));
        assert!(!index.borrow().contains(group));
        assert!(!index.borrow().contains(a));
    }

    #[test]
    fn test_shapes_in_rect() {
        let mut scene = Scene::new();
        let index = Rc::new(RefCell::new(ShapeIndex::new()));
        ShapeIndex::bind(&index, &scene);
        let a = scene.create_shape(Rectangle::new(Point::ZERO, 10.0, 10.0).unwrap());
        let b = scene.create_shape(Rectangle::new(Point::new(100.0, 100.0), 10.0, 10.0).unwrap());
        scene.add(a);
        scene.add(b);
        let found = index.borrow().shapes_in_rect(&scene, Rect::new(-5.0, -5.0, 20.0, 20.0));
        assert!(found.contains(&a));
        assert!(!found.contains(&b));
    }
}
