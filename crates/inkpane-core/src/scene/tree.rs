//! Tree structure: parenting, z-order, layers, grouping and per-element
//! metadata.

use super::{NAME_KEY, Scene};
use crate::clock::ElementId;
use crate::error::{Error, Result};
use crate::events::Event;
use crate::geometry::{is_identity, is_translation, union_all};
use crate::property::Definition;
use crate::shapes::ShapeContent;
use kurbo::{Affine, Vec2};

impl Scene {
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|s| s.node.parent)
    }

    /// Children in z-order, bottom first. Empty for unknown ids.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(|s| s.node.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_count(&self, id: ElementId) -> usize {
        self.children(id).len()
    }

    /// Position of `id` among its siblings.
    pub fn index_in_parent(&self, id: ElementId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.get(parent)?.node.index_of(id)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.parent(cur);
        }
        false
    }

    /// Whether the element is attached under the root.
    pub fn is_in_scene(&self, id: ElementId) -> bool {
        self.contains(id) && self.is_ancestor(self.root(), id)
    }

    /// `id` and all of its descendants, parents before children.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if !self.contains(cur) {
                continue;
            }
            out.push(cur);
            stack.extend(self.children(cur).iter().rev());
        }
        out
    }

    /// Like [`Scene::descendants`], without `id` itself.
    pub fn descendants_below(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = self.descendants(id);
        if !out.is_empty() {
            out.remove(0);
        }
        out
    }

    /// Visit children in order.
    pub fn for_each_child(&self, id: ElementId, mut f: impl FnMut(&Scene, ElementId)) {
        for child in self.children(id) {
            f(self, *child);
        }
    }

    /// Visit a snapshot of the children; `f` may restructure the tree.
    pub fn for_each_child_stable(&mut self, id: ElementId, mut f: impl FnMut(&mut Scene, ElementId)) {
        let children = self.children(id).to_vec();
        for child in children {
            f(self, child);
        }
    }

    /// Insert `child` under `parent` at `index` (appended when `None`).
    ///
    /// A child attached elsewhere is detached first. Returns `false` if the
    /// insertion would create a cycle, detaching failed, or a listener vetoed.
    pub fn add_child(&mut self, parent: ElementId, child: ElementId, index: Option<usize>) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            log::warn!("add_child with unknown element {} -> {}", child, parent);
            return false;
        }
        if !self.is_group(parent) {
            log::warn!("Cannot add {} to non-group {}", child, parent);
            return false;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Adding {} under {} would create a cycle", child, parent);
            return false;
        }
        if let Some(old_parent) = self.parent(child) {
            if !self.remove_child(old_parent, child) {
                return false;
            }
        }

        let count = self.child_count(parent);
        let index = index.unwrap_or(count).min(count);
        let event = Event::ElementAdded {
            parent,
            child,
            index,
            descendants: self.descendants_below(child),
        };
        if !self.validate(&[parent, child], &event) {
            return false;
        }

        let tick = self.tick();
        if let Some(p) = self.get_mut(parent) {
            p.node.children.insert(index, child);
        }
        if let Some(c) = self.get_mut(child) {
            c.node.parent = Some(parent);
            c.transform.mark_transformed(tick);
        }
        self.invalidate_ancestors(child);
        if self.is_in_scene(parent) {
            self.chain_subtree(child);
        }

        self.notify(&[parent, child], &event);
        true
    }

    /// Detach `child` from `parent`. Returns `false` if it is not a child or
    /// a listener vetoed.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        let Some(index) = self.get(parent).and_then(|p| p.node.index_of(child)) else {
            return false;
        };
        let event = Event::ElementRemoved {
            parent,
            child,
            index,
            descendants: self.descendants_below(child),
        };
        if !self.validate(&[parent, child], &event) {
            return false;
        }

        let was_in_scene = self.is_in_scene(parent);
        let tick = self.tick();
        if let Some(p) = self.get_mut(parent) {
            p.node.children.remove(index);
        }
        if let Some(c) = self.get_mut(child) {
            c.node.parent = None;
            c.transform.mark_transformed(tick);
        }
        self.invalidate_from(parent);
        if was_in_scene {
            self.unchain_subtree(child);
        }

        self.notify(&[parent, child], &event);
        true
    }

    pub fn remove_from_parent(&mut self, child: ElementId) -> bool {
        match self.parent(child) {
            Some(parent) => self.remove_child(parent, child),
            None => false,
        }
    }

    /// Move `id` within its siblings, to `index` or by `index` places when
    /// `relative`. The target is clamped; no-op moves return `false`.
    pub fn change_index_to(&mut self, id: ElementId, index: isize, relative: bool) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let Some(from) = self.index_in_parent(id) else {
            return false;
        };
        let count = self.child_count(parent);
        let target = if relative { from as isize + index } else { index };
        let to = target.clamp(0, count as isize - 1) as usize;
        if to == from {
            return false;
        }

        let event = Event::ElementIndexChanged {
            parent,
            child: id,
            from,
            to,
        };
        if !self.validate(&[parent, id], &event) {
            return false;
        }
        if let Some(p) = self.get_mut(parent) {
            let child = p.node.children.remove(from);
            p.node.children.insert(to, child);
        }
        self.notify(&[parent, id], &event);
        true
    }

    /// Move one step toward the top.
    pub fn bring_forward(&mut self, id: ElementId) -> bool {
        self.change_index_to(id, 1, true)
    }

    /// Move one step toward the bottom.
    pub fn send_backward(&mut self, id: ElementId) -> bool {
        self.change_index_to(id, -1, true)
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        let count = self.parent(id).map_or(0, |p| self.child_count(p));
        self.change_index_to(id, count as isize, false)
    }

    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        self.change_index_to(id, 0, false)
    }

    /// Drop a detached element and its subtree from the arena.
    pub fn destroy(&mut self, id: ElementId) -> bool {
        if id == self.root() || self.parent(id).is_some() {
            return false;
        }
        let subtree = self.descendants(id);
        for element in &subtree {
            self.shapes.remove(element);
        }
        log::debug!("Destroyed {} element(s) under {}", subtree.len(), id);
        !subtree.is_empty()
    }

    fn chain_subtree(&self, id: ElementId) {
        for element in self.descendants(id) {
            if let Some(shape) = self.get(element) {
                if let Err(err) = shape.node.hub.chain(self.hub()) {
                    log::warn!("Failed to chain {}: {}", element, err);
                }
            }
        }
    }

    fn unchain_subtree(&self, id: ElementId) {
        for element in self.descendants(id) {
            if let Some(shape) = self.get(element) {
                shape.node.hub.unchain(self.hub());
            }
        }
    }

    // -- Layers -----------------------------------------------------------

    /// Layers, bottom first.
    pub fn layers(&self) -> &[ElementId] {
        self.children(self.root())
    }

    /// Append a new named layer on top.
    pub fn add_layer(&mut self, name: &str) -> ElementId {
        let layer = self.create_group();
        self.set_meta(layer, NAME_KEY, serde_json::Value::from(name));
        let root = self.root();
        self.add_child(root, layer, None);
        log::info!("Added layer '{}' ({})", name, layer);
        layer
    }

    pub fn selected_layer(&self) -> ElementId {
        self.selected_layer
    }

    pub fn select_layer(&mut self, layer: ElementId) -> bool {
        if !self.layers().contains(&layer) {
            return false;
        }
        self.selected_layer = layer;
        true
    }

    /// Add an element on top of the selected layer.
    pub fn add(&mut self, id: ElementId) -> bool {
        let layer = self.selected_layer();
        self.add_child(layer, id, None)
    }

    // -- Metadata and definitions ----------------------------------------

    pub fn set_meta(&mut self, id: ElementId, key: &str, value: serde_json::Value) -> bool {
        match self.get_mut(id) {
            Some(shape) => {
                shape.node.metadata.insert(key.to_owned(), value);
                true
            }
            None => false,
        }
    }

    pub fn meta(&self, id: ElementId, key: &str) -> Option<&serde_json::Value> {
        self.get(id).and_then(|s| s.node.metadata.get(key))
    }

    pub fn remove_meta(&mut self, id: ElementId, key: &str) -> Option<serde_json::Value> {
        self.get_mut(id).and_then(|s| s.node.metadata.remove(key))
    }

    pub fn add_def(&mut self, id: ElementId, name: &str, definition: Definition) -> bool {
        match self.get_mut(id) {
            Some(shape) => {
                shape.node.definitions.insert(name.to_owned(), definition);
                true
            }
            None => false,
        }
    }

    /// Look up a definition on the element or its nearest ancestor.
    pub fn get_def(&self, id: ElementId, name: &str) -> Option<&Definition> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let shape = self.get(cur)?;
            if let Some(def) = shape.node.definitions.get(name) {
                return Some(def);
            }
            current = shape.node.parent;
        }
        None
    }

    pub fn remove_def(&mut self, id: ElementId, name: &str) -> Option<Definition> {
        self.get_mut(id).and_then(|s| s.node.definitions.remove(name))
    }

    // -- Grouping ---------------------------------------------------------

    /// Wrap sibling elements in a new group placed at the topmost member's
    /// z-position. The group is positioned at the union of the members'
    /// bounds and the members are re-expressed in its space.
    ///
    /// Returns `None` unless at least two known siblings are given.
    pub fn group(&mut self, ids: &[ElementId]) -> Option<ElementId> {
        if ids.len() < 2 {
            return None;
        }
        let parent = self.parent(ids[0])?;
        if ids.iter().any(|id| self.parent(*id) != Some(parent)) {
            log::warn!("Grouping elements with different parents");
            return None;
        }

        let mut members: Vec<(usize, ElementId)> =
            ids.iter().filter_map(|id| self.index_in_parent(*id).map(|i| (i, *id))).collect();
        members.sort_by_key(|(index, _)| *index);
        members.dedup_by_key(|(_, id)| *id);
        let top = members.last().map(|(index, _)| *index)?;
        let union = union_all(members.iter().map(|(_, id)| self.bounds_in_parent(*id)))?;

        let group = self.create_group();
        let origin = union.origin().to_vec2();
        let tick = self.tick();
        if let Some(shape) = self.get_mut(group) {
            shape.transform.set_matrix(Affine::translate(origin), tick);
        }
        if !self.add_child(parent, group, Some(top + 1)) {
            self.destroy(group);
            return None;
        }

        for (_, member) in &members {
            if self.add_child(group, *member, None) {
                self.reexpress(*member, Affine::translate(-origin));
            }
        }
        log::info!("Grouped {} element(s) into {}", members.len(), group);
        Some(group)
    }

    /// Dissolve a group, moving its children into the group's parent at the
    /// group's position. The group's placement is folded into each child.
    ///
    /// Returns the children that moved. If any move is vetoed the group keeps
    /// the remaining children and stays attached.
    pub fn ungroup(&mut self, id: ElementId) -> Result<Vec<ElementId>> {
        let shape = self.get(id).ok_or(Error::UnknownElement(id))?;
        if !matches!(shape.content, ShapeContent::Group(_)) {
            return Err(Error::NotAGroup(id));
        }
        let parent = self.parent(id).ok_or(Error::UnknownElement(id))?;
        let index = self.index_in_parent(id).unwrap_or(0);
        let placement = self.local_transform(id).affine();

        let children = self.children(id).to_vec();
        let mut moved = Vec::with_capacity(children.len());
        for child in children {
            if self.add_child(parent, child, Some(index + moved.len())) {
                self.reexpress(child, placement);
                moved.push(child);
            }
        }
        if self.child_count(id) > 0 {
            log::warn!("Ungroup of {} left {} child(ren) in place", id, self.child_count(id));
        } else if self.remove_from_parent(id) {
            self.destroy(id);
        }
        log::info!("Ungrouped {} into {} element(s)", id, moved.len());
        Ok(moved)
    }

    /// Re-express `id` after its parent space changed by `change`. Unscaled
    /// leaves at identity placement are moved; anything else gets `change`
    /// prepended to its matrix.
    fn reexpress(&mut self, id: ElementId, change: Affine) {
        if is_identity(change) {
            return;
        }
        let plain_leaf = self
            .get(id)
            .is_some_and(|s| !s.is_group() && s.transform.matrix().is_identity() && s.transform.scale() == Vec2::new(1.0, 1.0));
        if plain_leaf && is_translation(change) {
            let delta = change.translation();
            let moved = self.bounding_box(id) + delta;
            if self.set_bounds(id, moved) {
                return;
            }
        }
        let matrix = self.matrix(id).affine();
        self.set_local_transform(id, change * matrix);
    }
}
