//! Damage collection between frames.

use inkpane_core::{ElementId, Event, EventHandler};

/// Queues every element touched by a committed change until the next frame.
///
/// Registered on the scene and selection hubs. Only the after phase is
/// recorded, so vetoed mutations leave no damage.
#[derive(Debug, Default)]
pub struct DamageTracker {
    touched: Vec<ElementId>,
}

impl DamageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Take the queued ids, deduplicated, oldest first.
    pub fn drain(&mut self) -> Vec<ElementId> {
        let mut seen = std::collections::HashSet::new();
        self.touched.drain(..).filter(|id| seen.insert(*id)).collect()
    }
}

impl EventHandler for DamageTracker {
    fn after(&mut self, event: &Event) -> bool {
        self.touched.extend(event.elements());
        true
    }
}
