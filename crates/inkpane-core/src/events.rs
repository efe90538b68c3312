//! Two-phase change notification.
//!
//! Every observable mutation is announced twice: once in
//! [`Phase::BeforeCommit`], where any listener may veto it by returning
//! `false`, and once in [`Phase::AfterCommit`] once the mutation has been
//! applied. Element hubs are chained into their scene's hub so scene-wide
//! observers see element events without subscribing per element.
//!
//! Dispatch works over a stable copy of the listener list, so listeners may
//! subscribe or unsubscribe while an event is being delivered. A listener
//! that triggers a nested dispatch reaching itself is skipped for the nested
//! event.

use crate::clock::ElementId;
use crate::error::{Error, Result};
use crate::property::PropertyName;
use kurbo::{Rect, Vec2};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Dispatch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Validation; returning `false` vetoes the mutation.
    BeforeCommit,
    /// Notification after the mutation has been applied.
    AfterCommit,
}

/// Event discriminant used to route callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ElementAdded,
    ElementRemoved,
    ElementIndexChanged,
    BoundsChanged,
    ScaleChanged,
    TransformChanged,
    PropertyChanged,
    ShapesSelected,
    ShapesUnselected,
}

/// A change to the scene or the selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `descendants` lists everything below `child`, which moves with it.
    ElementAdded {
        parent: ElementId,
        child: ElementId,
        index: usize,
        descendants: Vec<ElementId>,
    },
    ElementRemoved {
        parent: ElementId,
        child: ElementId,
        index: usize,
        descendants: Vec<ElementId>,
    },
    ElementIndexChanged {
        parent: ElementId,
        child: ElementId,
        from: usize,
        to: usize,
    },
    BoundsChanged {
        element: ElementId,
        old: Rect,
        new: Rect,
    },
    /// Bound-dependent scale change. `bounds` is the unscaled bounding box.
    ScaleChanged {
        element: ElementId,
        old: Vec2,
        new: Vec2,
        bounds: Rect,
    },
    TransformChanged {
        element: ElementId,
    },
    PropertyChanged {
        element: ElementId,
        property: PropertyName,
    },
    ShapesSelected {
        shapes: Vec<ElementId>,
    },
    ShapesUnselected {
        shapes: Vec<ElementId>,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ElementAdded { .. } => EventKind::ElementAdded,
            Event::ElementRemoved { .. } => EventKind::ElementRemoved,
            Event::ElementIndexChanged { .. } => EventKind::ElementIndexChanged,
            Event::BoundsChanged { .. } => EventKind::BoundsChanged,
            Event::ScaleChanged { .. } => EventKind::ScaleChanged,
            Event::TransformChanged { .. } => EventKind::TransformChanged,
            Event::PropertyChanged { .. } => EventKind::PropertyChanged,
            Event::ShapesSelected { .. } => EventKind::ShapesSelected,
            Event::ShapesUnselected { .. } => EventKind::ShapesUnselected,
        }
    }

    /// Every element the event is about.
    pub fn elements(&self) -> Vec<ElementId> {
        match self {
            Event::ElementAdded { parent, child, .. }
            | Event::ElementRemoved { parent, child, .. }
            | Event::ElementIndexChanged { parent, child, .. } => vec![*child, *parent],
            Event::BoundsChanged { element, .. }
            | Event::ScaleChanged { element, .. }
            | Event::TransformChanged { element }
            | Event::PropertyChanged { element, .. } => vec![*element],
            Event::ShapesSelected { shapes } | Event::ShapesUnselected { shapes } => shapes.clone(),
        }
    }
}

/// Listener object receiving both phases of every event on a hub.
pub trait EventHandler {
    /// Return `false` to veto.
    fn before(&mut self, _event: &Event) -> bool {
        true
    }

    fn after(&mut self, _event: &Event) -> bool {
        true
    }
}

/// Registration token, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Callback = Rc<RefCell<dyn FnMut(&Event) -> bool>>;

enum Listener {
    Callback {
        phase: Phase,
        kind: EventKind,
        callback: Callback,
    },
    Handler(Rc<RefCell<dyn EventHandler>>),
}

impl Clone for Listener {
    fn clone(&self) -> Self {
        match self {
            Listener::Callback { phase, kind, callback } => Listener::Callback {
                phase: *phase,
                kind: *kind,
                callback: Rc::clone(callback),
            },
            Listener::Handler(handler) => Listener::Handler(Rc::clone(handler)),
        }
    }
}

#[derive(Default)]
struct HubInner {
    next_subscription: u64,
    listeners: Vec<(Subscription, Listener)>,
    chained: Vec<EventHub>,
}

/// Shared handle to a listener registry.
///
/// Cloning the handle shares the registry.
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Rc<RefCell<HubInner>>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventHub")
            .field("listeners", &inner.listeners.len())
            .field("chained", &inner.chained.len())
            .finish()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, listener: Listener) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_subscription += 1;
        let subscription = Subscription(inner.next_subscription);
        inner.listeners.push((subscription, listener));
        subscription
    }

    /// Register a validation callback for `kind`.
    pub fn on_before(&self, kind: EventKind, callback: impl FnMut(&Event) -> bool + 'static) -> Subscription {
        self.register(Listener::Callback {
            phase: Phase::BeforeCommit,
            kind,
            callback: Rc::new(RefCell::new(callback)),
        })
    }

    /// Register a post-commit callback for `kind`.
    pub fn on_after(&self, kind: EventKind, callback: impl FnMut(&Event) -> bool + 'static) -> Subscription {
        self.register(Listener::Callback {
            phase: Phase::AfterCommit,
            kind,
            callback: Rc::new(RefCell::new(callback)),
        })
    }

    /// Register a handler object for every event kind and both phases.
    pub fn add_handler(&self, handler: Rc<RefCell<dyn EventHandler>>) -> Subscription {
        self.register(Listener::Handler(handler))
    }

    /// Remove a registration. Returns `false` if it was not present.
    pub fn remove(&self, subscription: Subscription) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(s, _)| *s != subscription);
        inner.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn same_hub(&self, other: &EventHub) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Forward every event dispatched on this hub to `target` as well.
    ///
    /// Fails with [`Error::HubCycle`] if `target` already forwards, directly
    /// or transitively, to this hub.
    pub fn chain(&self, target: &EventHub) -> Result<()> {
        if target.reaches(self) {
            return Err(Error::HubCycle);
        }
        let mut inner = self.inner.borrow_mut();
        if !inner.chained.iter().any(|h| h.same_hub(target)) {
            inner.chained.push(target.clone());
        }
        Ok(())
    }

    /// Stop forwarding to `target`. Returns `false` if it was not chained.
    pub fn unchain(&self, target: &EventHub) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.chained.len();
        inner.chained.retain(|h| !h.same_hub(target));
        inner.chained.len() != before
    }

    pub fn is_chained_to(&self, target: &EventHub) -> bool {
        self.inner.borrow().chained.iter().any(|h| h.same_hub(target))
    }

    fn reaches(&self, target: &EventHub) -> bool {
        if self.same_hub(target) {
            return true;
        }
        let chained = self.inner.borrow().chained.clone();
        chained.iter().any(|h| h.reaches(target))
    }

    /// Dispatch on this hub and everything it is chained to.
    pub fn dispatch(&self, phase: Phase, event: &Event) -> bool {
        dispatch_all(&[self], phase, event)
    }

    /// Shorthand for a before-commit dispatch.
    pub fn validate_before(&self, event: &Event) -> bool {
        self.dispatch(Phase::BeforeCommit, event)
    }

    /// Shorthand for an after-commit dispatch.
    pub fn trigger_on(&self, event: &Event) -> bool {
        self.dispatch(Phase::AfterCommit, event)
    }

    fn dispatch_inner(&self, phase: Phase, event: &Event, visited: &mut Vec<EventHub>) -> bool {
        if visited.iter().any(|h| h.same_hub(self)) {
            return true;
        }
        visited.push(self.clone());

        let (listeners, chained) = {
            let inner = self.inner.borrow();
            let listeners: Vec<Listener> = inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            (listeners, inner.chained.clone())
        };

        let kind = event.kind();
        for listener in &listeners {
            let accepted = match listener {
                Listener::Callback {
                    phase: p,
                    kind: k,
                    callback,
                } => {
                    if *p != phase || *k != kind {
                        continue;
                    }
                    match callback.try_borrow_mut() {
                        Ok(mut callback) => (&mut *callback)(event),
                        Err(_) => {
                            log::warn!("Skipping re-entrant {:?} listener for {:?}", phase, kind);
                            true
                        }
                    }
                }
                Listener::Handler(handler) => match handler.try_borrow_mut() {
                    Ok(mut handler) => match phase {
                        Phase::BeforeCommit => handler.before(event),
                        Phase::AfterCommit => handler.after(event),
                    },
                    Err(_) => {
                        log::warn!("Skipping re-entrant {:?} handler for {:?}", phase, kind);
                        true
                    }
                },
            };
            if !accepted {
                log::debug!("{:?} {:?} stopped by listener", phase, kind);
                return false;
            }
        }

        // Most recently chained hubs first.
        for hub in chained.iter().rev() {
            if !hub.dispatch_inner(phase, event, visited) {
                return false;
            }
        }
        true
    }
}

/// Dispatch one event over several hubs, visiting each reachable hub once.
///
/// Stops at the first listener returning `false` and reports the veto.
pub fn dispatch_all(hubs: &[&EventHub], phase: Phase, event: &Event) -> bool {
    let mut visited = Vec::new();
    for hub in hubs {
        if !hub.dispatch_inner(phase, event, &mut visited) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Context;
    use std::cell::Cell;

    fn sample(ctx: &Context) -> Event {
        Event::TransformChanged { element: ctx.next_id() }
    }

    #[test]
    fn test_before_listener_can_veto() {
        let ctx = Context::new();
        let hub = EventHub::new();
        hub.on_before(EventKind::TransformChanged, |_| false);
        assert!(!hub.validate_before(&sample(&ctx)));
        assert!(hub.trigger_on(&sample(&ctx)));
    }

    #[test]
    fn test_kind_filtering() {
        let ctx = Context::new();
        let hub = EventHub::new();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        hub.on_after(EventKind::BoundsChanged, move |_| {
            counter.set(counter.get() + 1);
            true
        });
        hub.trigger_on(&sample(&ctx));
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn test_chained_hub_sees_events_once() {
        let ctx = Context::new();
        let scene = EventHub::new();
        let a = EventHub::new();
        let b = EventHub::new();
        a.chain(&scene).unwrap();
        b.chain(&scene).unwrap();

        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        scene.on_after(EventKind::TransformChanged, move |_| {
            counter.set(counter.get() + 1);
            true
        });
        dispatch_all(&[&a, &b], Phase::AfterCommit, &sample(&ctx));
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_veto_short_circuits() {
        let ctx = Context::new();
        let hub = EventHub::new();
        let reached = Rc::new(Cell::new(false));
        let flag = Rc::clone(&reached);
        hub.on_before(EventKind::TransformChanged, |_| false);
        hub.on_before(EventKind::TransformChanged, move |_| {
            flag.set(true);
            true
        });
        assert!(!hub.validate_before(&sample(&ctx)));
        assert!(!reached.get());
    }

    #[test]
    fn test_chain_cycle_rejected() {
        let a = EventHub::new();
        let b = EventHub::new();
        a.chain(&b).unwrap();
        assert_eq!(b.chain(&a), Err(Error::HubCycle));
        assert_eq!(a.chain(&a), Err(Error::HubCycle));
    }

    #[test]
    fn test_unsubscribe_during_dispatch() {
        let ctx = Context::new();
        let hub = EventHub::new();
        let calls = Rc::new(Cell::new(0));

        let sub = Rc::new(Cell::new(None::<Subscription>));
        let inner_hub = hub.clone();
        let inner_sub = Rc::clone(&sub);
        let counter = Rc::clone(&calls);
        let id = hub.on_after(EventKind::TransformChanged, move |_| {
            counter.set(counter.get() + 1);
            if let Some(s) = inner_sub.get() {
                inner_hub.remove(s);
            }
            true
        });
        sub.set(Some(id));

        hub.trigger_on(&sample(&ctx));
        hub.trigger_on(&sample(&ctx));
        assert_eq!(calls.get(), 1);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_reentrant_listener_is_skipped() {
        let ctx = Context::new();
        let hub = EventHub::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let inner_hub = hub.clone();
        let nested = sample(&ctx);
        hub.on_after(EventKind::TransformChanged, move |_| {
            counter.set(counter.get() + 1);
            inner_hub.trigger_on(&nested);
            true
        });
        hub.trigger_on(&sample(&ctx));
        assert_eq!(calls.get(), 1);
    }

    struct Recorder {
        phases: Vec<Phase>,
    }

    impl EventHandler for Recorder {
        fn before(&mut self, _event: &Event) -> bool {
            self.phases.push(Phase::BeforeCommit);
            true
        }

        fn after(&mut self, _event: &Event) -> bool {
            self.phases.push(Phase::AfterCommit);
            true
        }
    }

    #[test]
    fn test_handler_object_receives_both_phases() {
        let ctx = Context::new();
        let hub = EventHub::new();
        let recorder = Rc::new(RefCell::new(Recorder { phases: Vec::new() }));
        hub.add_handler(recorder.clone());
        let event = sample(&ctx);
        hub.validate_before(&event);
        hub.trigger_on(&event);
        assert_eq!(recorder.borrow().phases, vec![Phase::BeforeCommit, Phase::AfterCommit]);
    }
}
