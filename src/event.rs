//! Event model: raw pointer input, synthetic stage events, and listener dispatch.
//!
//! `PointerInput` is what the host feeds in (page coordinates, one of three
//! mouse phases). `StageEvent` is what listeners and per-node pointer handlers
//! see: a kind, the resolved target, and stage-space pointer coordinates.
//!
//! `EventDispatcher` is generic over the context handed to listeners so the
//! stage can pass itself mutably while its own registry is detached.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::geom::Point;
use crate::tree::NodeId;

/// Mouse phase of a raw input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Up,
    Move,
}

impl PointerKind {
    /// DOM event name this phase is delivered under.
    #[must_use]
    pub fn dom_event(self) -> &'static str {
        match self {
            Self::Down => "mousedown",
            Self::Up => "mouseup",
            Self::Move => "mousemove",
        }
    }
}

/// Raw pointer input in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub kind: PointerKind,
    pub page_x: f64,
    pub page_y: f64,
}

impl PointerInput {
    #[must_use]
    pub fn new(kind: PointerKind, page_x: f64, page_y: f64) -> Self {
        Self { kind, page_x, page_y }
    }
}

/// Kind of a synthetic stage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageEventKind {
    MouseDown,
    MouseUp,
    MouseMove,
    /// The pointer left the previous hit target.
    MouseOut,
    /// Fired at the start of every tick, before rendering.
    EnterFrame,
}

impl StageEventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOut => "mouseout",
            Self::EnterFrame => "enterframe",
        }
    }
}

impl From<PointerKind> for StageEventKind {
    fn from(kind: PointerKind) -> Self {
        match kind {
            PointerKind::Down => Self::MouseDown,
            PointerKind::Up => Self::MouseUp,
            PointerKind::Move => Self::MouseMove,
        }
    }
}

/// Who an event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "id")]
pub enum EventTarget {
    Stage,
    Node(NodeId),
}

impl EventTarget {
    /// The node id, unless the target is the stage itself.
    #[must_use]
    pub fn node(self) -> Option<NodeId> {
        match self {
            Self::Stage => None,
            Self::Node(id) => Some(id),
        }
    }
}

/// A synthetic event delivered to stage listeners and node pointer handlers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    pub kind: StageEventKind,
    pub target: EventTarget,
    pub current_target: EventTarget,
    /// Pointer x in stage coordinates when the event was built.
    pub mouse_x: f64,
    /// Pointer y in stage coordinates when the event was built.
    pub mouse_y: f64,
}

impl StageEvent {
    /// A pointer-flavored event addressed to `target`.
    #[must_use]
    pub fn pointer(kind: StageEventKind, target: EventTarget, mouse: Point) -> Self {
        Self { kind, target, current_target: target, mouse_x: mouse.x, mouse_y: mouse.y }
    }

    /// The per-tick frame-start notification.
    #[must_use]
    pub fn enter_frame(mouse: Point) -> Self {
        Self::pointer(StageEventKind::EnterFrame, EventTarget::Stage, mouse)
    }

    #[must_use]
    pub fn mouse(&self) -> Point {
        Point::new(self.mouse_x, self.mouse_y)
    }
}

/// Handle returned by [`EventDispatcher::add`], used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener callback. Receives the event and the dispatching context.
pub type Listener<C> = Box<dyn FnMut(&StageEvent, &mut C)>;

/// Per-kind listener registry.
///
/// Dispatch runs against a detached snapshot (see [`EventDispatcher::detach`]):
/// listeners added while it runs are kept for later events, and listeners
/// removed while it runs are dropped when the snapshot is restored.
pub struct EventDispatcher<C> {
    listeners: HashMap<StageEventKind, Vec<(ListenerId, Listener<C>)>>,
    next_id: u64,
    in_flight: HashSet<ListenerId>,
    removed: HashSet<ListenerId>,
}

impl<C> Default for EventDispatcher<C> {
    fn default() -> Self {
        Self { listeners: HashMap::new(), next_id: 0, in_flight: HashSet::new(), removed: HashSet::new() }
    }
}

impl<C> EventDispatcher<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of `kind`. Listeners run in registration order.
    pub fn add(&mut self, kind: StageEventKind, listener: Listener<C>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(kind).or_default().push((id, listener));
        id
    }

    /// Remove a listener. Returns false if the id is unknown or already removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        for list in self.listeners.values_mut() {
            if let Some(pos) = list.iter().position(|(lid, _)| *lid == id) {
                list.remove(pos);
                return true;
            }
        }
        if self.in_flight.contains(&id) {
            return self.removed.insert(id);
        }
        false
    }

    /// Whether any listener is registered for `kind`.
    #[must_use]
    pub fn has_listeners(&self, kind: StageEventKind) -> bool {
        self.listeners.get(&kind).is_some_and(|list| !list.is_empty())
    }

    /// Number of registered listeners across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move every listener into a snapshot for dispatch. New registrations keep
    /// landing in `self` and keep drawing ids from the same counter.
    #[must_use]
    pub fn detach(&mut self) -> Self {
        let listeners = std::mem::take(&mut self.listeners);
        self.in_flight = listeners.values().flatten().map(|(id, _)| *id).collect();
        Self { listeners, next_id: self.next_id, in_flight: HashSet::new(), removed: HashSet::new() }
    }

    /// Merge a dispatched snapshot back: snapshot listeners first (minus those
    /// removed meanwhile), then anything registered during dispatch.
    pub fn restore(&mut self, snapshot: Self) {
        let mut listeners = snapshot.listeners;
        for list in listeners.values_mut() {
            list.retain(|(id, _)| !self.removed.contains(id));
        }
        for (kind, mut added) in std::mem::take(&mut self.listeners) {
            listeners.entry(kind).or_default().append(&mut added);
        }
        self.listeners = listeners;
        self.in_flight.clear();
        self.removed.clear();
    }

    /// Invoke every listener for `event.kind` with `ctx`.
    pub fn dispatch(&mut self, event: &StageEvent, ctx: &mut C) {
        if let Some(list) = self.listeners.get_mut(&event.kind) {
            for (_, listener) in list.iter_mut() {
                listener(event, ctx);
            }
        }
    }
}
