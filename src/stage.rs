//! Stage core: the render scheduler, drag controller and listener registry.
//!
//! `StageCore` holds every piece of stage state that does not need the DOM,
//! so the tick loop and pointer handling can be exercised without a browser.
//! The browser wrapper ([`crate::web::Stage`]) supplies a [`Surface`] and a
//! [`Ticker`] backed by `gloo_timers`.
//!
//! Listeners and pointer handlers receive `&mut StageCore` and may change
//! pause state, frame rate, or the drag target mid-tick. `tick` re-reads that
//! state after firing `EnterFrame` instead of deciding once up front.

#[cfg(test)]
#[path = "stage_test.rs"]
mod stage_test;

use std::collections::{HashMap, VecDeque};

use crate::config::StageConfig;
use crate::consts::MS_PER_SECOND;
use crate::error::StageError;
use crate::event::{EventDispatcher, ListenerId, StageEvent, StageEventKind};
use crate::geom::{Point, Rect};
use crate::surface::Surface;
use crate::tree::{DisplayTree, NodeId};

/// Periodic timer driving [`StageCore::tick`].
pub trait Ticker {
    /// Start firing every `interval_ms` milliseconds.
    fn arm(&mut self, interval_ms: f64);

    /// Stop firing. Must be safe to call from inside a tick.
    fn cancel(&mut self);
}

/// Callback for stage listeners and per-node pointer handlers.
pub type EventCallback = Box<dyn FnMut(&StageEvent, &mut StageCore)>;

/// Stage state and behavior that does not depend on the browser.
pub struct StageCore {
    pub tree: DisplayTree,
    pub(crate) mouse: Point,
    frame_rate: f64,
    paused: bool,
    pause_next_frame: bool,
    pub(crate) trace_mouse_target: bool,
    pub(crate) mouse_target: Option<NodeId>,
    drag_target: Option<NodeId>,
    drag_offset: Point,
    ticker: Box<dyn Ticker>,
    timer_armed: bool,
    events: EventDispatcher<StageCore>,
    pending_events: VecDeque<StageEvent>,
    dispatching: bool,
    pub(crate) handlers: HashMap<NodeId, EventCallback>,
}

impl StageCore {
    /// Create a stage and arm its ticker at `config.frame_rate`.
    #[must_use]
    pub fn new(config: StageConfig, ticker: Box<dyn Ticker>) -> Self {
        let mut core = Self {
            tree: DisplayTree::new(),
            mouse: Point::default(),
            frame_rate: 0.0,
            paused: config.paused,
            pause_next_frame: false,
            trace_mouse_target: config.trace_mouse_target,
            mouse_target: None,
            drag_target: None,
            drag_offset: Point::default(),
            ticker,
            timer_armed: false,
            events: EventDispatcher::new(),
            pending_events: VecDeque::new(),
            dispatching: false,
            handlers: HashMap::new(),
        };
        core.set_frame_rate(config.frame_rate);
        core
    }

    // --- Scheduling ---

    #[must_use]
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Change the tick rate. The running timer is cancelled and, for a positive
    /// rate, replaced by one firing every `1000 / rate` ms. Setting the current
    /// rate again does nothing.
    #[allow(clippy::float_cmp)]
    pub fn set_frame_rate(&mut self, rate: f64) {
        if rate == self.frame_rate {
            return;
        }
        self.frame_rate = rate;
        self.cancel_timer();
        if rate > 0.0 {
            self.ticker.arm(MS_PER_SECOND / rate);
            self.timer_armed = true;
        }
        log::debug!("stage frame rate set to {rate}");
    }

    /// Whether a timer is currently armed.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.timer_armed
    }

    fn cancel_timer(&mut self) {
        if self.timer_armed {
            self.ticker.cancel();
            self.timer_armed = false;
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the next rendered tick will commit a pause.
    #[must_use]
    pub fn pauses_after_current_frame(&self) -> bool {
        self.pause_next_frame
    }

    /// Start or stop rendering. Repeating the current state does nothing.
    ///
    /// With `after_current_frame`, one more tick renders before the stage
    /// pauses. This covers pauses requested from an `EnterFrame` listener,
    /// after the tick has already decided to run. Passed while resuming, it
    /// renders exactly one frame and pauses again.
    pub fn set_paused(&mut self, pause: bool, after_current_frame: bool) {
        if self.paused == pause {
            return;
        }
        self.paused = pause;
        self.pause_next_frame = after_current_frame;
        log::debug!("stage paused={pause} after_current_frame={after_current_frame}");
    }

    /// Run one timer tick. Returns whether a render pass ran.
    ///
    /// # Errors
    ///
    /// Propagates a failing surface call from the render pass. The timer
    /// self-stop and pending pause are still applied.
    pub fn tick(&mut self, surface: &mut dyn Surface) -> Result<bool, StageError> {
        if self.paused && !self.pause_next_frame {
            return Ok(false);
        }

        self.dispatch(StageEvent::enter_frame(self.mouse));

        // Listeners may have paused the stage.
        let rendered = if !self.paused || self.pause_next_frame {
            self.render(surface).map(|()| true)
        } else {
            Ok(false)
        };

        if self.frame_rate <= 0.0 {
            self.cancel_timer();
        }
        if self.pause_next_frame {
            self.paused = true;
            self.pause_next_frame = false;
        }
        rendered
    }

    /// One render pass: clear, reposition the drag target, draw the tree.
    ///
    /// # Errors
    ///
    /// Propagates a failing surface call.
    pub fn render(&mut self, surface: &mut dyn Surface) -> Result<(), StageError> {
        self.clear(surface, None);
        self.apply_drag();
        self.tree.render(surface)
    }

    /// Clear `rect`, or the whole surface when `None`.
    #[allow(clippy::unused_self)]
    pub fn clear(&self, surface: &mut dyn Surface, rect: Option<Rect>) {
        let rect = rect.unwrap_or_else(|| Rect::new(0.0, 0.0, surface.width(), surface.height()));
        surface.clear_rect(rect);
    }

    /// Cancel the timer and drop drag state. The stage stays usable; a later
    /// `set_frame_rate` re-arms it.
    pub fn shutdown(&mut self) {
        self.cancel_timer();
        self.frame_rate = 0.0;
        self.drag_target = None;
        log::debug!("stage shut down");
    }

    // --- Pointer state ---

    /// Pointer position in stage coordinates.
    #[must_use]
    pub fn mouse(&self) -> Point {
        self.mouse
    }

    #[must_use]
    pub fn mouse_x(&self) -> f64 {
        self.mouse.x
    }

    #[must_use]
    pub fn mouse_y(&self) -> f64 {
        self.mouse.y
    }

    #[must_use]
    pub fn trace_mouse_target(&self) -> bool {
        self.trace_mouse_target
    }

    /// Enable or disable hit-target tracking on pointer moves. Disabling keeps
    /// the last resolved target.
    pub fn set_trace_mouse_target(&mut self, trace: bool) {
        self.trace_mouse_target = trace;
    }

    /// Current hit target, if it is still in the tree.
    #[must_use]
    pub fn mouse_target(&self) -> Option<NodeId> {
        self.mouse_target.filter(|id| self.tree.contains(*id))
    }

    // --- Drag ---

    /// Begin dragging `target`. The pointer's position in the target's local
    /// space is captured so the target does not jump on the first frame.
    /// Replaces any drag already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnknownNode`] if `target` is not in the tree.
    pub fn start_drag(&mut self, target: NodeId) -> Result<(), StageError> {
        let offset = self
            .tree
            .global_to_local(target, self.mouse)
            .ok_or(StageError::UnknownNode(target))?;
        self.drag_target = Some(target);
        self.drag_offset = offset;
        log::debug!("drag started on {target} at local ({}, {})", offset.x, offset.y);
        Ok(())
    }

    pub fn stop_drag(&mut self) {
        if let Some(target) = self.drag_target.take() {
            log::debug!("drag stopped on {target}");
        }
    }

    /// Node being dragged, if it is still in the tree.
    #[must_use]
    pub fn drag_target(&self) -> Option<NodeId> {
        self.drag_target.filter(|id| self.tree.contains(*id))
    }

    /// Local-space point held under the pointer while dragging.
    #[must_use]
    pub fn drag_offset(&self) -> Point {
        self.drag_offset
    }

    /// Move the drag target so its captured local point sits under the pointer.
    fn apply_drag(&mut self) {
        let Some(target) = self.drag_target else {
            return;
        };
        let Some(node) = self.tree.get(target) else {
            self.drag_target = None;
            return;
        };
        let pointer = match node.parent() {
            Some(parent) => self.tree.global_to_local(parent, self.mouse),
            None => Some(self.mouse),
        };
        let Some(pointer) = pointer else {
            return;
        };
        let (scale_x, scale_y) = (node.scale_x, node.scale_y);
        let offset = self.drag_offset;
        if let Some(node) = self.tree.get_mut(target) {
            node.x = pointer.x - offset.x * scale_x;
            node.y = pointer.y - offset.y * scale_y;
        }
    }

    // --- Listeners ---

    /// Register a stage listener for `kind`.
    pub fn add_listener(
        &mut self,
        kind: StageEventKind,
        listener: impl FnMut(&StageEvent, &mut StageCore) + 'static,
    ) -> ListenerId {
        self.events.add(kind, Box::new(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.events.remove(id)
    }

    /// Deliver `event` to stage listeners. Events dispatched from inside a
    /// listener are queued and delivered once the current one finishes.
    pub fn dispatch(&mut self, event: StageEvent) {
        self.pending_events.push_back(event);
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        while let Some(event) = self.pending_events.pop_front() {
            let mut running = self.events.detach();
            running.dispatch(&event, self);
            self.events.restore(running);
        }
        self.dispatching = false;
    }

    // --- Pointer handlers ---

    /// Install the pointer handler for `id`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::UnknownNode`] if `id` is not in the tree.
    pub fn set_pointer_handler(
        &mut self,
        id: NodeId,
        handler: impl FnMut(&StageEvent, &mut StageCore) + 'static,
    ) -> Result<(), StageError> {
        if !self.tree.contains(id) {
            return Err(StageError::UnknownNode(id));
        }
        self.handlers.insert(id, Box::new(handler));
        Ok(())
    }

    pub fn clear_pointer_handler(&mut self, id: NodeId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    #[must_use]
    pub fn has_pointer_handler(&self, id: NodeId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Destroy `id` and its subtree, dropping their handlers and any hit or
    /// drag target among them. Returns false if nothing was removed.
    pub fn destroy_node(&mut self, id: NodeId) -> bool {
        let removed = self.tree.destroy(id);
        for node in &removed {
            self.handlers.remove(node);
            if self.mouse_target == Some(*node) {
                self.mouse_target = None;
            }
            if self.drag_target == Some(*node) {
                self.drag_target = None;
            }
        }
        !removed.is_empty()
    }
}
