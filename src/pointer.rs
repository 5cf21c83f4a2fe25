//! Pointer dispatch and hit-target tracking.
//!
//! Every raw input is converted to stage coordinates, then:
//!
//! 1. On a move (with tracking enabled) the hit target is re-resolved. If it
//!    changed, the previous target's handler receives `MouseOut` first.
//! 2. A stage event addressed to the hit target (or the stage) is built.
//! 3. The hit target's handler, if any, receives it.
//! 4. The cursor follows the target's `button_mode`.
//! 5. Stage listeners receive it.
//!
//! Only moves resolve the target, so a press before the first move is
//! addressed to the stage even when it lands on a node.

#[cfg(test)]
#[path = "pointer_test.rs"]
mod pointer_test;

use crate::consts::{CURSOR_DEFAULT, CURSOR_POINTER};
use crate::error::StageError;
use crate::event::{EventTarget, PointerInput, PointerKind, StageEvent, StageEventKind};
use crate::geom::Point;
use crate::stage::StageCore;
use crate::surface::Surface;
use crate::tree::NodeId;

impl StageCore {
    /// Process one raw pointer input and return the stage event it produced.
    ///
    /// Suppressing the browser's default action is left to the caller. A
    /// cursor the surface rejects is logged and the event is still broadcast.
    pub fn handle_pointer(&mut self, input: PointerInput, surface: &mut dyn Surface) -> StageEvent {
        let offset = surface.offset();
        self.mouse = Point::new(input.page_x - offset.x, input.page_y - offset.y);

        if self.trace_mouse_target && input.kind == PointerKind::Move {
            self.resolve_mouse_target();
        }

        let target = self.mouse_target();
        let event = StageEvent::pointer(
            StageEventKind::from(input.kind),
            target.map_or(EventTarget::Stage, EventTarget::Node),
            self.mouse,
        );

        if let Some(id) = target {
            self.invoke_handler(id, &event);
        }

        let button = self
            .mouse_target()
            .and_then(|id| self.tree.get(id))
            .is_some_and(|node| node.button_mode);
        let cursor = if button { CURSOR_POINTER } else { CURSOR_DEFAULT };
        if let Err(err) = self.set_cursor(surface, cursor) {
            log::warn!("cursor {cursor} not applied: {err}");
        }

        self.dispatch(event);
        event
    }

    /// Set the cursor shown over the surface.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Surface`] if the surface rejects the style change.
    #[allow(clippy::unused_self)]
    pub fn set_cursor(&self, surface: &mut dyn Surface, cursor: &str) -> Result<(), StageError> {
        surface.set_cursor(cursor)
    }

    /// Re-resolve the hit target under the pointer, notifying the previous
    /// target with `MouseOut` before the stored target moves on.
    fn resolve_mouse_target(&mut self) {
        let hit = self.tree.object_under_point(self.mouse, true);
        if let Some(previous) = self.mouse_target().filter(|prev| Some(*prev) != hit) {
            let out = StageEvent::pointer(StageEventKind::MouseOut, EventTarget::Node(previous), self.mouse);
            self.invoke_handler(previous, &out);
        }
        self.mouse_target = hit.filter(|id| self.tree.contains(*id));
    }

    /// Run the pointer handler for `id`, if it has one.
    fn invoke_handler(&mut self, id: NodeId, event: &StageEvent) {
        let Some(mut handler) = self.handlers.remove(&id) else {
            return;
        };
        handler(event, self);
        // The handler may have destroyed its node or installed a replacement.
        if self.tree.contains(id) {
            self.handlers.entry(id).or_insert(handler);
        }
    }
}
