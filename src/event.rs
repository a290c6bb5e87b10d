//! Tagged events and the bounded queue feeding the dispatcher.
//!
//! Compositor callbacks never mutate menu state directly: every wayland
//! handler and timer pushes a tagged [`Event`] onto one [`EventQueue`],
//! and the single-threaded run loop drains it in order. This keeps the
//! dismiss-timer race-free with pointer enter/leave and makes the
//! transitions unit-testable without a compositor.

use std::collections::VecDeque;

use smithay_client_toolkit::seat::keyboard::Keysym;
use tracing::warn;

use crate::tree::MenuId;

/// Everything the run loop reacts to.
#[derive(Debug, Clone)]
pub enum Event {
    /// The compositor configured a layer surface; its serial has already
    /// been acknowledged by the handler.
    Configured { menu: MenuId },
    /// The compositor closed a layer surface out from under us.
    Closed { menu: MenuId },
    /// The in-flight buffer of a surface was released.
    BufferReleased { menu: MenuId },
    PointerEnter { menu: MenuId, y: f64 },
    PointerLeave { menu: MenuId },
    PointerMotion { menu: MenuId, y: f64 },
    /// Button press; `button` is the raw linux input code, `y` the last
    /// known surface-relative position.
    Button { menu: MenuId, button: u32, y: f64 },
    /// Vertical axis step; positive scrolls down.
    Axis { menu: MenuId, delta: f64 },
    Key {
        keysym: Keysym,
        utf8: Option<String>,
        shift: bool,
    },
    /// The dismiss timer armed on pointer leave has fired.
    DismissExpired,
}

/// Bounded FIFO between wayland handlers and the dispatcher. Overflow
/// drops the newest event with a warning; menu input is low-rate enough
/// that hitting the cap means the dispatcher has stalled.
pub struct EventQueue {
    events: VecDeque<Event>,
    capacity: usize,
}

impl EventQueue {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: Event) {
        if self.events.len() >= self.capacity {
            warn!(?event, "event queue full, dropping");
            return;
        }
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = EventQueue::new();
        q.push(Event::DismissExpired);
        q.push(Event::Closed { menu: MenuId::ROOT });
        assert!(matches!(q.pop(), Some(Event::DismissExpired)));
        assert!(matches!(q.pop(), Some(Event::Closed { .. })));
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_overflow_drops_newest_without_reordering() {
        let mut q = EventQueue::with_capacity(2);
        q.push(Event::PointerLeave { menu: MenuId::ROOT });
        q.push(Event::DismissExpired);
        q.push(Event::Closed { menu: MenuId::ROOT });
        assert!(matches!(q.pop(), Some(Event::PointerLeave { .. })));
        assert!(matches!(q.pop(), Some(Event::DismissExpired)));
        assert!(q.is_empty());
    }
}
