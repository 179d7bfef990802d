//! Platform input events and the process-wide event queue.
//!
//! Events are produced by the platform layer (keyboard, mouse, joystick,
//! window close) and consumed exactly once per main-loop iteration by the
//! dispatcher. Ordering is strictly FIFO. The queue is bounded; when the
//! platform outruns the consumer the oldest event is dropped, so stale
//! input is never buffered indefinitely.

use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A platform key scancode. The mapping from scancodes to actions is owned
/// by the menu and simulation responders, not by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

/// Mouse button bitmask values for [`InputEvent::MouseMotion`].
pub mod mouse_button {
    pub const LEFT: u8 = 0x01;
    pub const RIGHT: u8 = 0x02;
    pub const MIDDLE: u8 = 0x04;
}

/// A single discrete input event.
///
/// Produced by the platform layer, consumed exactly once by dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key was pressed.
    KeyDown(KeyCode),
    /// A key was released.
    KeyUp(KeyCode),
    /// Mouse moved and/or button state changed.
    MouseMotion {
        /// Currently held buttons, see [`mouse_button`].
        buttons: u8,
        /// Horizontal movement since the last event.
        dx: i32,
        /// Vertical movement since the last event.
        dy: i32,
    },
    /// Joystick state snapshot.
    Joystick {
        /// Currently held buttons as a bitmask.
        buttons: u32,
        /// Forward/back axis.
        x: i16,
        /// Turn axis.
        y: i16,
        /// Strafe axis.
        strafe: i16,
    },
    /// The platform requested process termination (window close, signal).
    Quit,
}

// ---------------------------------------------------------------------------
// InputQueue
// ---------------------------------------------------------------------------

/// Maximum number of events held before the oldest is discarded.
pub const EVENT_QUEUE_CAP: usize = 64;

/// Process-lifetime FIFO of input events.
///
/// Single producer (platform layer), single consumer (main loop). Mutated
/// only by the main thread; there is no parallel mutator.
#[derive(Debug, Default)]
pub struct InputQueue {
    pending: VecDeque<InputEvent>,
}

impl InputQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(EVENT_QUEUE_CAP),
        }
    }

    /// Push an event onto the tail of the queue.
    ///
    /// If the queue is full the oldest event is dropped to make room.
    pub fn push(&mut self, event: InputEvent) {
        if self.pending.len() == EVENT_QUEUE_CAP {
            self.pending.pop_front();
        }
        self.pending.push_back(event);
    }

    /// Pop the oldest queued event, if any.
    pub fn pop(&mut self) -> Option<InputEvent> {
        self.pending.pop_front()
    }

    /// Number of events waiting to be dispatched.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue has no pending events.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u16) -> InputEvent {
        InputEvent::KeyDown(KeyCode(n))
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = InputQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn pop_returns_fifo_order() {
        let mut queue = InputQueue::new();
        queue.push(key(1));
        queue.push(key(2));
        queue.push(InputEvent::Quit);

        assert_eq!(queue.pop(), Some(key(1)));
        assert_eq!(queue.pop(), Some(key(2)));
        assert_eq!(queue.pop(), Some(InputEvent::Quit));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut queue = InputQueue::new();
        for n in 0..EVENT_QUEUE_CAP as u16 {
            queue.push(key(n));
        }
        assert_eq!(queue.len(), EVENT_QUEUE_CAP);

        queue.push(key(9999));
        assert_eq!(queue.len(), EVENT_QUEUE_CAP);
        // Event 0 was sacrificed; event 1 is now the head.
        assert_eq!(queue.pop(), Some(key(1)));
    }

    #[test]
    fn mixed_event_kinds_preserved() {
        let mut queue = InputQueue::new();
        let motion = InputEvent::MouseMotion {
            buttons: mouse_button::LEFT,
            dx: 3,
            dy: -1,
        };
        let joy = InputEvent::Joystick {
            buttons: 0,
            x: 10,
            y: 0,
            strafe: -5,
        };
        queue.push(motion);
        queue.push(joy);

        assert_eq!(queue.pop(), Some(motion));
        assert_eq!(queue.pop(), Some(joy));
    }
}
