//! Event dispatch: menu-first routing with an input-suppression gate.
//!
//! Once per main-loop iteration all queued events are pulled in arrival
//! order. While startup has not completed, or while the full-screen options
//! overlay owns the screen, every queued event is drained and discarded so
//! stray input cannot leak into gameplay. Otherwise a modal menu gets first
//! refusal on each event; whatever it does not consume reaches the
//! simulation responder. No event is ever delivered twice.

use crate::event::{InputEvent, InputQueue};

// ---------------------------------------------------------------------------
// Responder traits
// ---------------------------------------------------------------------------

/// The modal menu's input contract. Returning `true` consumes the event,
/// swallowing it from the simulation.
pub trait MenuResponder {
    fn respond(&mut self, event: &InputEvent) -> bool;
}

/// The simulation layer's input contract. The return value reports whether
/// the event was used; dispatch does not act on it.
pub trait GameResponder {
    fn respond(&mut self, event: &InputEvent) -> bool;
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Conditions under which queued input is discarded instead of delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchGate {
    /// Startup has finished and the main loop is running.
    pub startup_complete: bool,
    /// The full-screen in-engine options overlay is active and owns input.
    pub overlay_active: bool,
}

impl DispatchGate {
    /// Whether events should be discarded this iteration.
    pub fn suppressed(&self) -> bool {
        !self.startup_complete || self.overlay_active
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Counts from one dispatch pass, for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Events drained and dropped by the suppression gate.
    pub discarded: usize,
    /// Events the menu consumed.
    pub menu_consumed: usize,
    /// Events offered to the simulation responder.
    pub game_offered: usize,
}

/// Drain the queue once and route every event.
///
/// Undelivered events are lost, not deferred: a suppressed pass leaves the
/// queue empty without offering anything to either responder.
pub fn dispatch<M, G>(
    queue: &mut InputQueue,
    gate: DispatchGate,
    menu: &mut M,
    game: &mut G,
) -> DispatchOutcome
where
    M: MenuResponder + ?Sized,
    G: GameResponder + ?Sized,
{
    let mut outcome = DispatchOutcome::default();

    if gate.suppressed() {
        while queue.pop().is_some() {
            outcome.discarded += 1;
        }
        if outcome.discarded > 0 {
            tracing::debug!(discarded = outcome.discarded, "input suppressed");
        }
        return outcome;
    }

    while let Some(event) = queue.pop() {
        if menu.respond(&event) {
            outcome.menu_consumed += 1;
            continue; // menu ate the event
        }
        game.respond(&event);
        outcome.game_offered += 1;
    }

    outcome
}

// ===========================================================================
// Tests
// ===========================================================================
