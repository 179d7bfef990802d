//! Ashlight Screen -- display composition, transitions, and sequencing.
//!
//! The presentation half of the engine: the per-iteration display
//! compositor with its partial-redraw bookkeeping, the wipe transition
//! state machine, the demo/intro sequencer that drives the non-interactive
//! title presentation, the graphical startup intro, and the main loop that
//! composes all of it.
//!
//! # Key Types
//!
//! - [`compositor::DisplayCompositor`] -- Per-state draw dispatch, border
//!   redraw budget, wipe handoff.
//! - [`wipe::WipeEngine`] -- Tick-paced blend between frame snapshots.
//! - [`sequencer::DemoSequencer`] -- The intro/title/credits step table.
//! - [`intro::IntroSequence`] -- The timed graphical startup cinematic.
//! - [`mainloop::MainLoop`] -- The iteration pipeline; never returns
//!   except through process termination.

pub mod compositor;
pub mod intro;
pub mod mainloop;
pub mod sequencer;
pub mod wipe;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
