//! Ashlight Core -- shared types and contracts for the presentation engine.
//!
//! This crate provides the pieces every other Ashlight crate depends on:
//! tick/time units, the input event queue and dispatch rules, the frame
//! timing governor, the top-level screen states, the engine context that
//! replaces ambient globals, and the narrow collaborator traits through
//! which the renderer, audio mixer, menu, and simulation are invoked.
//!
//! # Iteration Pipeline
//!
//! One main-loop iteration runs the following phases, in order:
//!
//! 1. **Timing** -- Record the iteration's wall-clock timestamp.
//! 2. **Input** -- Drain the event queue and dispatch (or discard) events.
//! 3. **Simulate** -- Run the external simulation stepper at least once.
//! 4. **Audio** -- Update positional audio.
//! 5. **Compose** -- Draw the active screen state, wiping if it changed.
//! 6. **Cap** -- Optionally defer until the target frame interval elapses.
//!
//! # Key Types
//!
//! - [`tick::Ticks`] -- The engine's logical clock unit (fixed 35 Hz).
//! - [`event::InputQueue`] -- Bounded FIFO of platform input events.
//! - [`dispatch::dispatch`] -- Menu-first, gate-aware event routing.
//! - [`timing::TimingGovernor`] -- Frame pacing and the 60 Hz rate cap.
//! - [`screen::ScreenState`] -- Mutually exclusive presentation modes.
//! - [`context::EngineContext`] -- Explicit engine state, no globals.
//! - [`subsystem`] -- Collaborator contracts for external subsystems.

pub mod context;
pub mod dispatch;
pub mod event;
pub mod options;
pub mod screen;
pub mod subsystem;
pub mod tick;
pub mod timing;
