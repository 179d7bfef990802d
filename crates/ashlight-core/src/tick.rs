//! Simulation time units.

/// Ticks are the atomic unit of simulation time. The counter is owned by
/// the external simulation stepper and only ever increases.
pub type Ticks = u64;

/// Fixed logical rate of the simulation, in ticks per second. Decoupled
/// from the display frame rate (the frame cap targets 60 Hz).
pub const TICRATE: Ticks = 35;

/// Convert whole seconds to ticks.
#[inline]
pub const fn secs_to_ticks(secs: u64) -> Ticks {
    secs * TICRATE
}

/// Convert milliseconds to ticks, rounding down.
#[inline]
pub const fn ms_to_ticks(ms: u64) -> Ticks {
    ms * TICRATE / 1000
}

/// Convert ticks to milliseconds, rounding down.
#[inline]
pub const fn ticks_to_ms(ticks: Ticks) -> u64 {
    ticks * 1000 / TICRATE
}
