//! Frame timing: wall-clock sources, the frame budget, and the rate cap.
//!
//! The governor records a timestamp at the top of each iteration, makes
//! sure the simulation stepper runs at least once, and -- when both
//! interpolated frame output and the frame-rate limit are enabled -- defers
//! the iteration with short bounded sleeps until the target interval has
//! elapsed. The sound engine cannot tolerate the loop running at full
//! blast, so the cap gives up CPU on a consistent basis rather than
//! spinning.

use fixed::types::I16F16;

use crate::subsystem::SimulationStepper;
use crate::tick::{TICRATE, Ticks};

/// Q16.16 fixed-point for fractional millisecond arithmetic. The 60 Hz
/// target interval (1000/60 ms) is not integral, and the cap must compare
/// it deterministically.
pub type Fixed32 = I16F16;

/// Target display rate when the cap is active, in frames per second.
pub const CAP_RATE_HZ: u32 = 60;

/// Remaining headroom below which the cap spins instead of sleeping.
const CAP_SLEEP_THRESHOLD_MS: u64 = 3;

/// Length of one bounded cap sleep.
const CAP_SLEEP_MS: u64 = 2;

// ---------------------------------------------------------------------------
// Clock and idler seams
// ---------------------------------------------------------------------------

/// Monotonic wall-clock source. Timing functions never fail; a
/// malfunctioning clock degrades pacing but not correctness.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch.
    fn now_ms(&self) -> u64;

    /// Wall clock converted to tick units. Used to pace the wipe.
    fn now_ticks(&self) -> Ticks {
        self.now_ms() * TICRATE / 1000
    }
}

/// Bounded processor yield. Implementations must never block longer than
/// a few milliseconds per call; audio is latency-sensitive.
pub trait Idler {
    fn sleep_ms(&mut self, ms: u64);
}

/// Real wall clock, measured from construction.
#[derive(Debug)]
pub struct SystemClock {
    epoch: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Real thread sleep.
#[derive(Debug, Default)]
pub struct ThreadIdler;

impl Idler for ThreadIdler {
    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

// ---------------------------------------------------------------------------
// FrameBudget
// ---------------------------------------------------------------------------

/// Per-iteration timing state.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FrameBudget {
    /// Fixed target interval between presented frames, in milliseconds.
    pub target_interval_ms: Fixed32,
    /// Timestamp recorded by `begin_iteration`.
    pub last_frame_ms: u64,
    /// Interpolated frame output is enabled.
    pub interpolate: bool,
    /// The frame-rate limit is enabled.
    pub cap_enabled: bool,
}

impl FrameBudget {
    /// Budget targeting the given display rate, with capping off.
    pub fn at_rate(hz: u32) -> Self {
        Self {
            target_interval_ms: Fixed32::from_num(1000) / Fixed32::from_num(hz),
            last_frame_ms: 0,
            interpolate: false,
            cap_enabled: false,
        }
    }
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self::at_rate(CAP_RATE_HZ)
    }
}

// ---------------------------------------------------------------------------
// TimingGovernor
// ---------------------------------------------------------------------------

/// Paces the main loop: iteration timestamps, simulation stepping, and the
/// optional frame-rate cap.
#[derive(Debug)]
pub struct TimingGovernor<C: Clock, I: Idler> {
    clock: C,
    idler: I,
    pub budget: FrameBudget,
}

impl<C: Clock, I: Idler> TimingGovernor<C, I> {
    pub fn new(clock: C, idler: I, budget: FrameBudget) -> Self {
        Self {
            clock,
            idler,
            budget,
        }
    }

    /// Record the wall-clock timestamp for this iteration.
    pub fn begin_iteration(&mut self) {
        self.budget.last_frame_ms = self.clock.now_ms();
    }

    /// Run the simulation stepper, waiting (in bounded sleeps) until at
    /// least one step has executed. Returns the number of steps run.
    pub fn run_steps(&mut self, stepper: &mut dyn SimulationStepper) -> u64 {
        let mut steps = stepper.run_pending();
        while steps == 0 {
            self.idler.sleep_ms(1);
            steps = stepper.run_pending();
        }
        steps
    }

    /// Whether the iteration should be deferred to honor the target rate.
    ///
    /// Returns `true` while the elapsed time since `begin_iteration` is
    /// below the target interval; the caller loops on it. When more than
    /// [`CAP_SLEEP_THRESHOLD_MS`] of headroom remains, one bounded sleep is
    /// performed per call. Inactive unless both interpolation and the cap
    /// are enabled.
    pub fn cap_if_needed(&mut self) -> bool {
        if !(self.budget.interpolate && self.budget.cap_enabled) {
            return false;
        }

        let elapsed_ms = self.clock.now_ms().saturating_sub(self.budget.last_frame_ms);
        let elapsed = Fixed32::saturating_from_num(elapsed_ms);
        if elapsed >= self.budget.target_interval_ms {
            return false;
        }

        if self.budget.target_interval_ms - elapsed > Fixed32::from_num(CAP_SLEEP_THRESHOLD_MS) {
            self.idler.sleep_ms(CAP_SLEEP_MS);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Wipe pacing
// ---------------------------------------------------------------------------

/// Minimal clock-plus-sleep surface the wipe animation loop needs.
pub trait WipePacer {
    fn now_ticks(&self) -> Ticks;
    fn sleep_ms(&mut self, ms: u64);
}

impl<C: Clock, I: Idler> WipePacer for TimingGovernor<C, I> {
    fn now_ticks(&self) -> Ticks {
        self.clock.now_ticks()
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.idler.sleep_ms(ms);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Clock whose reading is advanced by the test (and by fake sleeps).
    #[derive(Clone)]
    struct FakeClock {
        now: Rc<Cell<u64>>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now: Rc::new(Cell::new(0)),
            }
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }
    }

    /// Idler that advances the shared fake clock instead of sleeping.
    struct FakeIdler {
        now: Rc<Cell<u64>>,
        slept_ms: u64,
        calls: u32,
    }

    impl Idler for FakeIdler {
        fn sleep_ms(&mut self, ms: u64) {
            self.now.set(self.now.get() + ms);
            self.slept_ms += ms;
            self.calls += 1;
        }
    }

    fn make_governor(interpolate: bool, cap: bool) -> TimingGovernor<FakeClock, FakeIdler> {
        let clock = FakeClock::new();
        let idler = FakeIdler {
            now: clock.now.clone(),
            slept_ms: 0,
            calls: 0,
        };
        let mut budget = FrameBudget::at_rate(CAP_RATE_HZ);
        budget.interpolate = interpolate;
        budget.cap_enabled = cap;
        TimingGovernor::new(clock, idler, budget)
    }

    struct FixedStepper {
        /// Steps returned by each successive `run_pending` call.
        script: Vec<u64>,
        at: usize,
        tick: Ticks,
    }

    impl SimulationStepper for FixedStepper {
        fn run_pending(&mut self) -> u64 {
            let steps = self.script.get(self.at).copied().unwrap_or(1);
            self.at += 1;
            self.tick += steps;
            steps
        }

        fn current_tick(&self) -> Ticks {
            self.tick
        }
    }

    /// Model the spin window: a real busy pass burns a little wall time,
    /// which the fake clock has to be told about.
    fn spin(governor: &TimingGovernor<FakeClock, FakeIdler>) {
        governor.clock.now.set(governor.clock.now.get() + 1);
    }

    #[test]
    fn cap_disabled_introduces_no_delay() {
        let mut governor = make_governor(true, false);
        governor.begin_iteration();
        assert!(!governor.cap_if_needed());
        assert_eq!(governor.idler.slept_ms, 0);

        // Interpolation off also disables the cap, even with cap_enabled.
        let mut governor = make_governor(false, true);
        governor.begin_iteration();
        assert!(!governor.cap_if_needed());
    }

    #[test]
    fn cap_defers_until_interval_elapses() {
        let mut governor = make_governor(true, true);
        governor.begin_iteration();

        let mut passes = 0;
        while governor.cap_if_needed() {
            spin(&governor);
            passes += 1;
            assert!(passes < 1000, "cap never released");
        }

        let elapsed = governor.clock.now_ms() - governor.budget.last_frame_ms;
        assert!(Fixed32::from_num(elapsed) >= governor.budget.target_interval_ms);
    }

    #[test]
    fn consecutive_iterations_never_closer_than_interval() {
        let mut governor = make_governor(true, true);
        let mut last_present = 0u64;

        for i in 0..5 {
            governor.begin_iteration();
            // Simulate a fast frame: 1 ms of work.
            governor.idler.sleep_ms(1);
            while governor.cap_if_needed() {
                spin(&governor);
            }
            let now = governor.clock.now_ms();
            if i > 0 {
                let spacing = now - last_present;
                assert!(
                    Fixed32::from_num(spacing) >= governor.budget.target_interval_ms,
                    "iterations {spacing} ms apart, under the target interval"
                );
            }
            last_present = now;
        }
    }

    #[test]
    fn cap_spins_without_sleep_near_deadline() {
        let mut governor = make_governor(true, true);
        governor.begin_iteration();
        // Land inside the no-sleep window: 15 ms elapsed of ~16.67.
        governor.clock.now.set(15);

        assert!(governor.cap_if_needed());
        assert_eq!(governor.idler.calls, 0, "should spin, not sleep");
    }

    #[test]
    fn run_steps_runs_at_least_once() {
        let mut governor = make_governor(false, false);
        let mut stepper = FixedStepper {
            script: vec![0, 0, 2],
            at: 0,
            tick: 0,
        };

        let steps = governor.run_steps(&mut stepper);

        assert_eq!(steps, 2);
        assert_eq!(stepper.current_tick(), 2);
        // Two empty polls each cost one bounded sleep.
        assert_eq!(governor.idler.calls, 2);
    }

    #[test]
    fn default_budget_targets_sixty_hz() {
        let budget = FrameBudget::default();
        let interval: f64 = budget.target_interval_ms.to_num();
        assert!((interval - 1000.0 / 60.0).abs() < 0.01);
        assert!(!budget.cap_enabled);
    }
}
