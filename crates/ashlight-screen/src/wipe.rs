//! The screen wipe: a tick-paced blend between two frame snapshots.
//!
//! When the screen state changes, the compositor snapshots the outgoing
//! frame, composes the incoming one, snapshots that too, and then animates
//! between them. The blend is deterministic and tick-indexed: each
//! animation pass moves every pixel's palette index toward the target by
//! the number of elapsed ticks, so identical tick sequences produce
//! identical frames.

use ashlight_core::subsystem::FrameCapture;
use ashlight_core::tick::Ticks;

/// Minimum ticks between animation steps. The wipe loop waits until at
/// least this many have elapsed before advancing.
pub const WIPE_TICK_GRANULARITY: Ticks = 3;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Result of one animation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeStatus {
    InProgress,
    /// Every pixel has reached the target; call [`WipeEngine::finish`].
    Complete,
}

#[derive(Debug)]
enum WipePhase {
    /// No transition pending.
    Idle,
    /// The outgoing frame has been captured; waiting for the incoming one.
    CaptureStart { start: FrameCapture },
    /// Blending `working` toward `end`.
    Animating {
        working: FrameCapture,
        end: FrameCapture,
    },
}

/// The wipe transition engine: `Idle -> CaptureStart -> Animating -> Idle`.
#[derive(Debug)]
pub struct WipeEngine {
    phase: WipePhase,
}

impl WipeEngine {
    pub fn new() -> Self {
        Self {
            phase: WipePhase::Idle,
        }
    }

    /// Whether no transition is pending or running.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, WipePhase::Idle)
    }

    /// Snapshot the outgoing frame. Must be called from `Idle`.
    pub fn capture_start(&mut self, frame: FrameCapture) {
        debug_assert!(self.is_idle(), "wipe already in progress");
        self.phase = WipePhase::CaptureStart { start: frame };
    }

    /// Snapshot the incoming frame and begin animating from the outgoing
    /// one. Must follow `capture_start`.
    pub fn capture_end(&mut self, frame: FrameCapture) {
        match std::mem::replace(&mut self.phase, WipePhase::Idle) {
            WipePhase::CaptureStart { start } => {
                self.phase = WipePhase::Animating {
                    working: start,
                    end: frame,
                };
            }
            other => {
                debug_assert!(false, "capture_end without capture_start");
                self.phase = other;
            }
        }
    }

    /// Advance the blend by the given number of elapsed ticks.
    ///
    /// Stays in `Animating` even when complete so the final frame remains
    /// presentable; the caller ends the transition with [`finish`].
    ///
    /// [`finish`]: WipeEngine::finish
    pub fn advance(&mut self, tics: Ticks) -> WipeStatus {
        let WipePhase::Animating { working, end } = &mut self.phase else {
            return WipeStatus::Complete;
        };

        let mut remaining = false;
        for (w, e) in working.data_mut().iter_mut().zip(end.data()) {
            if *w < *e {
                *w = (*w as u64 + tics).min(*e as u64) as u8;
            } else if *w > *e {
                *w = (*w as u64).saturating_sub(tics).max(*e as u64) as u8;
            }
            if *w != *e {
                remaining = true;
            }
        }

        if remaining {
            WipeStatus::InProgress
        } else {
            WipeStatus::Complete
        }
    }

    /// The frame to present for the current animation step.
    pub fn frame(&self) -> Option<&FrameCapture> {
        match &self.phase {
            WipePhase::Animating { working, .. } => Some(working),
            _ => None,
        }
    }

    /// Return to `Idle` after a completed animation.
    pub fn finish(&mut self) {
        self.phase = WipePhase::Idle;
    }
}

impl Default for WipeEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frame(value: u8) -> FrameCapture {
        let mut frame = FrameCapture::new();
        frame.data_mut().fill(value);
        frame
    }

    #[test]
    fn fresh_engine_is_idle() {
        let engine = WipeEngine::new();
        assert!(engine.is_idle());
        assert!(engine.frame().is_none());
    }

    #[test]
    fn capture_pair_enters_animating() {
        let mut engine = WipeEngine::new();
        engine.capture_start(flat_frame(0));
        engine.capture_end(flat_frame(9));

        assert!(!engine.is_idle());
        // The working frame starts as the outgoing snapshot.
        assert_eq!(engine.frame().unwrap().data()[0], 0);
    }

    #[test]
    fn advance_moves_pixels_by_tick_count() {
        let mut engine = WipeEngine::new();
        engine.capture_start(flat_frame(0));
        engine.capture_end(flat_frame(10));

        assert_eq!(engine.advance(3), WipeStatus::InProgress);
        assert_eq!(engine.frame().unwrap().data()[0], 3);

        assert_eq!(engine.advance(4), WipeStatus::InProgress);
        assert_eq!(engine.frame().unwrap().data()[0], 7);

        // Overshoot clamps to the target and completes.
        assert_eq!(engine.advance(5), WipeStatus::Complete);
        assert_eq!(engine.frame().unwrap().data()[0], 10);
    }

    #[test]
    fn advance_steps_downward_too() {
        let mut engine = WipeEngine::new();
        engine.capture_start(flat_frame(200));
        engine.capture_end(flat_frame(195));

        assert_eq!(engine.advance(3), WipeStatus::InProgress);
        assert_eq!(engine.frame().unwrap().data()[0], 197);
        assert_eq!(engine.advance(3), WipeStatus::Complete);
        assert_eq!(engine.frame().unwrap().data()[0], 195);
    }

    #[test]
    fn blend_is_deterministic_for_a_tick_sequence() {
        let run = |tick_seq: &[Ticks]| {
            let mut engine = WipeEngine::new();
            engine.capture_start(flat_frame(17));
            engine.capture_end(flat_frame(230));
            let mut frames = Vec::new();
            for &t in tick_seq {
                engine.advance(t);
                frames.push(engine.frame().unwrap().clone());
            }
            frames
        };

        assert_eq!(run(&[3, 5, 3, 7]), run(&[3, 5, 3, 7]));
    }

    #[test]
    fn identical_frames_complete_immediately() {
        let mut engine = WipeEngine::new();
        engine.capture_start(flat_frame(42));
        engine.capture_end(flat_frame(42));

        assert_eq!(engine.advance(3), WipeStatus::Complete);
    }

    #[test]
    fn finish_returns_to_idle() {
        let mut engine = WipeEngine::new();
        engine.capture_start(flat_frame(0));
        engine.capture_end(flat_frame(1));
        while engine.advance(3) != WipeStatus::Complete {}
        engine.finish();

        assert!(engine.is_idle());
        assert!(engine.frame().is_none());
    }

    #[test]
    fn worst_case_completes_within_bound() {
        let mut engine = WipeEngine::new();
        engine.capture_start(flat_frame(0));
        engine.capture_end(flat_frame(255));

        let mut passes = 0;
        while engine.advance(WIPE_TICK_GRANULARITY) != WipeStatus::Complete {
            passes += 1;
            assert!(passes <= 255 / WIPE_TICK_GRANULARITY + 1, "wipe never completed");
        }
    }

    #[test]
    fn advance_while_idle_reports_complete() {
        let mut engine = WipeEngine::new();
        assert_eq!(engine.advance(3), WipeStatus::Complete);
    }
}
