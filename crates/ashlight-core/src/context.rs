//! Engine context: the explicit state record shared across the loop.
//!
//! Everything the original-style engine would keep in ambient globals
//! (current screen state, wipe shadow state, pause and startup flags, view
//! geometry) lives here instead. The main loop owns exactly one
//! [`EngineContext`] and hands out references; components never reach into
//! process globals.

use crate::screen::ScreenState;
use crate::tick::Ticks;

/// Width of the composed screen, in pixels.
pub const SCREEN_WIDTH: u32 = 320;

/// Height of the composed screen, in pixels.
pub const SCREEN_HEIGHT: u32 = 200;

// ---------------------------------------------------------------------------
// ViewGeometry
// ---------------------------------------------------------------------------

/// Placement and size of the 3D player view within the screen.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ViewGeometry {
    /// A view-size change was requested; the renderer must recompute the
    /// viewport before the next draw.
    pub resize_pending: bool,
    /// Left edge of the view window.
    pub window_x: i32,
    /// Top edge of the view window.
    pub window_y: i32,
    /// Scaled width of the view in screen columns.
    pub scaled_width: u32,
    /// Height of the view in screen rows.
    pub height: u32,
}

impl Default for ViewGeometry {
    fn default() -> Self {
        Self {
            resize_pending: true,
            window_x: 0,
            window_y: 0,
            scaled_width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

impl ViewGeometry {
    /// Whether the view fills the whole screen (no status bar border).
    pub fn is_fullview(&self) -> bool {
        self.height == SCREEN_HEIGHT
    }
}

// ---------------------------------------------------------------------------
// EngineContext
// ---------------------------------------------------------------------------

/// Mutable engine state shared by the loop, compositor, and sequencer.
///
/// Created once at startup and mutated every iteration until process exit.
/// Single-threaded by contract; no locking.
#[derive(Debug)]
pub struct EngineContext {
    /// The active presentation mode.
    pub screen_state: ScreenState,
    /// Shadow copy of the previously composed screen state. A wipe is
    /// initiated iff this differs from `screen_state` when composition
    /// starts; set to [`ScreenState::Unknown`] to force one.
    pub wipe_state: ScreenState,
    /// Mirror of the simulation stepper's tick counter, refreshed each
    /// iteration. Zero means the simulation has not produced a tick since
    /// state entry, so there is nothing to draw for the level yet.
    pub game_tick: Ticks,
    /// Gameplay is paused.
    pub paused: bool,
    /// A user game is in progress (saving/ending is meaningful).
    pub user_game: bool,
    /// A deferred game action (load, new game, ...) is pending in the
    /// simulation layer. Cleared whenever the sequencer takes over.
    pub pending_action: bool,
    /// Startup has completed and the main loop is running. Gates input
    /// dispatch and the end-of-run text screen.
    pub main_loop_started: bool,
    /// Drawing globally disabled (headless/profiling runs).
    pub draw_disabled: bool,
    /// Cheat-free bookkeeping is suspended for this session.
    pub cheats_engaged: bool,
    /// Current view placement.
    pub view: ViewGeometry,
}

impl EngineContext {
    /// Create a fresh context in the pre-composition sentinel state.
    pub fn new() -> Self {
        Self {
            screen_state: ScreenState::Unknown,
            wipe_state: ScreenState::Unknown,
            game_tick: 0,
            paused: false,
            user_game: false,
            pending_action: false,
            main_loop_started: false,
            draw_disabled: false,
            cheats_engaged: false,
            view: ViewGeometry::default(),
        }
    }

    /// Force a wipe transition on the next composition regardless of
    /// whether the screen state changes.
    pub fn force_wipe(&mut self) {
        self.wipe_state = ScreenState::Unknown;
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
