//! Collaborator contracts for the external subsystems.
//!
//! The renderer, audio mixer, menu, simulation, and archive layers are
//! specified only at this boundary: narrow synchronous calls (draw, tick,
//! query, query-whether-active). Each trait is implemented by the embedding
//! application; this core owns the orchestration, never the internals.

use std::sync::Arc;

use crate::context::{SCREEN_HEIGHT, SCREEN_WIDTH, ViewGeometry};
use crate::dispatch::MenuResponder;
use crate::tick::Ticks;

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// The external fixed-rate simulation stepper.
///
/// Owns the tick counter. `run_pending` executes as many fixed-rate steps
/// as wall time currently allows and returns how many ran; the timing
/// governor re-invokes it until at least one step has run per iteration.
pub trait SimulationStepper {
    fn run_pending(&mut self) -> u64;
    fn current_tick(&self) -> Ticks;
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Music selections the presentation layer can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCue {
    /// Title-screen theme.
    Title,
    /// Intro slideshow underscore.
    Intro,
    /// Back-story scroll underscore.
    Story,
    /// Exit-screen sting.
    Exit,
}

/// One-shot sound effects the presentation layer can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Sentry powering up at the start of the intro cinematic.
    SentryActivate,
    /// Played once when the startup intro completes.
    IntroFinale,
}

/// Audio mixing and playback collaborator.
pub trait AudioMixer {
    /// Start a music cue from the beginning.
    fn start_music(&mut self, cue: MusicCue);
    /// Switch to a music cue, optionally looping.
    fn change_music(&mut self, cue: MusicCue, looping: bool);
    /// Fire a one-shot sound effect.
    fn start_sound(&mut self, cue: SoundCue);
    /// Begin playback of a named voice lump. No-op when voices are disabled.
    fn start_voice(&mut self, lump: &str);
    /// Move positional sounds to follow the listener. Called every iteration.
    fn update_positions(&mut self);
}

// ---------------------------------------------------------------------------
// Video backend
// ---------------------------------------------------------------------------

/// An owned snapshot of the composed screen, one palette index per pixel.
/// Captured by the video backend for the wipe transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCapture {
    data: Vec<u8>,
}

impl FrameCapture {
    /// A black frame.
    pub fn new() -> Self {
        Self {
            data: vec![0; (SCREEN_WIDTH * SCREEN_HEIGHT) as usize],
        }
    }

    /// Wrap raw pixel data. Length must be `SCREEN_WIDTH * SCREEN_HEIGHT`.
    pub fn from_data(data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (SCREEN_WIDTH * SCREEN_HEIGHT) as usize);
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Default for FrameCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// The drawing surface and presentation collaborator.
///
/// Buffered drawing accumulates until `finish_update` presents the frame
/// (page flip or blit). Capture/present support the wipe transition.
pub trait VideoBackend {
    /// Frame-synchronous IO at the top of an iteration.
    fn start_frame(&mut self);
    /// Push buffered drawing to the output surface without presenting.
    fn blit_buffered(&mut self);
    /// Present the frame (page flip or blit buffer).
    fn finish_update(&mut self);
    /// Snapshot the current composed frame.
    fn capture_frame(&mut self) -> FrameCapture;
    /// Replace the composed frame with a captured/blended snapshot.
    fn present_capture(&mut self, frame: &FrameCapture);
    /// Restore the default palette.
    fn reset_palette(&mut self);
    /// Draw a full-screen background page by lump name.
    fn draw_page(&mut self, lump: &str);
    /// Draw a patch lump at the given position.
    fn draw_patch(&mut self, lump: &str, x: i32, y: i32);
    /// Blit a raw pixel block at the given position.
    fn draw_block(&mut self, x: i32, y: i32, w: u32, h: u32, pixels: &[u8]);
    /// Fill a rectangle with a solid palette color.
    fn fill_box(&mut self, x: i32, y: i32, w: u32, h: u32, color: u8);
    /// Draw small menu-font text.
    fn draw_text(&mut self, x: i32, y: i32, text: &str);
    /// Draw large title-font text.
    fn draw_big_text(&mut self, x: i32, y: i32, text: &str);
    /// Display the end-of-run text screen from its lump data. Called at
    /// most once, during shutdown.
    fn show_end_text(&mut self, lump: &[u8]);
}

// ---------------------------------------------------------------------------
// Menu and overlay
// ---------------------------------------------------------------------------

/// The modal in-game menu. Draws on top of everything, including wipes.
pub trait MenuSystem: MenuResponder {
    /// Whether the menu is currently open.
    fn is_active(&self) -> bool;
    /// Whether a help screen is currently showing.
    fn in_help_screens(&self) -> bool;
    /// Draw the menu if open. Safe to call when closed.
    fn draw(&mut self);
    /// Close the menu immediately (used by the exit sequence).
    fn close(&mut self);
}

/// The full-screen in-engine options overlay. While active it exclusively
/// owns input and drawing for the iteration.
pub trait FrontendOverlay {
    fn is_active(&self) -> bool;
    fn draw(&mut self);
}

// ---------------------------------------------------------------------------
// Per-state drawers
// ---------------------------------------------------------------------------

/// Status bar drawing plus the popup/HUD panels layered above it.
pub trait StatusBarView {
    /// Draw the status bar. `fullview` selects the overlay variant drawn
    /// over a full-height view; `force_redraw` repaints the whole bar.
    fn draw(&mut self, fullview: bool, force_redraw: bool);
    /// Draw any active popup panels. Returns whether one is showing, which
    /// the compositor uses to schedule border cleanup on dismissal.
    fn draw_popups(&mut self) -> bool;
}

/// Overhead automap drawing.
pub trait AutomapView {
    fn is_active(&self) -> bool;
    fn draw(&mut self);
}

/// Heads-up messages layered over the player view.
pub trait HudView {
    /// Erase the previous frame's HUD text from the border region.
    fn erase(&mut self);
    fn draw(&mut self);
}

/// The first-person player view renderer.
pub trait PlayerViewRenderer {
    /// Recompute the viewport from a changed view geometry. Must clear
    /// `resize_pending`.
    fn apply_view_size(&mut self, view: &mut ViewGeometry);
    /// Render the 3D/2D player view directly to the output surface.
    fn render_view(&mut self);
    /// Paint the background pattern into the back screen.
    fn fill_back_screen(&mut self);
    /// Repaint the border region around a reduced-size view.
    fn draw_border(&mut self);
}

/// Between-level summary screen drawing.
pub trait IntermissionView {
    fn draw(&mut self);
}

/// Finale presentation drawing.
pub trait FinaleView {
    fn draw(&mut self);
}

// ---------------------------------------------------------------------------
// Archive lumps
// ---------------------------------------------------------------------------

/// Cache lifetime requested for a fetched lump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LumpCategory {
    /// Keep for the process lifetime (startup art, end screen text).
    Persist,
    /// May be evicted under memory pressure and re-fetched later.
    Evictable,
}

/// Named data lump lookup over the active resource namespace.
pub trait LumpSource {
    /// Fetch a lump by name. `None` when absent.
    fn cache_lump(&mut self, name: &str, category: LumpCategory) -> Option<Arc<[u8]>>;
    /// Whether a lump exists, without fetching it.
    fn contains(&self, name: &str) -> bool;
}
