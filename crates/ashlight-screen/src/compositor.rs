//! The display compositor: per-state draw dispatch and partial redraws.
//!
//! `compose` runs once per iteration. It dispatches to exactly one
//! per-state draw routine, tracks what was on screen last frame so
//! transient overlays (menu, help screens, popups) get cleaned up without
//! redrawing everything every frame, and hands off to the wipe engine when
//! the screen state changed. The border repaint uses a small countdown
//! budget instead of painting every frame.

use ashlight_core::context::{EngineContext, SCREEN_WIDTH};
use ashlight_core::screen::ScreenState;
use ashlight_core::subsystem::{
    AutomapView, FinaleView, FrontendOverlay, HudView, IntermissionView, MenuSystem,
    PlayerViewRenderer, StatusBarView, VideoBackend,
};
use ashlight_core::timing::WipePacer;

use crate::sequencer::DemoSequencer;
use crate::wipe::{WIPE_TICK_GRANULARITY, WipeEngine, WipeStatus};

/// Frames of border repainting scheduled after a border-relevant change.
const BORDER_REDRAW_FRAMES: u8 = 3;

/// Pause indicator patch and its width for centering.
const PAUSE_PATCH: &str = "PAUSEPIC";
const PAUSE_PATCH_WIDTH: i32 = 68;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The draw-side collaborators a composition needs, borrowed for one call.
pub struct Collaborators<'a> {
    pub video: &'a mut dyn VideoBackend,
    pub menu: &'a mut dyn MenuSystem,
    pub overlay: &'a mut dyn FrontendOverlay,
    pub status_bar: &'a mut dyn StatusBarView,
    pub automap: &'a mut dyn AutomapView,
    pub hud: &'a mut dyn HudView,
    pub view: &'a mut dyn PlayerViewRenderer,
    pub intermission: &'a mut dyn IntermissionView,
    pub finale: &'a mut dyn FinaleView,
}

// ---------------------------------------------------------------------------
// DisplayCompositor
// ---------------------------------------------------------------------------

/// Composes the screen each iteration, carrying the cached previous-frame
/// flags that drive the partial-redraw decisions.
#[derive(Debug)]
pub struct DisplayCompositor {
    wipe: WipeEngine,
    menu_was_active: bool,
    view_was_active: bool,
    help_was_open: bool,
    popup_was_active: bool,
    was_fullview: bool,
    prev_screen_state: ScreenState,
    border_draw_count: u8,
}

impl DisplayCompositor {
    pub fn new() -> Self {
        Self {
            wipe: WipeEngine::new(),
            menu_was_active: false,
            view_was_active: false,
            help_was_open: false,
            popup_was_active: false,
            was_fullview: false,
            prev_screen_state: ScreenState::Unknown,
            border_draw_count: 0,
        }
    }

    /// Whether no wipe is pending or running. Always true between
    /// compositions; a wipe never outlives the call that started it.
    pub fn wipe_idle(&self) -> bool {
        self.wipe.is_idle()
    }

    /// Compose and present one frame of the current screen state.
    ///
    /// Blocks through the whole wipe animation when the screen state
    /// changed; composition for this iteration is complete when it
    /// returns.
    pub fn compose(
        &mut self,
        ctx: &mut EngineContext,
        sequencer: &DemoSequencer,
        collab: &mut Collaborators<'_>,
        pacer: &mut dyn WipePacer,
    ) {
        debug_assert!(self.wipe.is_idle());

        if ctx.draw_disabled {
            return; // for comparative timing / profiling
        }

        // The options overlay owns the whole screen while it is up.
        if collab.overlay.is_active() {
            collab.overlay.draw();
            return;
        }

        let mut redraw_status_bar = false;

        // Change the view size if needed.
        if ctx.view.resize_pending {
            collab.view.apply_view_size(&mut ctx.view);
            self.prev_screen_state = ScreenState::Unknown; // force background redraw
            self.border_draw_count = BORDER_REDRAW_FRAMES;
        }

        // Save the current screen if about to wipe.
        let wipe = ctx.screen_state != ctx.wipe_state;
        if wipe {
            self.wipe.capture_start(collab.video.capture_frame());
        }

        if ctx.screen_state == ScreenState::Level && ctx.game_tick > 0 {
            collab.hud.erase();
        }

        // Buffered drawing for the active state.
        match ctx.screen_state {
            ScreenState::Level => {
                if ctx.game_tick > 0 {
                    if collab.automap.is_active() {
                        collab.automap.draw();
                    }
                    if wipe || (!ctx.view.is_fullview() && self.was_fullview) {
                        redraw_status_bar = true;
                    }
                    // Also repaint if the menu was up, or a help screen
                    // was just put away.
                    if self.menu_was_active || (self.help_was_open && !collab.menu.in_help_screens())
                    {
                        redraw_status_bar = true;
                    }
                    collab
                        .status_bar
                        .draw(ctx.view.is_fullview(), redraw_status_bar);
                    self.was_fullview = ctx.view.is_fullview();
                }
            }
            ScreenState::Intermission => collab.intermission.draw(),
            ScreenState::Finale => collab.finale.draw(),
            ScreenState::DemoScreen => sequencer.draw_page(collab.video),
            ScreenState::Unknown => {}
        }

        // Draw buffered stuff to screen.
        collab.video.blit_buffered();

        // Draw the view directly.
        let mut view_rendered = false;
        if ctx.screen_state == ScreenState::Level && !collab.automap.is_active() && ctx.game_tick > 0
        {
            collab.view.render_view();
            view_rendered = true;
        }

        // Clean up border stuff.
        if ctx.screen_state != self.prev_screen_state && ctx.screen_state != ScreenState::Level {
            collab.video.reset_palette();
        }

        // See if the border needs to be initially drawn.
        if ctx.screen_state == ScreenState::Level && self.prev_screen_state != ScreenState::Level {
            self.view_was_active = false; // view was not active
            collab.view.fill_back_screen(); // draw the pattern into the back screen
        }

        // See if the border needs to be updated to the screen.
        if ctx.screen_state == ScreenState::Level
            && !collab.automap.is_active()
            && ctx.view.scaled_width != SCREEN_WIDTH
        {
            if collab.menu.is_active() || self.menu_was_active || !self.view_was_active {
                self.border_draw_count = BORDER_REDRAW_FRAMES;
                self.popup_was_active = false;
            }
            if self.border_draw_count > 0 {
                collab.view.draw_border(); // erase old menu stuff
                self.border_draw_count -= 1;
            }
        }

        self.menu_was_active = collab.menu.is_active();
        self.view_was_active = view_rendered;
        self.help_was_open = collab.menu.in_help_screens();
        self.prev_screen_state = ctx.screen_state;
        ctx.wipe_state = ctx.screen_state;

        // HUD and popups go below the pause pic and menu but after the
        // border pass, so popup dismissal can schedule border cleanup.
        if ctx.screen_state == ScreenState::Level && ctx.game_tick > 0 {
            collab.hud.draw();
            if collab.status_bar.draw_popups() {
                self.popup_was_active = true;
            } else if self.popup_was_active {
                self.popup_was_active = false;
                self.menu_was_active = true;
            }
        }

        // Draw pause pic.
        if ctx.paused {
            let y = if collab.automap.is_active() {
                4
            } else {
                ctx.view.window_y + 4
            };
            let x = ctx.view.window_x + (ctx.view.scaled_width as i32 - PAUSE_PATCH_WIDTH) / 2;
            collab.video.draw_patch(PAUSE_PATCH, x, y);
        }

        // Menus go directly to the screen, on top of everything.
        collab.menu.draw();

        // Normal update.
        if !wipe {
            collab.video.finish_update();
            return;
        }

        // Wipe update.
        self.wipe.capture_end(collab.video.capture_frame());
        self.run_wipe(collab, pacer);
    }

    /// The blocking wipe animation: wait out the tick granularity, advance
    /// the blend by the elapsed ticks, present, repeat until done. No other
    /// game logic runs until this returns.
    fn run_wipe(&mut self, collab: &mut Collaborators<'_>, pacer: &mut dyn WipePacer) {
        let mut wipe_start = pacer.now_ticks().saturating_sub(1);

        loop {
            let mut now = pacer.now_ticks();
            let mut tics = now.saturating_sub(wipe_start);
            while tics < WIPE_TICK_GRANULARITY {
                pacer.sleep_ms(1);
                now = pacer.now_ticks();
                tics = now.saturating_sub(wipe_start);
            }
            wipe_start = now;

            let status = self.wipe.advance(tics);
            if let Some(frame) = self.wipe.frame() {
                collab.video.present_capture(frame);
            }
            collab.video.blit_buffered();
            collab.menu.draw(); // menu is drawn even on top of wipes
            collab.video.finish_update();

            if status == WipeStatus::Complete {
                self.wipe.finish();
                return;
            }
        }
    }
}

impl Default for DisplayCompositor {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
