//! The graphical startup intro: a timed cinematic over the boot screen.
//!
//! While the subsystems initialize, a sentry automaton fires a beam across
//! the lower third of the boot backdrop toward a captive standing at the
//! far right. Startup code calls [`IntroSequence::tick`] between
//! initialization stages; each call advances the beam one step and
//! repaints the scene.

use std::sync::Arc;

use ashlight_core::context::{SCREEN_HEIGHT, SCREEN_WIDTH};
use ashlight_core::subsystem::{AudioMixer, LumpCategory, LumpSource, SoundCue, VideoBackend};

/// Number of intro steps; the beam completes its sweep over these.
pub const MAX_INTRO_PROGRESS: u32 = 69;

// Boot art lumps, all persist-category.
const BACKDROP_LUMP: &str = "STARTBG";
const SENTRY_LUMP: &str = "SENTRY";
const BEAM_LUMPS: [&str; 2] = ["LASERA", "LASERB"];
const CAPTIVE_LUMPS: [&str; 4] = ["CAPTA", "CAPTB", "CAPTC", "CAPTD"];

// The backdrop strip blitted to the screen: rows 57..152 of the source
// image, drawn at (0, 41).
const BACKDROP_SRC_ROW: usize = 57;
const BACKDROP_ROWS: usize = 95;
const BACKDROP_DEST_Y: i32 = 41;

// ---------------------------------------------------------------------------
// Art
// ---------------------------------------------------------------------------

/// Raw boot art, loaded once before the first tick.
#[derive(Debug)]
pub struct IntroArt {
    backdrop: Arc<[u8]>,
    sentry: Arc<[u8]>,
    beam: [Arc<[u8]>; 2],
    captive: [Arc<[u8]>; 4],
}

impl IntroArt {
    /// Fetch every lump the intro needs. `None` if any is missing.
    pub fn load(lumps: &mut dyn LumpSource) -> Option<Self> {
        let persist = LumpCategory::Persist;
        Some(Self {
            backdrop: lumps.cache_lump(BACKDROP_LUMP, persist)?,
            sentry: lumps.cache_lump(SENTRY_LUMP, persist)?,
            beam: [
                lumps.cache_lump(BEAM_LUMPS[0], persist)?,
                lumps.cache_lump(BEAM_LUMPS[1], persist)?,
            ],
            captive: [
                lumps.cache_lump(CAPTIVE_LUMPS[0], persist)?,
                lumps.cache_lump(CAPTIVE_LUMPS[1], persist)?,
                lumps.cache_lump(CAPTIVE_LUMPS[2], persist)?,
                lumps.cache_lump(CAPTIVE_LUMPS[3], persist)?,
            ],
        })
    }
}

// ---------------------------------------------------------------------------
// IntroSequence
// ---------------------------------------------------------------------------

/// Progress state of the startup cinematic.
#[derive(Debug)]
pub struct IntroSequence {
    art: IntroArt,
    progress: u32,
    finale_sounded: bool,
}

impl IntroSequence {
    pub fn new(art: IntroArt) -> Self {
        Self {
            art,
            progress: 0,
            finale_sounded: false,
        }
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    /// The sweep has run its course.
    pub fn finished(&self) -> bool {
        self.progress >= MAX_INTRO_PROGRESS
    }

    /// Advance one startup stage and repaint.
    pub fn tick(&mut self, video: &mut dyn VideoBackend, audio: &mut dyn AudioMixer) {
        self.progress += 1;

        if self.finished() {
            // Clear the backdrop so the title screen fades in from black.
            self.draw_backdrop(video);
            if !self.finale_sounded {
                audio.start_sound(SoundCue::IntroFinale);
                self.finale_sounded = true;
            }
        } else {
            self.draw(video);
        }
    }

    /// Fill the screen and blit the backdrop strip. Past the end of the
    /// sweep only the black fill is presented.
    fn draw_backdrop(&self, video: &mut dyn VideoBackend) {
        video.fill_box(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT, 0);

        if self.finished() {
            video.finish_update();
            return;
        }

        let start = SCREEN_WIDTH as usize * BACKDROP_SRC_ROW;
        let len = SCREEN_WIDTH as usize * BACKDROP_ROWS;
        video.draw_block(
            0,
            BACKDROP_DEST_Y,
            SCREEN_WIDTH,
            BACKDROP_ROWS as u32,
            &self.art.backdrop[start..start + len],
        );
    }

    /// Repaint the whole scene for the current progress.
    pub fn draw(&self, video: &mut dyn VideoBackend) {
        self.draw_backdrop(video);

        let mut beam_x = (200 * self.progress / MAX_INTRO_PROGRESS) as i32 + 60;

        // The clamp stops the beam just short of the captive. The art has
        // no contact frames either, so the near-miss is the shipped
        // effect; keep the arithmetic as-is.
        if beam_x > 200 {
            beam_x = 200;
        }

        video.draw_block(beam_x, 156, 16, 16, &self.art.beam[(beam_x % 2) as usize]);

        // The sentry bobs with the beam's flicker.
        let bob = beam_x % 5 - 2;
        video.draw_block(14, 138 + bob, 48, 48, &self.art.sentry);

        video.draw_block(
            262,
            136,
            32,
            64,
            &self.art.captive[(beam_x % 4) as usize],
        );

        video.finish_update();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
