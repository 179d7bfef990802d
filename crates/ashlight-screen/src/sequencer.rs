//! The demo sequencer: the ordered, non-interactive title presentation.
//!
//! Outside active gameplay the engine cycles through a fixed sequence of
//! timed pages: title screen, intro cinematic slides with narration, the
//! back-story scroll, and credits. Negative step indices form the
//! outro/quit sub-sequence. Each step's duration, background page, and
//! audio cues live in a single table; the only control flow outside the
//! table is the shared increment rule (wrap after the last step, skip the
//! two retired slots).

use ashlight_core::context::EngineContext;
use ashlight_core::screen::ScreenState;
use ashlight_core::subsystem::{AudioMixer, MenuSystem, MusicCue, SoundCue, VideoBackend};
use ashlight_core::tick::{Ticks, secs_to_ticks};

// ---------------------------------------------------------------------------
// Pages and story text
// ---------------------------------------------------------------------------

pub const TITLE_PAGE: &str = "TITLE";
pub const DEV_LOGO_PAGE: &str = "DEVLOGO";
pub const PUBLISHER_LOGO_PAGE: &str = "PUBLOGO";
pub const CREDITS_PAGE: &str = "CREDITS";
pub const STORY_BACKDROP_PAGE: &str = "STORYBG";
pub const EXIT_PAGE: &str = "FAREWELL";

const SLIDE_PAGES: [&str; 7] = [
    "SLIDE0", "SLIDE1", "SLIDE2", "SLIDE3", "SLIDE4", "SLIDE5", "SLIDE6",
];

const STORY_TITLE: &str = "What Came Before...";

/// Back-story shown over the story backdrop, revealed a few characters at
/// a time. ASCII only; the reveal slices at byte offsets.
pub const STORY_TEXT: &str = "The ash began to fall the night the Choir's star came down \
beyond the western ridge. They called it providence, and built their bastion on the \
crater's rim. Those who breathed the ash and lived were changed, and the Choir named \
them blessed. The rest of us were set to dig.    \n\
Rumor says a resistance gathers in the quarry town of Greyhollow, trading tools for \
rifles, and you came here following that rumor. Tonight a Warden patrol has found \
your camp. They expect another tired digger.    \n\
What they don't expect is the knife you keep for situations just like this one... ";

/// Ticks of story-counter lead-in before any characters are revealed.
const REVEAL_DELAY: u64 = 10;

/// Story-counter ticks per revealed character.
const REVEAL_RATE: u64 = 3;

// ---------------------------------------------------------------------------
// Step table
// ---------------------------------------------------------------------------

/// Process-exit step.
const STEP_TERMINATE: i8 = -5;
/// Start of the quit/exit sub-sequence.
const STEP_EXIT_SCREEN: i8 = -4;
/// Title screen; the natural cycle restarts here.
const STEP_TITLE: i8 = -2;
/// Highest step id; incrementing past it wraps to [`STEP_TITLE`].
const STEP_LAST: i8 = 11;

/// Where a step's remaining-duration counter comes from.
#[derive(Debug, Clone, Copy)]
enum StepDuration {
    Ticks(Ticks),
    /// Supplied by [`DemoSequencer::request_quit`], not by the table.
    FromQuitRequest,
}

/// How the step index moves after a step's effects are applied.
#[derive(Debug, Clone, Copy)]
enum NextStep {
    /// Shared rule: increment, wrap after [`STEP_LAST`], skip the retired
    /// slots 7 and 9.
    Increment,
    Goto(i8),
    /// The exit screen branches on edition.
    ByEdition { demo: i8, full: i8 },
}

struct StepEntry {
    id: i8,
    duration: StepDuration,
    page: Option<&'static str>,
    music: Option<MusicCue>,
    /// Switch music with looping instead of starting it fresh.
    music_loops: bool,
    voice: Option<&'static str>,
    sound: Option<SoundCue>,
    close_menu: bool,
    force_wipe: bool,
    reset_story: bool,
    next: NextStep,
}

impl StepEntry {
    /// A step with no effects beyond its page and duration.
    const fn page_step(id: i8, duration: Ticks, page: &'static str) -> Self {
        Self {
            id,
            duration: StepDuration::Ticks(duration),
            page: Some(page),
            music: None,
            music_loops: false,
            voice: None,
            sound: None,
            close_menu: false,
            force_wipe: false,
            reset_story: false,
            next: NextStep::Increment,
        }
    }

    const fn music(mut self, cue: MusicCue) -> Self {
        self.music = Some(cue);
        self
    }

    const fn looping(mut self) -> Self {
        self.music_loops = true;
        self
    }

    const fn voice(mut self, lump: &'static str) -> Self {
        self.voice = Some(lump);
        self
    }

    const fn sound(mut self, cue: SoundCue) -> Self {
        self.sound = Some(cue);
        self
    }

    const fn closing_menu(mut self) -> Self {
        self.close_menu = true;
        self
    }

    const fn wiping(mut self) -> Self {
        self.force_wipe = true;
        self
    }

    const fn resetting_story(mut self) -> Self {
        self.reset_story = true;
        self
    }

    const fn quit_duration(mut self) -> Self {
        self.duration = StepDuration::FromQuitRequest;
        self
    }

    const fn then(mut self, next: NextStep) -> Self {
        self.next = next;
        self
    }
}

/// One narrated intro slide.
const fn slide(id: i8, secs: u64, voice: &'static str) -> StepEntry {
    StepEntry::page_step(id, secs_to_ticks(secs), SLIDE_PAGES[id as usize]).voice(voice)
}

const STEP_TABLE: &[StepEntry] = &[
    StepEntry::page_step(STEP_EXIT_SCREEN, 0, EXIT_PAGE)
        .quit_duration()
        .closing_menu()
        .music(MusicCue::Exit)
        .then(NextStep::ByEdition {
            demo: -3,
            full: STEP_TERMINATE,
        }),
    StepEntry::page_step(-3, secs_to_ticks(6), PUBLISHER_LOGO_PAGE)
        .then(NextStep::Goto(STEP_TERMINATE)),
    StepEntry::page_step(STEP_TITLE, secs_to_ticks(6), TITLE_PAGE)
        .music(MusicCue::Title)
        .then(NextStep::Goto(-1)),
    // Start of the intro cinematic: a short beat on the first slide while
    // the sentry powers up, then the slideshow proper.
    StepEntry::page_step(-1, 10, SLIDE_PAGES[0])
        .sound(SoundCue::SentryActivate)
        .wiping(),
    StepEntry::page_step(0, secs_to_ticks(4), DEV_LOGO_PAGE).wiping(),
    slide(1, 7, "nar1").music(MusicCue::Intro),
    slide(2, 9, "nar2"),
    slide(3, 12, "nar3"),
    slide(4, 11, "nar4"),
    slide(5, 10, "nar5"),
    slide(6, 16, "nar6"),
    StepEntry::page_step(8, secs_to_ticks(58), STORY_BACKDROP_PAGE)
        .music(MusicCue::Story)
        .looping()
        .wiping()
        .resetting_story(),
    StepEntry::page_step(10, secs_to_ticks(12), CREDITS_PAGE).wiping(),
];

/// The shared increment rule: wrap past the end, skip the retired slots.
fn next_in_cycle(step: i8) -> i8 {
    let mut next = step + 1;
    if next > STEP_LAST {
        next = STEP_TITLE;
    }
    if next == 7 || next == 9 {
        next += 1;
    }
    next
}

// ---------------------------------------------------------------------------
// DemoSequencer
// ---------------------------------------------------------------------------

/// What the caller must do after an advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceAction {
    Continue,
    /// The exit step was reached: terminate the process.
    Terminate,
}

/// Drives the non-interactive intro/demo/title presentation.
#[derive(Debug)]
pub struct DemoSequencer {
    step: i8,
    /// Remaining ticks on the current step; advances when it drops below
    /// zero.
    remaining: i64,
    /// Duration for the exit screen, supplied by `request_quit`.
    quit_tics: Ticks,
    /// Nested sub-timer for the back-story reveal. Counts every tick the
    /// story backdrop is the active page; unrelated to `remaining`.
    story_count: u64,
    page: Option<&'static str>,
    demo_version: bool,
}

impl DemoSequencer {
    pub fn new(demo_version: bool) -> Self {
        Self {
            step: STEP_TITLE,
            remaining: 0,
            quit_tics: 0,
            story_count: 0,
            page: None,
            demo_version,
        }
    }

    /// The step index the next advance will apply.
    pub fn step(&self) -> i8 {
        self.step
    }

    /// The active background page, once one has been applied.
    pub fn page(&self) -> Option<&'static str> {
        self.page
    }

    /// Remaining ticks on the current step.
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Enter the title sequence from the top.
    pub fn start(
        &mut self,
        ctx: &mut EngineContext,
        audio: &mut dyn AudioMixer,
        menu: &mut dyn MenuSystem,
    ) -> SequenceAction {
        ctx.screen_state = ScreenState::DemoScreen;
        ctx.pending_action = false;
        self.step = STEP_TITLE;
        self.advance(ctx, audio, menu)
    }

    /// Out-of-band user exit: jump into the outro sub-sequence with a
    /// caller-supplied exit-screen duration.
    pub fn request_quit(
        &mut self,
        tics: Ticks,
        ctx: &mut EngineContext,
        audio: &mut dyn AudioMixer,
        menu: &mut dyn MenuSystem,
    ) -> SequenceAction {
        ctx.pending_action = false;
        self.quit_tics = tics;
        self.step = STEP_EXIT_SCREEN;
        self.advance(ctx, audio, menu)
    }

    /// Count down the current step; advance when it expires. Ticks the
    /// story sub-timer whenever the story backdrop is active.
    pub fn tick(
        &mut self,
        ctx: &mut EngineContext,
        audio: &mut dyn AudioMixer,
        menu: &mut dyn MenuSystem,
    ) -> SequenceAction {
        self.remaining -= 1;
        let action = if self.remaining < 0 {
            self.advance(ctx, audio, menu)
        } else {
            SequenceAction::Continue
        };

        if self.page == Some(STORY_BACKDROP_PAGE) {
            self.story_count += 1;
        }

        action
    }

    /// Apply the current step's entry and move to the next step.
    pub fn advance(
        &mut self,
        ctx: &mut EngineContext,
        audio: &mut dyn AudioMixer,
        menu: &mut dyn MenuSystem,
    ) -> SequenceAction {
        // The sequencer owns the screen: no save/end game here, nothing
        // paused, no deferred action. Startup is over once it runs.
        ctx.user_game = false;
        ctx.paused = false;
        ctx.pending_action = false;
        ctx.main_loop_started = true;

        if self.step == STEP_TERMINATE {
            return SequenceAction::Terminate;
        }

        let entry = STEP_TABLE.iter().find(|entry| entry.id == self.step);

        if let Some(entry) = entry {
            tracing::debug!(step = self.step, page = ?entry.page, "demo sequence step");

            self.remaining = match entry.duration {
                StepDuration::Ticks(ticks) => ticks as i64,
                StepDuration::FromQuitRequest => self.quit_tics as i64,
            };
            ctx.screen_state = ScreenState::DemoScreen;
            self.page = entry.page;

            if entry.close_menu {
                menu.close();
            }
            if entry.force_wipe {
                ctx.force_wipe();
            }
            if entry.reset_story {
                self.story_count = 0;
            }
            if let Some(cue) = entry.music {
                if entry.music_loops {
                    audio.change_music(cue, true);
                } else {
                    audio.start_music(cue);
                }
            }
            if let Some(voice) = entry.voice {
                audio.start_voice(voice);
            }
            if let Some(cue) = entry.sound {
                audio.start_sound(cue);
            }
        }

        self.step = match entry.map(|entry| entry.next) {
            Some(NextStep::Goto(next)) => next,
            Some(NextStep::ByEdition { demo, full }) => {
                if self.demo_version {
                    demo
                } else {
                    full
                }
            }
            Some(NextStep::Increment) | None => next_in_cycle(self.step),
        };

        SequenceAction::Continue
    }

    // -----------------------------------------------------------------------
    // Story reveal
    // -----------------------------------------------------------------------

    /// How many characters of [`STORY_TEXT`] are currently revealed.
    pub fn revealed_story_chars(&self) -> usize {
        let count = self.story_count.saturating_sub(REVEAL_DELAY) / REVEAL_RATE;
        (count as usize).min(STORY_TEXT.len())
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    /// Draw the active page; on the story backdrop, also the progressively
    /// revealed story text.
    pub fn draw_page(&self, video: &mut dyn VideoBackend) {
        let Some(page) = self.page else {
            return;
        };
        video.draw_page(page);
        if page == STORY_BACKDROP_PAGE {
            video.draw_big_text(10, 6, STORY_TITLE);
            video.draw_text(10, 30, &STORY_TEXT[..self.revealed_story_chars()]);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
