//! The main loop: one iteration pipeline, repeated until process exit.
//!
//! Each iteration: record timing, run frame-synchronous IO, drain and
//! dispatch input, run at least one simulation step (ticking the demo
//! sequencer on demo-screen steps), update positional audio, compose the
//! display (including any blocking wipe), then optionally defer to honor
//! the frame cap. The loop never returns except through the process
//! termination path, which runs the registered exit hooks and optionally
//! shows the end-of-run text screen first.

use std::ops::ControlFlow;

use ashlight_core::context::EngineContext;
use ashlight_core::dispatch::{DispatchGate, GameResponder, dispatch};
use ashlight_core::event::{InputEvent, InputQueue};
use ashlight_core::options::StartupOptions;
use ashlight_core::screen::ScreenState;
use ashlight_core::subsystem::{
    AudioMixer, AutomapView, FinaleView, FrontendOverlay, HudView, IntermissionView, LumpCategory,
    LumpSource, MenuSystem, PlayerViewRenderer, SimulationStepper, StatusBarView, VideoBackend,
};
use ashlight_core::tick::{TICRATE, Ticks};
use ashlight_core::timing::{Clock, Idler, TimingGovernor};
use ashlight_data::VersionDescriptor;

use crate::compositor::{Collaborators, DisplayCompositor};
use crate::sequencer::{DemoSequencer, SequenceAction};

/// Lump shown on the end-of-run text screen.
pub const END_TEXT_LUMP: &str = "ENDTEXT";

/// Exit-screen duration used when the platform (rather than the menu)
/// asks to quit.
pub const DEFAULT_QUIT_TICS: Ticks = 3 * TICRATE;

// ---------------------------------------------------------------------------
// Subsystems and exit hooks
// ---------------------------------------------------------------------------

/// The boxed external collaborators the loop owns.
pub struct Subsystems {
    pub stepper: Box<dyn SimulationStepper>,
    pub game: Box<dyn GameResponder>,
    pub menu: Box<dyn MenuSystem>,
    pub overlay: Box<dyn FrontendOverlay>,
    pub audio: Box<dyn AudioMixer>,
    pub video: Box<dyn VideoBackend>,
    pub status_bar: Box<dyn StatusBarView>,
    pub automap: Box<dyn AutomapView>,
    pub hud: Box<dyn HudView>,
    pub view: Box<dyn PlayerViewRenderer>,
    pub intermission: Box<dyn IntermissionView>,
    pub finale: Box<dyn FinaleView>,
    pub lumps: Box<dyn LumpSource>,
}

/// A requested process termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRequest {
    pub code: i32,
}

impl ExitRequest {
    /// Normal shutdown through the quit sequence.
    pub fn clean() -> Self {
        Self { code: 0 }
    }
}

/// Work that must run during shutdown (config persistence, demo status).
pub trait ExitHook {
    fn on_exit(&mut self, ctx: &EngineContext);
}

/// Abort startup with a diagnostic. Fatal resource errors have no
/// recovery path; nothing is unwound.
pub fn fatal_startup_error(error: impl std::fmt::Display) -> ! {
    tracing::error!(%error, "startup failed");
    eprintln!("startup failed: {error}");
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// Quit interception
// ---------------------------------------------------------------------------

/// Wraps the game responder to notice platform quit events on their way
/// through the normal dispatch order.
struct QuitCatcher<'a> {
    inner: &'a mut dyn GameResponder,
    quit_requested: &'a mut bool,
}

impl GameResponder for QuitCatcher<'_> {
    fn respond(&mut self, event: &InputEvent) -> bool {
        if matches!(event, InputEvent::Quit) {
            *self.quit_requested = true;
        }
        self.inner.respond(event)
    }
}

// ---------------------------------------------------------------------------
// MainLoop
// ---------------------------------------------------------------------------

/// Composes the whole engine, one iteration at a time.
pub struct MainLoop<C: Clock, I: Idler> {
    ctx: EngineContext,
    options: StartupOptions,
    descriptor: VersionDescriptor,
    queue: InputQueue,
    governor: TimingGovernor<C, I>,
    compositor: DisplayCompositor,
    sequencer: DemoSequencer,
    subsystems: Subsystems,
    exit_hooks: Vec<Box<dyn ExitHook>>,
}

impl<C: Clock, I: Idler> MainLoop<C, I> {
    pub fn new(
        options: StartupOptions,
        descriptor: VersionDescriptor,
        netgame: bool,
        governor: TimingGovernor<C, I>,
        subsystems: Subsystems,
    ) -> Self {
        let mut ctx = EngineContext::new();
        ctx.cheats_engaged = options.engages_cheats(netgame);
        let sequencer = DemoSequencer::new(descriptor.demo_version);
        Self {
            ctx,
            options,
            descriptor,
            queue: InputQueue::new(),
            governor,
            compositor: DisplayCompositor::new(),
            sequencer,
            subsystems,
            exit_hooks: Vec::new(),
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn descriptor(&self) -> &VersionDescriptor {
        &self.descriptor
    }

    pub fn sequencer(&self) -> &DemoSequencer {
        &self.sequencer
    }

    /// Where the platform layer posts input events.
    pub fn queue_mut(&mut self) -> &mut InputQueue {
        &mut self.queue
    }

    /// Register shutdown work; hooks run in registration order.
    pub fn register_exit_hook(&mut self, hook: Box<dyn ExitHook>) {
        self.exit_hooks.push(hook);
    }

    /// Apply the startup policy: warp/demo/load go straight to gameplay,
    /// everything else enters the title sequence.
    pub fn start(&mut self) {
        if self.options.autostart() {
            self.ctx.main_loop_started = true;
        } else {
            let action = self.sequencer.start(
                &mut self.ctx,
                self.subsystems.audio.as_mut(),
                self.subsystems.menu.as_mut(),
            );
            debug_assert_eq!(action, SequenceAction::Continue);
        }
    }

    /// Enter the quit sub-sequence with the given exit-screen duration.
    pub fn request_quit(&mut self, tics: Ticks) {
        self.sequencer.request_quit(
            tics,
            &mut self.ctx,
            self.subsystems.audio.as_mut(),
            self.subsystems.menu.as_mut(),
        );
    }

    /// Whether the platform should capture the mouse pointer: only during
    /// live level play, never in menus, pause, demo playback, or startup.
    pub fn should_grab_mouse(&self) -> bool {
        if self.options.drone {
            return false;
        }
        if self.subsystems.menu.is_active() || self.ctx.paused {
            return false;
        }
        self.ctx.screen_state == ScreenState::Level && self.options.play_demo.is_none()
    }

    /// One full iteration of the pipeline. `Break` means the process must
    /// terminate; composition for this iteration has fully completed
    /// (wipe included) when this returns.
    pub fn run_iteration(&mut self) -> ControlFlow<ExitRequest> {
        self.governor.begin_iteration();

        // Frame-synchronous IO.
        self.subsystems.video.start_frame();

        // Drain and dispatch (or discard) queued input.
        let gate = DispatchGate {
            startup_complete: self.ctx.main_loop_started,
            overlay_active: self.subsystems.overlay.is_active(),
        };
        let mut quit_requested = false;
        {
            let mut catcher = QuitCatcher {
                inner: self.subsystems.game.as_mut(),
                quit_requested: &mut quit_requested,
            };
            dispatch(
                &mut self.queue,
                gate,
                self.subsystems.menu.as_mut(),
                &mut catcher,
            );
        }
        if quit_requested {
            self.request_quit(DEFAULT_QUIT_TICS);
        }

        // Run at least one simulation step.
        let steps = self.governor.run_steps(self.subsystems.stepper.as_mut());
        self.ctx.game_tick = self.subsystems.stepper.current_tick();

        // The demo sequencer is paced by simulation steps while a demo
        // page is up.
        if self.ctx.screen_state == ScreenState::DemoScreen {
            for _ in 0..steps {
                let action = self.sequencer.tick(
                    &mut self.ctx,
                    self.subsystems.audio.as_mut(),
                    self.subsystems.menu.as_mut(),
                );
                if action == SequenceAction::Terminate {
                    return ControlFlow::Break(ExitRequest::clean());
                }
                if self.ctx.screen_state != ScreenState::DemoScreen {
                    break;
                }
            }
        }

        // Move positional sounds.
        self.subsystems.audio.update_positions();

        // Compose the display, wiping if the screen state changed.
        let subsystems = &mut self.subsystems;
        let mut collab = Collaborators {
            video: subsystems.video.as_mut(),
            menu: subsystems.menu.as_mut(),
            overlay: subsystems.overlay.as_mut(),
            status_bar: subsystems.status_bar.as_mut(),
            automap: subsystems.automap.as_mut(),
            hud: subsystems.hud.as_mut(),
            view: subsystems.view.as_mut(),
            intermission: subsystems.intermission.as_mut(),
            finale: subsystems.finale.as_mut(),
        };
        self.compositor
            .compose(&mut self.ctx, &self.sequencer, &mut collab, &mut self.governor);

        // Cap the frame rate when interpolating.
        while self.governor.cap_if_needed() {}

        ControlFlow::Continue(())
    }

    /// Run forever. Returns only by terminating the process.
    pub fn run(mut self) -> ! {
        loop {
            if let ControlFlow::Break(exit) = self.run_iteration() {
                self.shutdown(exit);
            }
        }
    }

    /// Run the exit hooks and the optional end-of-run text screen. Public
    /// so embedders with their own termination path can reuse it.
    pub fn prepare_shutdown(&mut self) {
        for hook in &mut self.exit_hooks {
            hook.on_exit(&self.ctx);
        }
        self.show_end_screen_if_configured();
    }

    /// Terminate the process. Does not unwind in-progress state.
    pub fn shutdown(mut self, exit: ExitRequest) -> ! {
        self.prepare_shutdown();
        std::process::exit(exit.code);
    }

    fn show_end_screen_if_configured(&mut self) {
        if !self.options.show_end_screen
            || !self.ctx.main_loop_started
            || self.options.screensaver
            || self.options.test_controls
        {
            return;
        }
        if let Some(lump) = self
            .subsystems
            .lumps
            .cache_lump(END_TEXT_LUMP, LumpCategory::Persist)
        {
            self.subsystems.video.show_end_text(&lump);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        AdvancingIdler, CountingStepper, ManualClock, MemoryLumps, RecordingAudio, SharedGame,
        SharedVideo, StubAutomap, StubFinale, StubHud, StubIntermission, StubMenu, StubOverlay,
        StubStatusBar, StubView, VideoOp,
    };
    use ashlight_core::event::KeyCode;
    use ashlight_core::timing::FrameBudget;
    use ashlight_data::{Edition, Revision, VersionDescriptor};

    fn descriptor(demo_version: bool) -> VersionDescriptor {
        VersionDescriptor {
            edition: if demo_version {
                Edition::Demo
            } else {
                Edition::Full
            },
            registered: !demo_version,
            demo_version,
            revision: Revision::default(),
            archives: Vec::new(),
            voices_enabled: true,
            force_text_dialog: false,
        }
    }

    struct Rig {
        main_loop: MainLoop<ManualClock, AdvancingIdler>,
        video: SharedVideo,
        game: SharedGame,
    }

    fn make_rig(options: StartupOptions) -> Rig {
        let video = SharedVideo::new();
        let game = SharedGame::new();
        let subsystems = Subsystems {
            stepper: Box::new(CountingStepper::new(1)),
            game: Box::new(game.clone()),
            menu: Box::new(StubMenu::new()),
            overlay: Box::new(StubOverlay::default()),
            audio: Box::new(RecordingAudio::new()),
            video: Box::new(video.clone()),
            status_bar: Box::new(StubStatusBar::default()),
            automap: Box::new(StubAutomap::default()),
            hud: Box::new(StubHud::default()),
            view: Box::new(StubView::default()),
            intermission: Box::new(StubIntermission::default()),
            finale: Box::new(StubFinale::default()),
            lumps: Box::new(MemoryLumps::new()),
        };
        let clock = ManualClock::new();
        let idler = AdvancingIdler::for_clock(&clock);
        let governor = TimingGovernor::new(clock, idler, FrameBudget::default());
        Rig {
            main_loop: MainLoop::new(options, descriptor(false), false, governor, subsystems),
            video,
            game,
        }
    }

    #[test]
    fn start_without_autostart_enters_the_title() {
        let mut rig = make_rig(StartupOptions::default());
        rig.main_loop.start();

        assert!(rig.main_loop.context().main_loop_started);
        assert_eq!(
            rig.main_loop.context().screen_state,
            ScreenState::DemoScreen
        );
        assert_eq!(
            rig.main_loop.sequencer().page(),
            Some(crate::sequencer::TITLE_PAGE)
        );
    }

    #[test]
    fn autostart_skips_the_demo_cycle() {
        let mut rig = make_rig(StartupOptions {
            warp: Some(4),
            ..Default::default()
        });
        rig.main_loop.start();

        assert!(rig.main_loop.context().main_loop_started);
        // No sequencer step was applied.
        assert_eq!(rig.main_loop.sequencer().page(), None);
        assert!(rig.main_loop.context().cheats_engaged);
    }

    #[test]
    fn iteration_runs_the_pipeline_in_order() {
        let mut rig = make_rig(StartupOptions::default());
        rig.main_loop.start();

        let flow = rig.main_loop.run_iteration();

        assert_eq!(flow, ControlFlow::Continue(()));
        let ops = rig.video.ops();
        assert_eq!(ops.first(), Some(&VideoOp::StartFrame));
        assert_eq!(ops.last(), Some(&VideoOp::Finish));
        assert!(rig.main_loop.context().game_tick > 0);
        assert_eq!(
            rig.main_loop.context().wipe_state,
            ScreenState::DemoScreen
        );
    }

    #[test]
    fn platform_quit_event_enters_the_exit_sequence() {
        let mut rig = make_rig(StartupOptions::default());
        rig.main_loop.start();
        rig.main_loop.run_iteration();

        rig.main_loop.queue_mut().push(InputEvent::Quit);

        let mut exited = None;
        for _ in 0..(DEFAULT_QUIT_TICS + 50) {
            if let ControlFlow::Break(exit) = rig.main_loop.run_iteration() {
                exited = Some(exit);
                break;
            }
        }

        assert_eq!(exited, Some(ExitRequest::clean()));
        assert!(
            rig.video
                .pages()
                .iter()
                .any(|page| page == crate::sequencer::EXIT_PAGE)
        );
    }

    #[test]
    fn key_events_are_suppressed_until_startup_completes() {
        let mut rig = make_rig(StartupOptions::default());
        // No start(): startup is not complete.
        rig.main_loop.queue_mut().push(InputEvent::KeyDown(KeyCode(3)));
        rig.main_loop.run_iteration();

        assert!(rig.main_loop.queue_mut().is_empty());
        assert!(rig.game.seen().is_empty());
    }

    fn with_end_lump(rig: &mut Rig) {
        let mut lumps = MemoryLumps::new();
        lumps.insert(END_TEXT_LUMP, vec![7; 4000]);
        rig.main_loop.subsystems.lumps = Box::new(lumps);
    }

    #[test]
    fn end_screen_gated_on_config_and_started_loop() {
        let configured = StartupOptions {
            show_end_screen: true,
            ..Default::default()
        };

        // Configured on, loop started, lump present: shown.
        let mut rig = make_rig(configured.clone());
        with_end_lump(&mut rig);
        rig.main_loop.start();
        rig.main_loop.prepare_shutdown();
        assert!(rig.video.ops().contains(&VideoOp::EndText));

        // Loop never started: not shown.
        let mut rig = make_rig(configured);
        with_end_lump(&mut rig);
        rig.main_loop.prepare_shutdown();
        assert!(!rig.video.ops().contains(&VideoOp::EndText));

        // Config off: not shown.
        let mut rig = make_rig(StartupOptions::default());
        with_end_lump(&mut rig);
        rig.main_loop.start();
        rig.main_loop.prepare_shutdown();
        assert!(!rig.video.ops().contains(&VideoOp::EndText));
    }

    struct FlagHook(std::rc::Rc<std::cell::Cell<bool>>);

    impl ExitHook for FlagHook {
        fn on_exit(&mut self, _ctx: &EngineContext) {
            self.0.set(true);
        }
    }

    #[test]
    fn exit_hooks_run_at_shutdown() {
        let mut rig = make_rig(StartupOptions::default());
        let ran = std::rc::Rc::new(std::cell::Cell::new(false));
        rig.main_loop.register_exit_hook(Box::new(FlagHook(ran.clone())));

        rig.main_loop.prepare_shutdown();

        assert!(ran.get());
    }

    #[test]
    fn mouse_grab_only_during_live_level_play() {
        let mut rig = make_rig(StartupOptions::default());
        rig.main_loop.start();
        // Demo screen: no grab.
        assert!(!rig.main_loop.should_grab_mouse());

        rig.main_loop.ctx.screen_state = ScreenState::Level;
        assert!(rig.main_loop.should_grab_mouse());

        rig.main_loop.ctx.paused = true;
        assert!(!rig.main_loop.should_grab_mouse());
        rig.main_loop.ctx.paused = false;
        assert!(rig.main_loop.should_grab_mouse());

        let mut playback = make_rig(StartupOptions {
            play_demo: Some("run1".into()),
            ..Default::default()
        });
        playback.main_loop.ctx.screen_state = ScreenState::Level;
        assert!(!playback.main_loop.should_grab_mouse());
    }
}
