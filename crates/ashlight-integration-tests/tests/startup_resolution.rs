//! Startup resolution driven end-to-end into an assembled engine.
//!
//! Resolves a version descriptor through the archive search chain, then
//! boots a `MainLoop` from it and checks the degraded-but-defined behavior
//! for a missing voice archive.

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use ashlight_core::options::StartupOptions;
use ashlight_core::timing::{FrameBudget, TimingGovernor};
use ashlight_data::{ArchiveProbe, SearchConfig, VersionError, identify};
use ashlight_screen::mainloop::{MainLoop, Subsystems};
use ashlight_screen::test_utils::{
    AdvancingIdler, CountingStepper, ManualClock, MemoryLumps, RecordingAudio, SharedGame,
    SharedVideo, StubAutomap, StubFinale, StubHud, StubIntermission, StubMenu, StubOverlay,
    StubStatusBar, StubView,
};

struct SetProbe(HashSet<PathBuf>);

impl ArchiveProbe for SetProbe {
    fn exists(&self, path: &Path) -> bool {
        self.0.contains(path)
    }
}

fn search_config() -> SearchConfig {
    SearchConfig {
        dirs: vec![PathBuf::from("/res")],
        primary_archive: Some(PathBuf::from("/games/ashlight.rpk")),
    }
}

fn probe(paths: &[&str]) -> SetProbe {
    SetProbe(paths.iter().map(PathBuf::from).collect())
}

fn subsystems(video: &SharedVideo) -> Subsystems {
    Subsystems {
        stepper: Box::new(CountingStepper::new(1)),
        game: Box::new(SharedGame::new()),
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
    }
}

#[test]
fn missing_voice_archive_boots_with_text_dialog() {
    let descriptor = identify(
        &search_config(),
        &probe(&["/res/support.rpk"]),
        Default::default(),
    )
    .expect("missing voices is not fatal");

    assert!(!descriptor.voices_enabled);
    assert!(descriptor.force_text_dialog);

    // The engine boots and runs normally on the degraded descriptor.
    let video = SharedVideo::new();
    let clock = ManualClock::new();
    let idler = AdvancingIdler::for_clock(&clock);
    let governor = TimingGovernor::new(clock, idler, FrameBudget::default());
    let mut main_loop = MainLoop::new(
        StartupOptions::default(),
        descriptor,
        false,
        governor,
        subsystems(&video),
    );
    main_loop.start();
    for _ in 0..10 {
        assert_eq!(main_loop.run_iteration(), ControlFlow::Continue(()));
    }
    assert!(!main_loop.descriptor().voices_enabled);
}

#[test]
fn missing_support_archive_is_a_fatal_startup_error() {
    let error = identify(
        &search_config(),
        &probe(&["/res/voices.rpk"]),
        Default::default(),
    )
    .expect_err("the support archive is required");

    // The caller maps this to a diagnostic abort with non-zero exit.
    assert!(matches!(
        error,
        VersionError::MissingSupportArchive { name: "support.rpk" }
    ));
}

#[test]
fn support_archive_resolves_through_the_primary_fallback() {
    let descriptor = identify(
        &search_config(),
        &probe(&["/res/voices.rpk", "/games/support.rpk"]),
        Default::default(),
    )
    .expect("fallback beside the primary archive");

    assert!(descriptor.voices_enabled);
    assert!(
        descriptor
            .archives
            .contains(&PathBuf::from("/games/support.rpk"))
    );
}
