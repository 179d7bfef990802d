//! Shared test stubs for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the same
//! recording subsystems drive module tests here and the assembled-engine
//! scenarios in the integration-tests crate.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use ashlight_core::context::ViewGeometry;
use ashlight_core::dispatch::{GameResponder, MenuResponder};
use ashlight_core::event::InputEvent;
use ashlight_core::subsystem::{
    AudioMixer, AutomapView, FinaleView, FrameCapture, FrontendOverlay, HudView,
    IntermissionView, LumpCategory, LumpSource, MenuSystem, MusicCue, PlayerViewRenderer,
    SimulationStepper, SoundCue, StatusBarView, VideoBackend,
};
use ashlight_core::tick::Ticks;
use ashlight_core::timing::{Clock, Idler};

// ===========================================================================
// Audio
// ===========================================================================

/// Everything the presentation layer asked the mixer to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Music(MusicCue),
    ChangeMusic(MusicCue, bool),
    Sound(SoundCue),
    Voice(String),
    Positions,
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub events: Vec<AudioEvent>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioMixer for RecordingAudio {
    fn start_music(&mut self, cue: MusicCue) {
        self.events.push(AudioEvent::Music(cue));
    }

    fn change_music(&mut self, cue: MusicCue, looping: bool) {
        self.events.push(AudioEvent::ChangeMusic(cue, looping));
    }

    fn start_sound(&mut self, cue: SoundCue) {
        self.events.push(AudioEvent::Sound(cue));
    }

    fn start_voice(&mut self, lump: &str) {
        self.events.push(AudioEvent::Voice(lump.to_string()));
    }

    fn update_positions(&mut self) {
        self.events.push(AudioEvent::Positions);
    }
}

// ===========================================================================
// Menu, overlay, game responder
// ===========================================================================

/// Menu stub: consumes events while `modal` is set, tracks open/close.
#[derive(Debug, Default)]
pub struct StubMenu {
    pub active: bool,
    pub help: bool,
    pub modal: bool,
    pub closed: bool,
    pub seen: Vec<InputEvent>,
    pub draw_calls: u32,
}

impl StubMenu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MenuResponder for StubMenu {
    fn respond(&mut self, event: &InputEvent) -> bool {
        self.seen.push(*event);
        self.modal
    }
}

impl MenuSystem for StubMenu {
    fn is_active(&self) -> bool {
        self.active
    }

    fn in_help_screens(&self) -> bool {
        self.help
    }

    fn draw(&mut self) {
        self.draw_calls += 1;
    }

    fn close(&mut self) {
        self.active = false;
        self.closed = true;
    }
}

#[derive(Debug, Default)]
pub struct StubOverlay {
    pub active: bool,
    pub draw_calls: u32,
}

impl FrontendOverlay for StubOverlay {
    fn is_active(&self) -> bool {
        self.active
    }

    fn draw(&mut self) {
        self.draw_calls += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingGame {
    pub seen: Vec<InputEvent>,
}

impl GameResponder for RecordingGame {
    fn respond(&mut self, event: &InputEvent) -> bool {
        self.seen.push(*event);
        true
    }
}

// ===========================================================================
// Video
// ===========================================================================

/// One recorded video-backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOp {
    StartFrame,
    Blit,
    Finish,
    Capture,
    PresentCapture,
    ResetPalette,
    Page(String),
    Patch(String, i32, i32),
    Block { x: i32, y: i32, w: u32, h: u32 },
    FillBox,
    Text(String),
    BigText(String),
    EndText,
}

/// Records every call; each capture returns a distinct flat frame so a
/// wipe between two captures has real blending work to do.
#[derive(Debug, Default)]
pub struct RecordingVideo {
    pub ops: Vec<VideoOp>,
    next_capture_fill: u8,
}

impl RecordingVideo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == VideoOp::Finish).count()
    }

    pub fn capture_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == VideoOp::Capture).count()
    }

    pub fn pages(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                VideoOp::Page(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl VideoBackend for RecordingVideo {
    fn start_frame(&mut self) {
        self.ops.push(VideoOp::StartFrame);
    }

    fn blit_buffered(&mut self) {
        self.ops.push(VideoOp::Blit);
    }

    fn finish_update(&mut self) {
        self.ops.push(VideoOp::Finish);
    }

    fn capture_frame(&mut self) -> FrameCapture {
        self.ops.push(VideoOp::Capture);
        let mut frame = FrameCapture::new();
        frame.data_mut().fill(self.next_capture_fill);
        self.next_capture_fill = self.next_capture_fill.wrapping_add(6);
        frame
    }

    fn present_capture(&mut self, _frame: &FrameCapture) {
        self.ops.push(VideoOp::PresentCapture);
    }

    fn reset_palette(&mut self) {
        self.ops.push(VideoOp::ResetPalette);
    }

    fn draw_page(&mut self, lump: &str) {
        self.ops.push(VideoOp::Page(lump.to_string()));
    }

    fn draw_patch(&mut self, lump: &str, x: i32, y: i32) {
        self.ops.push(VideoOp::Patch(lump.to_string(), x, y));
    }

    fn draw_block(&mut self, x: i32, y: i32, w: u32, h: u32, _pixels: &[u8]) {
        self.ops.push(VideoOp::Block { x, y, w, h });
    }

    fn fill_box(&mut self, _x: i32, _y: i32, _w: u32, _h: u32, _color: u8) {
        self.ops.push(VideoOp::FillBox);
    }

    fn draw_text(&mut self, _x: i32, _y: i32, text: &str) {
        self.ops.push(VideoOp::Text(text.to_string()));
    }

    fn draw_big_text(&mut self, _x: i32, _y: i32, text: &str) {
        self.ops.push(VideoOp::BigText(text.to_string()));
    }

    fn show_end_text(&mut self, _lump: &[u8]) {
        self.ops.push(VideoOp::EndText);
    }
}

/// Clonable handle around a [`RecordingVideo`] so tests can keep a view
/// into a backend that was boxed into the engine.
#[derive(Debug, Clone, Default)]
pub struct SharedVideo(pub Rc<RefCell<RecordingVideo>>);

impl SharedVideo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<VideoOp> {
        self.0.borrow().ops.clone()
    }

    pub fn op_len(&self) -> usize {
        self.0.borrow().ops.len()
    }

    /// The ops recorded since a previous `op_len` watermark. Keeps long
    /// driving loops from re-cloning the whole log every iteration.
    pub fn ops_since(&self, start: usize) -> Vec<VideoOp> {
        self.0.borrow().ops[start..].to_vec()
    }

    pub fn pages(&self) -> Vec<String> {
        self.0
            .borrow()
            .ops
            .iter()
            .filter_map(|op| match op {
                VideoOp::Page(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

impl VideoBackend for SharedVideo {
    fn start_frame(&mut self) {
        self.0.borrow_mut().start_frame();
    }

    fn blit_buffered(&mut self) {
        self.0.borrow_mut().blit_buffered();
    }

    fn finish_update(&mut self) {
        self.0.borrow_mut().finish_update();
    }

    fn capture_frame(&mut self) -> FrameCapture {
        self.0.borrow_mut().capture_frame()
    }

    fn present_capture(&mut self, frame: &FrameCapture) {
        self.0.borrow_mut().present_capture(frame);
    }

    fn reset_palette(&mut self) {
        self.0.borrow_mut().reset_palette();
    }

    fn draw_page(&mut self, lump: &str) {
        self.0.borrow_mut().draw_page(lump);
    }

    fn draw_patch(&mut self, lump: &str, x: i32, y: i32) {
        self.0.borrow_mut().draw_patch(lump, x, y);
    }

    fn draw_block(&mut self, x: i32, y: i32, w: u32, h: u32, pixels: &[u8]) {
        self.0.borrow_mut().draw_block(x, y, w, h, pixels);
    }

    fn fill_box(&mut self, x: i32, y: i32, w: u32, h: u32, color: u8) {
        self.0.borrow_mut().fill_box(x, y, w, h, color);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str) {
        self.0.borrow_mut().draw_text(x, y, text);
    }

    fn draw_big_text(&mut self, x: i32, y: i32, text: &str) {
        self.0.borrow_mut().draw_big_text(x, y, text);
    }

    fn show_end_text(&mut self, lump: &[u8]) {
        self.0.borrow_mut().show_end_text(lump);
    }
}

/// Clonable handle around a [`RecordingGame`].
#[derive(Debug, Clone, Default)]
pub struct SharedGame(pub Rc<RefCell<RecordingGame>>);

impl SharedGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<InputEvent> {
        self.0.borrow().seen.clone()
    }
}

impl GameResponder for SharedGame {
    fn respond(&mut self, event: &InputEvent) -> bool {
        self.0.borrow_mut().respond(event)
    }
}

// ===========================================================================
// Per-state drawers
// ===========================================================================

#[derive(Debug, Default)]
pub struct StubStatusBar {
    /// (fullview, force_redraw) per draw call.
    pub draws: Vec<(bool, bool)>,
    pub popup_active: bool,
    pub popup_polls: u32,
}

impl StatusBarView for StubStatusBar {
    fn draw(&mut self, fullview: bool, force_redraw: bool) {
        self.draws.push((fullview, force_redraw));
    }

    fn draw_popups(&mut self) -> bool {
        self.popup_polls += 1;
        self.popup_active
    }
}

#[derive(Debug, Default)]
pub struct StubAutomap {
    pub active: bool,
    pub draws: u32,
}

impl AutomapView for StubAutomap {
    fn is_active(&self) -> bool {
        self.active
    }

    fn draw(&mut self) {
        self.draws += 1;
    }
}

#[derive(Debug, Default)]
pub struct StubHud {
    pub erases: u32,
    pub draws: u32,
}

impl HudView for StubHud {
    fn erase(&mut self) {
        self.erases += 1;
    }

    fn draw(&mut self) {
        self.draws += 1;
    }
}

#[derive(Debug, Default)]
pub struct StubView {
    pub applies: u32,
    pub renders: u32,
    pub back_fills: u32,
    pub border_draws: u32,
}

impl PlayerViewRenderer for StubView {
    fn apply_view_size(&mut self, view: &mut ViewGeometry) {
        view.resize_pending = false;
        self.applies += 1;
    }

    fn render_view(&mut self) {
        self.renders += 1;
    }

    fn fill_back_screen(&mut self) {
        self.back_fills += 1;
    }

    fn draw_border(&mut self) {
        self.border_draws += 1;
    }
}

#[derive(Debug, Default)]
pub struct StubIntermission {
    pub draws: u32,
}

impl IntermissionView for StubIntermission {
    fn draw(&mut self) {
        self.draws += 1;
    }
}

#[derive(Debug, Default)]
pub struct StubFinale {
    pub draws: u32,
}

impl FinaleView for StubFinale {
    fn draw(&mut self) {
        self.draws += 1;
    }
}

// ===========================================================================
// Simulation stepper
// ===========================================================================

/// Runs a fixed number of steps per poll.
#[derive(Debug)]
pub struct CountingStepper {
    pub steps_per_call: u64,
    pub tick: Ticks,
}

impl CountingStepper {
    pub fn new(steps_per_call: u64) -> Self {
        Self {
            steps_per_call,
            tick: 0,
        }
    }
}

impl SimulationStepper for CountingStepper {
    fn run_pending(&mut self) -> u64 {
        self.tick += self.steps_per_call;
        self.steps_per_call
    }

    fn current_tick(&self) -> Ticks {
        self.tick
    }
}

// ===========================================================================
// Lumps
// ===========================================================================

/// In-memory lump store.
#[derive(Debug, Default)]
pub struct MemoryLumps {
    lumps: HashMap<String, Arc<[u8]>>,
}

impl MemoryLumps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        self.lumps.insert(name.to_string(), Arc::from(data));
    }
}

impl LumpSource for MemoryLumps {
    fn cache_lump(&mut self, name: &str, _category: LumpCategory) -> Option<Arc<[u8]>> {
        self.lumps.get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.lumps.contains_key(name)
    }
}

// ===========================================================================
// Clock and idler
// ===========================================================================

/// Clock driven by a shared cell; sleeps advance it so pacing loops make
/// progress under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    pub now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now_ms: Rc::new(Cell::new(0)),
        }
    }

    pub fn handle(&self) -> Rc<Cell<u64>> {
        self.now_ms.clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// Idler that advances the shared clock instead of blocking.
#[derive(Debug)]
pub struct AdvancingIdler {
    pub now_ms: Rc<Cell<u64>>,
    pub slept_ms: u64,
}

impl AdvancingIdler {
    pub fn for_clock(clock: &ManualClock) -> Self {
        Self {
            now_ms: clock.handle(),
            slept_ms: 0,
        }
    }
}

impl Idler for AdvancingIdler {
    fn sleep_ms(&mut self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
        self.slept_ms += ms;
    }
}
