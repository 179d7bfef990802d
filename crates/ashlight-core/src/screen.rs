//! Top-level screen states.

// ---------------------------------------------------------------------------
// ScreenState
// ---------------------------------------------------------------------------

/// The mutually exclusive top-level presentation modes. Exactly one is
/// active after any completed composition.
///
/// `Unknown` is the sentinel value before the first composition. Assigning
/// it to the wipe shadow state forces a wipe transition on the next draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScreenState {
    /// Active gameplay: 3D view or automap plus the status bar.
    Level,
    /// Between-level summary screen.
    Intermission,
    /// End-of-campaign finale presentation.
    Finale,
    /// Non-interactive demo/title/intro pages driven by the sequencer.
    DemoScreen,
    /// Sentinel: nothing has been composed yet, or a wipe is being forced.
    Unknown,
}

impl Default for ScreenState {
    fn default() -> Self {
        ScreenState::Unknown
    }
}
