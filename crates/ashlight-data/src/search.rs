//! Archive lookup: an ordered chain of search strategies.
//!
//! Each strategy produces a candidate path for a named archive; the chain
//! returns the first candidate that exists. Adding or reordering
//! strategies is a data change, and the filesystem is behind a probe seam
//! so the chain is testable without touching disk.

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Probe seam
// ---------------------------------------------------------------------------

/// Existence check for candidate archive paths.
pub trait ArchiveProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Default)]
pub struct FsProbe;

impl ArchiveProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

// ---------------------------------------------------------------------------
// Search configuration
// ---------------------------------------------------------------------------

/// Where archives may be found.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Configured resource directories, highest priority first.
    pub dirs: Vec<PathBuf>,
    /// The explicitly-specified primary archive, if any. Bundled archives
    /// fall back to its directory when the directory search fails.
    pub primary_archive: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// One way of producing a candidate path for a named archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Try each configured resource directory in order.
    ConfiguredDirs,
    /// Try the directory containing the explicitly-specified primary
    /// archive.
    BesidePrimary,
}

/// The shipping lookup order.
pub const DEFAULT_STRATEGIES: &[SearchStrategy] =
    &[SearchStrategy::ConfiguredDirs, SearchStrategy::BesidePrimary];

impl SearchStrategy {
    /// Resolve `name` under this strategy, if it produces an existing path.
    pub fn locate(
        &self,
        name: &str,
        config: &SearchConfig,
        probe: &dyn ArchiveProbe,
    ) -> Option<PathBuf> {
        match self {
            SearchStrategy::ConfiguredDirs => config
                .dirs
                .iter()
                .map(|dir| dir.join(name))
                .find(|candidate| probe.exists(candidate)),
            SearchStrategy::BesidePrimary => {
                let primary = config.primary_archive.as_deref()?;
                let candidate = primary.parent()?.join(name);
                probe.exists(&candidate).then_some(candidate)
            }
        }
    }
}

/// Find a named archive using the default strategy chain. Returns the
/// first hit, or `None` when every strategy misses.
pub fn locate_archive(
    name: &str,
    config: &SearchConfig,
    probe: &dyn ArchiveProbe,
) -> Option<PathBuf> {
    DEFAULT_STRATEGIES
        .iter()
        .find_map(|strategy| strategy.locate(name, config, probe))
}

// ===========================================================================
// Tests
// ===========================================================================
