//! Edition identification and bundled-archive resolution.
//!
//! Runs once at startup, before the first main-loop iteration. The
//! resulting [`VersionDescriptor`] is immutable for the process lifetime;
//! re-identification mid-run is not supported.

use std::path::PathBuf;

use ashlight_core::subsystem::LumpSource;

use crate::error::VersionError;
use crate::search::{ArchiveProbe, SearchConfig, locate_archive};

/// The optional bundled voice archive.
pub const VOICE_ARCHIVE: &str = "voices.rpk";

/// The required bundled support archive.
pub const SUPPORT_ARCHIVE: &str = "support.rpk";

/// Compatibility lumps that must exist in the primary archive before
/// third-party content may be loaded on the full edition.
pub const COMPAT_LUMPS: [&str; 3] = ["area23", "area30", "WARDA1"];

// Marker lumps indicating replaced sprites or flats in loaded archives.
const SPRITE_MARKER: &str = "SP_BEGIN";
const FLAT_MARKER: &str = "TX_END";

// ---------------------------------------------------------------------------
// Descriptor types
// ---------------------------------------------------------------------------

/// Which edition of the game is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Edition {
    /// The full retail edition.
    Full,
    /// The free demo edition.
    Demo,
}

/// Which historical engine revision is being emulated. The differences are
/// minor; the earlier revision mainly restores its save-slot restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Revision {
    V12,
    V131,
}

impl Default for Revision {
    fn default() -> Self {
        Revision::V131
    }
}

/// The resolved game edition and resource configuration.
///
/// Computed once by [`identify`]; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VersionDescriptor {
    pub edition: Edition,
    /// The full edition's content is present.
    pub registered: bool,
    /// Running the demo edition (changes the exit sequence branch).
    pub demo_version: bool,
    pub revision: Revision,
    /// Archives to merge into the active resource namespace, in load order.
    pub archives: Vec<PathBuf>,
    /// Voice playback is available.
    pub voices_enabled: bool,
    /// Dialog must be shown as text (set whenever voices are unavailable).
    pub force_text_dialog: bool,
}

// ---------------------------------------------------------------------------
// Missing-archive policy table
// ---------------------------------------------------------------------------

/// What a failed archive lookup means. Classification lives here, in the
/// table, not at call sites.
#[derive(Debug, Clone, Copy)]
enum MissingPolicy {
    /// Continue without voice playback; dialog falls back to text.
    DisableVoices,
    /// Required content: abort startup.
    Fatal,
}

struct ArchivePolicy {
    name: &'static str,
    missing: MissingPolicy,
}

const ARCHIVE_POLICY: &[ArchivePolicy] = &[
    ArchivePolicy {
        name: VOICE_ARCHIVE,
        missing: MissingPolicy::DisableVoices,
    },
    ArchivePolicy {
        name: SUPPORT_ARCHIVE,
        missing: MissingPolicy::Fatal,
    },
];

// ---------------------------------------------------------------------------
// Identification
// ---------------------------------------------------------------------------

/// Determine the active edition and resolve the bundled archives.
///
/// This title needs no multi-archive disambiguation: the edition flags are
/// fixed and the primary archive is taken as present. Each bundled archive
/// is looked up exactly once through the search chain; a missing voice
/// archive is soft (voices off, text dialog on), a missing support archive
/// is fatal.
pub fn identify(
    config: &SearchConfig,
    probe: &dyn ArchiveProbe,
    revision: Revision,
) -> Result<VersionDescriptor, VersionError> {
    let mut descriptor = VersionDescriptor {
        edition: Edition::Full,
        registered: true,
        demo_version: false,
        revision,
        archives: Vec::new(),
        voices_enabled: true,
        force_text_dialog: false,
    };

    if let Some(primary) = &config.primary_archive {
        descriptor.archives.push(primary.clone());
    }

    if !descriptor.registered {
        return Ok(descriptor);
    }

    for policy in ARCHIVE_POLICY {
        match locate_archive(policy.name, config, probe) {
            Some(path) => {
                tracing::info!(archive = %path.display(), "adding archive");
                descriptor.archives.push(path);
            }
            None => match policy.missing {
                MissingPolicy::DisableVoices => {
                    tracing::warn!(
                        archive = policy.name,
                        "voice archive not found; voices disabled, dialog shown as text"
                    );
                    descriptor.voices_enabled = false;
                    descriptor.force_text_dialog = true;
                }
                MissingPolicy::Fatal => {
                    return Err(VersionError::MissingSupportArchive { name: policy.name });
                }
            },
        }
    }

    Ok(descriptor)
}

// ---------------------------------------------------------------------------
// Compatibility verification
// ---------------------------------------------------------------------------

/// Check third-party content against the resolved edition.
///
/// Replaced sprite/flat markers only warn; loading extra archives on the
/// demo edition, or on a primary archive missing the compatibility lumps,
/// is fatal.
pub fn verify_compatibility(
    descriptor: &VersionDescriptor,
    modified: bool,
    lumps: &dyn LumpSource,
) -> Result<(), VersionError> {
    if lumps.contains(SPRITE_MARKER) || lumps.contains(FLAT_MARKER) {
        tracing::warn!(
            "loaded archives contain modified sprites or flats; expect sprite/texture conflicts"
        );
    }

    if !modified {
        return Ok(());
    }

    if descriptor.demo_version {
        return Err(VersionError::ModifiedDemoEdition);
    }

    if descriptor.registered {
        for lump in COMPAT_LUMPS {
            if !lumps.contains(lump) {
                return Err(VersionError::NotFullEdition { lump });
            }
        }
    }

    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ashlight_core::subsystem::LumpCategory;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Arc;

    struct SetProbe(HashSet<PathBuf>);

    impl ArchiveProbe for SetProbe {
        fn exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
    }

    fn probe_with(paths: &[&str]) -> SetProbe {
        SetProbe(paths.iter().map(PathBuf::from).collect())
    }

    fn config() -> SearchConfig {
        SearchConfig {
            dirs: vec![PathBuf::from("/res")],
            primary_archive: Some(PathBuf::from("/games/ashlight.rpk")),
        }
    }

    struct FakeLumps(HashSet<&'static str>);

    impl LumpSource for FakeLumps {
        fn cache_lump(&mut self, name: &str, _category: LumpCategory) -> Option<Arc<[u8]>> {
            self.0.contains(name).then(|| Arc::from(&b"lump"[..]))
        }

        fn contains(&self, name: &str) -> bool {
            self.0.contains(name)
        }
    }

    #[test]
    fn all_archives_present() {
        let descriptor = identify(
            &config(),
            &probe_with(&["/res/voices.rpk", "/res/support.rpk"]),
            Revision::default(),
        )
        .unwrap();

        assert!(descriptor.registered);
        assert!(!descriptor.demo_version);
        assert!(descriptor.voices_enabled);
        assert!(!descriptor.force_text_dialog);
        assert_eq!(
            descriptor.archives,
            vec![
                PathBuf::from("/games/ashlight.rpk"),
                PathBuf::from("/res/voices.rpk"),
                PathBuf::from("/res/support.rpk"),
            ]
        );
    }

    #[test]
    fn missing_voices_is_soft() {
        let descriptor = identify(
            &config(),
            &probe_with(&["/res/support.rpk"]),
            Revision::default(),
        )
        .unwrap();

        assert!(!descriptor.voices_enabled);
        assert!(descriptor.force_text_dialog);
        // The support archive still loaded.
        assert!(
            descriptor
                .archives
                .contains(&PathBuf::from("/res/support.rpk"))
        );
    }

    #[test]
    fn missing_support_archive_is_fatal() {
        let err = identify(
            &config(),
            &probe_with(&["/res/voices.rpk"]),
            Revision::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            VersionError::MissingSupportArchive {
                name: SUPPORT_ARCHIVE
            }
        ));
    }

    #[test]
    fn support_archive_found_beside_primary() {
        // Directory search misses, but the archive sits next to the
        // explicitly-specified primary.
        let descriptor = identify(
            &config(),
            &probe_with(&["/games/support.rpk", "/res/voices.rpk"]),
            Revision::default(),
        )
        .unwrap();

        assert!(
            descriptor
                .archives
                .contains(&PathBuf::from("/games/support.rpk"))
        );
    }

    #[test]
    fn unmodified_game_passes_compatibility() {
        let descriptor = identify(
            &config(),
            &probe_with(&["/res/voices.rpk", "/res/support.rpk"]),
            Revision::default(),
        )
        .unwrap();
        let lumps = FakeLumps(HashSet::new());

        assert!(verify_compatibility(&descriptor, false, &lumps).is_ok());
    }

    #[test]
    fn modified_demo_edition_is_fatal() {
        let mut descriptor = identify(
            &config(),
            &probe_with(&["/res/voices.rpk", "/res/support.rpk"]),
            Revision::default(),
        )
        .unwrap();
        descriptor.edition = Edition::Demo;
        descriptor.demo_version = true;
        let lumps = FakeLumps(HashSet::new());

        assert!(matches!(
            verify_compatibility(&descriptor, true, &lumps),
            Err(VersionError::ModifiedDemoEdition)
        ));
    }

    #[test]
    fn modified_full_edition_requires_compat_lumps() {
        let descriptor = identify(
            &config(),
            &probe_with(&["/res/voices.rpk", "/res/support.rpk"]),
            Revision::default(),
        )
        .unwrap();

        let missing = FakeLumps(HashSet::from(["area23", "area30"]));
        assert!(matches!(
            verify_compatibility(&descriptor, true, &missing),
            Err(VersionError::NotFullEdition { lump: "WARDA1" })
        ));

        let complete = FakeLumps(HashSet::from(["area23", "area30", "WARDA1"]));
        assert!(verify_compatibility(&descriptor, true, &complete).is_ok());
    }
}
