//! Fatal resolution errors.
//!
//! Only unrecoverable conditions are errors; soft failures (a missing
//! optional archive) are warnings plus descriptor flags, and the engine
//! continues with defined degraded behavior.

/// Errors that abort startup with a diagnostic and a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// The required support archive was not found by any search strategy.
    #[error("cannot find required archive '{name}'")]
    MissingSupportArchive { name: &'static str },

    /// Third-party content was loaded on the demo edition.
    #[error("additional archives cannot be loaded with the demo edition")]
    ModifiedDemoEdition,

    /// A compatibility lump required alongside third-party content is
    /// missing from the primary archive.
    #[error("this is not the full edition: lump '{lump}' is missing")]
    NotFullEdition { lump: &'static str },
}
