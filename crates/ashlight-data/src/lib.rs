//! Ashlight Data -- startup resource and version resolution.
//!
//! Determines which game edition is active and locates the bundled
//! resource archives before the first main-loop iteration. Lookup failures
//! are classified fatal or soft by a policy table, never by call-site
//! logic, and every lookup is attempted exactly once.
//!
//! # Key Types
//!
//! - [`search::locate_archive`] -- Ordered search-strategy chain for
//!   finding a named archive on disk.
//! - [`resolver::identify`] -- Builds the immutable
//!   [`resolver::VersionDescriptor`] and resolves the bundled archives.
//! - [`resolver::verify_compatibility`] -- Third-party content checks.

pub mod error;
pub mod resolver;
pub mod search;

pub use error::VersionError;
pub use resolver::{Edition, Revision, VersionDescriptor, identify, verify_compatibility};
pub use search::{ArchiveProbe, FsProbe, SearchConfig, locate_archive};
