//! Data model for one release run
//!
//! - **package**: `PackageRecord`, dependency groups and coherence issues
//! - **universe**: the frozen, case-insensitively indexed working set
//! - **framework**: target framework parsing (portable detection)
//! - **version**: lenient version parsing and dependency ranges

pub mod framework;
pub mod package;
pub mod universe;
pub mod version;

pub use framework::TargetFramework;
pub use package::{DependencyGroup, DependencyIssue, IssueKind, PackageRecord, PackageVerification};
pub use universe::Universe;
pub use version::{VersionRange, parse_version};
