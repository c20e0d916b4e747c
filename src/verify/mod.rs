//! Coherence verification
//!
//! - **policy**: which packages are checked and which references are exempt
//! - **verifier**: the parallel dependency-graph walk that records mismatches
//! - **report**: pass/fail summary for humans and JSON consumers
//! - **props**: MSBuild props pinning verified partner versions

pub mod policy;
pub mod props;
pub mod report;
pub mod verifier;

pub use policy::{VerifyBehavior, VerifyPolicy};
pub use props::DependencyProps;
pub use report::VerificationReport;
pub use verifier::DependencyGraphVerifier;
