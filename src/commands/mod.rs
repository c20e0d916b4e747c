//! CLI commands for coherence-build
//!
//! - **verify**: collect manifests and run the coherence check (the gate)
//! - **plan**: show the dependency-ordered publish plan
//! - **publish**: verify, gate, order and push to a feed
//!
//! All commands accept `&CoherenceContext` so configuration is loaded once.

pub mod plan;
pub mod publish;
pub mod verify;

pub use plan::run_plan;
pub use publish::{PublishArgs, run_publish};
pub use verify::run_verify;

use crate::collect::collect_universe;
use crate::core::context::CoherenceContext;
use crate::core::error::CoherenceResult;
use crate::model::Universe;
use crate::verify::{DependencyGraphVerifier, DependencyProps, VerificationReport};
use std::path::{Path, PathBuf};

/// Shared front half of every command: collect, then verify
pub(crate) fn collect_and_verify(
  ctx: &CoherenceContext,
  manifests: &[PathBuf],
) -> CoherenceResult<(Universe, VerificationReport)> {
  let manifests: Vec<PathBuf> = manifests.iter().map(|path| ctx.resolve(path)).collect();
  let mut universe = collect_universe(&manifests)?;
  let report = DependencyGraphVerifier::new(ctx.verify_policy()).verify(&mut universe)?;
  Ok((universe, report))
}

/// Write the props file for a universe that passed the check
pub(crate) fn write_props(ctx: &CoherenceContext, universe: &Universe, path: &Path) -> CoherenceResult<()> {
  DependencyProps::from_universe(universe, &ctx.config.props).write(&ctx.resolve(path))
}
