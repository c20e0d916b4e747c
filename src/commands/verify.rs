use std::path::{Path, PathBuf};

use crate::commands::{collect_and_verify, write_props};
use crate::core::context::CoherenceContext;
use crate::core::error::CoherenceResult;

/// Run the verify command
///
/// Prints the report and fails with a validation error when any package
/// is incoherent. On success the props file is written when requested.
pub fn run_verify(
  ctx: &CoherenceContext,
  manifests: &[PathBuf],
  props: Option<&Path>,
  json: bool,
) -> CoherenceResult<()> {
  if !json {
    println!("🔍 Verifying {} repository manifest(s)...\n", manifests.len());
  }

  let (universe, report) = collect_and_verify(ctx, manifests)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print!("{}", report.to_human_readable());
  }

  report.ensure_success()?;

  if let Some(path) = props {
    write_props(ctx, &universe, path)?;
    if !json {
      println!("📝 Wrote {}", path.display());
    }
  }

  Ok(())
}
