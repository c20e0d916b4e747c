use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use crate::commands::collect_and_verify;
use crate::core::context::CoherenceContext;
use crate::core::error::CoherenceResult;
use crate::order::PublishPlan;

#[derive(Serialize)]
struct PlanOutput<'a> {
  /// Whether the universe passed the coherence check
  coherent: bool,
  #[serde(flatten)]
  plan: &'a PublishPlan,
}

/// Run the plan command
///
/// Mismatches only warn here; `verify` and `publish` are the gates.
pub fn run_plan(ctx: &CoherenceContext, manifests: &[PathBuf], json: bool) -> CoherenceResult<()> {
  let (universe, report) = collect_and_verify(ctx, manifests)?;
  if !report.success {
    warn!(
      failed_packages = report.failures.len(),
      "coherence check failed, publish would be refused"
    );
  }

  let plan = PublishPlan::build(&universe)?;

  if json {
    let output = PlanOutput {
      coherent: report.success,
      plan: &plan,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
  } else {
    print!("{}", plan.to_human_readable());
    if !report.success {
      println!(
        "\n⚠️  {} package(s) failed the coherence check; run `coherence-build verify` for details",
        report.failures.len()
      );
    }
  }

  Ok(())
}
