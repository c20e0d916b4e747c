//! Dependency graph verifier
//!
//! Walks every declared dependency group of every selected package and
//! compares the declared minimum version with the version actually built
//! into the universe. Visits run in parallel over the frozen universe; the
//! results are written back afterwards on the calling thread.

use crate::core::error::{CoherenceResult, IntegrityError};
use crate::model::{
  DependencyIssue, IssueKind, PackageRecord, PackageVerification, TargetFramework, Universe, VersionRange,
};
use crate::verify::policy::VerifyPolicy;
use crate::verify::report::VerificationReport;
use rayon::prelude::*;
use tracing::{error, info};

/// Result of visiting one package
enum Visit {
  Checked(PackageVerification),
  Skipped,
  NotSelected,
}

/// Checks declared dependency versions against the universe
pub struct DependencyGraphVerifier {
  policy: VerifyPolicy,
}

impl DependencyGraphVerifier {
  pub fn new(policy: VerifyPolicy) -> Self {
    Self { policy }
  }

  /// Verify every selected package and record the findings on it
  ///
  /// A failed report is not an error. Malformed metadata is.
  pub fn verify(&self, universe: &mut Universe) -> CoherenceResult<VerificationReport> {
    if self.policy.is_disabled() {
      info!("coherence check disabled, skipping verification");
      return Ok(VerificationReport::disabled());
    }

    let frozen: &Universe = universe;
    let visits: Vec<Result<Visit, IntegrityError>> = (0..frozen.len())
      .into_par_iter()
      .map(|idx| self.visit(frozen, idx))
      .collect();

    let mut outcomes = Vec::with_capacity(visits.len());
    let mut skipped = Vec::new();
    let mut verified = 0;

    for (idx, visit) in visits.into_iter().enumerate() {
      let record = universe.record(idx);
      match visit {
        Ok(Visit::Checked(outcome)) => {
          verified += 1;
          outcomes.push(Some(outcome));
        }
        Ok(Visit::Skipped) => {
          info!(package = %record, "skipping verification of package on the skip list");
          skipped.push(record.id().to_string());
          outcomes.push(None);
        }
        Ok(Visit::NotSelected) => outcomes.push(None),
        Err(err) => {
          error!(package = %record, error = %err, "unable to verify package");
          return Err(err.into());
        }
      }
    }

    universe.apply_verification(outcomes);
    log_failures(universe);

    Ok(VerificationReport::from_universe(universe, verified, skipped))
  }

  fn visit(&self, universe: &Universe, idx: usize) -> Result<Visit, IntegrityError> {
    let record = universe.record(idx);

    if !self.policy.selects(record.is_partner()) {
      return Ok(Visit::NotSelected);
    }
    if self.policy.is_skipped(record.id()) {
      return Ok(Visit::Skipped);
    }

    let mut outcome = PackageVerification::default();

    for group in record.dependency_groups() {
      let Some(raw_framework) = group.target_framework.as_deref() else {
        continue;
      };
      let framework = TargetFramework::parse(raw_framework).map_err(|reason| malformed(record, reason))?;
      if framework.is_portable() {
        continue;
      }

      for dependency in &group.dependencies {
        let range = VersionRange::parse(&dependency.version)
          .map_err(|reason| malformed(record, format!("dependency '{}': {}", dependency.id, reason)))?;

        let Some(resolved) = universe.lookup(&dependency.id) else {
          continue;
        };
        let target = universe.record(resolved);

        let issue = |kind| DependencyIssue {
          kind,
          dependency_id: dependency.id.clone(),
          required: range.as_str().to_string(),
          target_framework: framework.to_string(),
          resolved,
          actual_version: target.version().to_string(),
        };

        if target.is_partner() && self.policy.is_exempt_framework(&framework) {
          continue;
        }

        if target.is_partner() && !self.policy.allows_partner_reference(&framework) {
          outcome.invalid_references.push(issue(IssueKind::InvalidReference));
        } else if !range.is_coherent_with(target.version()) {
          outcome.dependency_mismatches.push(issue(IssueKind::VersionMismatch));
        }

        if !outcome.product_dependencies.contains(&resolved) {
          outcome.product_dependencies.push(resolved);
        }
      }
    }

    Ok(Visit::Checked(outcome))
  }
}

fn malformed(record: &PackageRecord, reason: impl Into<String>) -> IntegrityError {
  IntegrityError::MalformedMetadata {
    package: record.to_string(),
    reason: reason.into(),
  }
}

fn log_failures(universe: &Universe) {
  for record in universe.records().iter().filter(|r| !r.is_success()) {
    error!(package = %record, source = record.source(), "package failed the coherence check");

    for issue in record.dependency_mismatches() {
      error!(
        package = %record,
        dependency = %issue.dependency_id,
        required = %issue.required,
        actual = %issue.actual_version,
        framework = %issue.target_framework,
        "dependency version mismatch"
      );
    }
    for issue in record.invalid_references() {
      error!(
        package = %record,
        dependency = %issue.dependency_id,
        framework = %issue.target_framework,
        "partner package referenced from an unsupported framework"
      );
    }
  }
}
