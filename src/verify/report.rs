//! Verification report

use crate::core::error::{CoherenceResult, ValidationError};
use crate::model::{DependencyIssue, PackageRecord, Universe};
use serde::Serialize;

/// One package that failed the coherence check
#[derive(Debug, Clone, Serialize)]
pub struct PackageFailure {
  pub package: String,
  pub version: String,
  pub source: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub mismatches: Vec<DependencyIssue>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub invalid_references: Vec<DependencyIssue>,
}

impl PackageFailure {
  fn from_record(record: &PackageRecord) -> Self {
    Self {
      package: record.id().to_string(),
      version: record.version().to_string(),
      source: record.source().to_string(),
      mismatches: record.dependency_mismatches().to_vec(),
      invalid_references: record.invalid_references().to_vec(),
    }
  }
}

/// Outcome of one verification pass
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
  pub success: bool,
  /// Verification was turned off (behavior = none)
  pub disabled: bool,
  /// Packages actually visited
  pub verified: usize,
  /// Packages skipped by the skip list
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub skipped: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub failures: Vec<PackageFailure>,
}

impl VerificationReport {
  pub(crate) fn disabled() -> Self {
    Self {
      success: true,
      disabled: true,
      verified: 0,
      skipped: Vec::new(),
      failures: Vec::new(),
    }
  }

  pub(crate) fn from_universe(universe: &Universe, verified: usize, skipped: Vec<String>) -> Self {
    let failures: Vec<PackageFailure> = universe
      .records()
      .iter()
      .filter(|r| !r.is_success())
      .map(PackageFailure::from_record)
      .collect();

    Self {
      success: failures.is_empty(),
      disabled: false,
      verified,
      skipped,
      failures,
    }
  }

  /// Gate: a failed report must never reach the publisher
  pub fn ensure_success(&self) -> CoherenceResult<()> {
    if self.success {
      Ok(())
    } else {
      Err(
        ValidationError::CoherenceCheckFailed {
          failed_packages: self.failures.len(),
        }
        .into(),
      )
    }
  }

  pub fn mismatch_count(&self) -> usize {
    self.failures.iter().map(|f| f.mismatches.len()).sum()
  }

  pub fn invalid_reference_count(&self) -> usize {
    self.failures.iter().map(|f| f.invalid_references.len()).sum()
  }

  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    if self.disabled {
      output.push_str("⏭️  Coherence check disabled\n");
      return output;
    }

    for failure in &self.failures {
      output.push_str(&format!(
        "❌ {} {} ({})\n",
        failure.package, failure.version, failure.source
      ));
      for issue in &failure.mismatches {
        output.push_str(&format!(
          "   {} requires {} but {} was built [{}]\n",
          issue.dependency_id, issue.required, issue.actual_version, issue.target_framework
        ));
      }
      for issue in &failure.invalid_references {
        output.push_str(&format!(
          "   {} referenced from unsupported framework {}\n",
          issue.dependency_id, issue.target_framework
        ));
      }
    }

    if !self.skipped.is_empty() {
      output.push_str(&format!("⏭️  Skipped: {}\n", self.skipped.join(", ")));
    }

    if self.success {
      output.push_str(&format!("✅ Coherence check passed ({} package(s) verified)\n", self.verified));
    } else {
      output.push_str(&format!(
        "\n❌ Coherence check failed: {} package(s), {} mismatch(es), {} invalid reference(s)\n",
        self.failures.len(),
        self.mismatch_count(),
        self.invalid_reference_count()
      ));
    }

    output
  }
}
