//! Package records: one collected package and what verification found about it

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Case-insensitive lookup key for a package identifier
pub fn package_key(id: &str) -> String {
  id.to_lowercase()
}

/// A single dependency declaration inside a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
  pub id: String,
  /// Version range exactly as declared (parsed during verification)
  pub version: String,
}

/// Dependencies declared for one target framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroup {
  /// `None` means the group applies to any framework
  #[serde(default)]
  pub target_framework: Option<String>,
  #[serde(default)]
  pub dependencies: Vec<DependencyRef>,
}

/// Category of a dependency problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
  /// Declared minimum differs from the version actually built
  VersionMismatch,
  /// Partner package referenced under a framework outside the allow-list
  InvalidReference,
}

/// A dependency that failed the coherence check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyIssue {
  pub kind: IssueKind,
  pub dependency_id: String,
  /// Declared range as written
  pub required: String,
  pub target_framework: String,
  /// Universe index of the package the dependency resolved to
  #[serde(skip)]
  pub resolved: usize,
  /// Version of the resolved package
  pub actual_version: String,
}

/// Everything the verifier learned about one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageVerification {
  pub product_dependencies: Vec<usize>,
  pub dependency_mismatches: Vec<DependencyIssue>,
  pub invalid_references: Vec<DependencyIssue>,
}

/// One collected package
#[derive(Debug, Clone)]
pub struct PackageRecord {
  id: String,
  version: Version,
  source: String,
  package_path: PathBuf,
  is_partner: bool,
  is_lineup: bool,
  dependency_groups: Vec<DependencyGroup>,
  product_dependencies: Vec<usize>,
  dependency_mismatches: Vec<DependencyIssue>,
  invalid_references: Vec<DependencyIssue>,
}

impl PackageRecord {
  /// Create a product package with no classification flags
  pub fn new(id: impl Into<String>, version: Version, source: impl Into<String>, package_path: PathBuf) -> Self {
    Self {
      id: id.into(),
      version,
      source: source.into(),
      package_path,
      is_partner: false,
      is_lineup: false,
      dependency_groups: Vec::new(),
      product_dependencies: Vec::new(),
      dependency_mismatches: Vec::new(),
      invalid_references: Vec::new(),
    }
  }

  /// Mark as a partner package (pushed first, partially exempt)
  pub fn partner(mut self, is_partner: bool) -> Self {
    self.is_partner = is_partner;
    self
  }

  /// Mark as a lineup package (pushed last)
  pub fn lineup(mut self, is_lineup: bool) -> Self {
    self.is_lineup = is_lineup;
    self
  }

  /// Attach the declared dependency groups
  pub fn with_dependency_groups(mut self, groups: Vec<DependencyGroup>) -> Self {
    self.dependency_groups = groups;
    self
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn key(&self) -> String {
    package_key(&self.id)
  }

  pub fn version(&self) -> &Version {
    &self.version
  }

  /// Repository the package was collected from
  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn package_path(&self) -> &PathBuf {
    &self.package_path
  }

  pub fn is_partner(&self) -> bool {
    self.is_partner
  }

  pub fn is_lineup(&self) -> bool {
    self.is_lineup
  }

  pub fn dependency_groups(&self) -> &[DependencyGroup] {
    &self.dependency_groups
  }

  /// Universe indices of in-universe packages this one depends on
  pub fn product_dependencies(&self) -> &[usize] {
    &self.product_dependencies
  }

  pub fn dependency_mismatches(&self) -> &[DependencyIssue] {
    &self.dependency_mismatches
  }

  pub fn invalid_references(&self) -> &[DependencyIssue] {
    &self.invalid_references
  }

  /// True when verification found nothing wrong
  pub fn is_success(&self) -> bool {
    self.dependency_mismatches.is_empty() && self.invalid_references.is_empty()
  }

  pub(crate) fn record_verification(&mut self, outcome: PackageVerification) {
    self.product_dependencies = outcome.product_dependencies;
    self.dependency_mismatches = outcome.dependency_mismatches;
    self.invalid_references = outcome.invalid_references;
  }
}

impl fmt::Display for PackageRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.id, self.version)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_identity_display() {
    let record = PackageRecord::new("Microsoft.AspNetCore.Mvc", Version::new(1, 0, 0), "Mvc", PathBuf::new());
    assert_eq!(record.to_string(), "Microsoft.AspNetCore.Mvc 1.0.0");
    assert_eq!(record.key(), "microsoft.aspnetcore.mvc");
  }

  #[test]
  fn test_success_reflects_recorded_issues() {
    let mut record = PackageRecord::new("A", Version::new(1, 0, 0), "repo", PathBuf::new());
    assert!(record.is_success());

    record.record_verification(PackageVerification {
      product_dependencies: vec![1],
      dependency_mismatches: vec![DependencyIssue {
        kind: IssueKind::VersionMismatch,
        dependency_id: "B".to_string(),
        required: "0.9.0".to_string(),
        target_framework: ".NETStandard,Version=1.3".to_string(),
        resolved: 1,
        actual_version: "1.0.0".to_string(),
      }],
      invalid_references: Vec::new(),
    });

    assert!(!record.is_success());
    assert_eq!(record.product_dependencies(), &[1]);
  }
}
