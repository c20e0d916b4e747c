//! The frozen working set of one release run
//!
//! Built once on a single thread, then only read. Lookups are
//! case-insensitive on the package identifier.

use crate::core::error::{CollectionError, CoherenceResult};
use crate::model::package::{PackageRecord, PackageVerification, package_key};
use std::collections::HashMap;

/// Every package collected for one release, indexed by identifier
#[derive(Debug, Default)]
pub struct Universe {
  records: Vec<PackageRecord>,
  index: HashMap<String, usize>,
}

impl Universe {
  /// Freeze a set of records into a universe
  ///
  /// Duplicate identifiers are a collection error, never a coherence issue.
  pub fn from_records(records: Vec<PackageRecord>) -> CoherenceResult<Self> {
    let mut index = HashMap::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
      if let Some(&existing) = index.get(&record.key()) {
        let first: &PackageRecord = &records[existing];
        return Err(
          CollectionError::DuplicatePackage {
            id: record.id().to_string(),
            first_source: format!("{} ({})", first, first.source()),
            second_source: format!("{} ({})", record, record.source()),
          }
          .into(),
        );
      }
      index.insert(record.key(), idx);
    }

    Ok(Self { records, index })
  }

  /// Resolve an identifier to its universe index
  pub fn lookup(&self, id: &str) -> Option<usize> {
    self.index.get(&package_key(id)).copied()
  }

  /// Resolve an identifier to its record
  #[cfg(test)]
  pub fn get(&self, id: &str) -> Option<&PackageRecord> {
    self.lookup(id).map(|idx| &self.records[idx])
  }

  pub fn record(&self, idx: usize) -> &PackageRecord {
    &self.records[idx]
  }

  pub fn records(&self) -> &[PackageRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Write verification results back, one per record, in universe order
  pub(crate) fn apply_verification(&mut self, outcomes: Vec<Option<PackageVerification>>) {
    for (record, outcome) in self.records.iter_mut().zip(outcomes) {
      if let Some(outcome) = outcome {
        record.record_verification(outcome);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use semver::Version;
  use std::path::PathBuf;

  fn record(id: &str, source: &str) -> PackageRecord {
    PackageRecord::new(id, Version::new(1, 0, 0), source, PathBuf::new())
  }

  #[test]
  fn test_case_insensitive_lookup() {
    let universe = Universe::from_records(vec![record("Newtonsoft.Json", "partner")]).unwrap();
    assert_eq!(universe.lookup("newtonsoft.json"), Some(0));
    assert_eq!(universe.get("NEWTONSOFT.JSON").map(|r| r.id()), Some("Newtonsoft.Json"));
    assert!(universe.lookup("System.Runtime").is_none());
  }

  #[test]
  fn test_duplicate_identifiers_are_fatal() {
    let err = Universe::from_records(vec![record("A", "repo1"), record("a", "repo2")]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Multiple copies"), "unexpected error: {}", message);
    assert!(message.contains("repo1") && message.contains("repo2"));
  }

  #[test]
  fn test_empty_universe() {
    let universe = Universe::from_records(Vec::new()).unwrap();
    assert!(universe.is_empty());
    assert_eq!(universe.len(), 0);
  }
}
