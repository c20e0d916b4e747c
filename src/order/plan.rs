//! Publish plans: packages grouped by degree, identified by a content hash
//!
//! The same universe always yields the same plan and the same `PlanId`, so a
//! plan printed by `coherence-build plan` can be compared against the one a
//! later `publish` run executes.

use crate::core::error::CoherenceResult;
use crate::model::Universe;
use crate::order::degree::{LINEUP_DEGREE, PublishOrder};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Plan identifier (SHA256 hash of the ordered package list)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// One package scheduled for publishing
#[derive(Debug, Clone, Serialize)]
pub struct PlannedPackage {
  /// Universe index
  #[serde(skip)]
  pub index: usize,
  pub id: String,
  pub version: String,
  pub source: String,
}

/// Packages that share a degree and may be pushed concurrently
#[derive(Debug, Clone, Serialize)]
pub struct PublishGroup {
  pub degree: u32,
  pub packages: Vec<PlannedPackage>,
}

impl PublishGroup {
  fn label(&self) -> String {
    if self.degree == LINEUP_DEGREE {
      "lineup".to_string()
    } else {
      self.degree.to_string()
    }
  }
}

/// The full publish schedule, lowest degree first
#[derive(Debug, Clone, Serialize)]
pub struct PublishPlan {
  pub id: PlanId,
  pub groups: Vec<PublishGroup>,
}

impl PublishPlan {
  /// Compute degrees and group the universe into a plan
  pub fn build(universe: &Universe) -> CoherenceResult<Self> {
    let order = PublishOrder::compute(universe)?;
    Ok(Self::from_order(universe, &order))
  }

  pub fn from_order(universe: &Universe, order: &PublishOrder) -> Self {
    let mut by_degree: BTreeMap<u32, Vec<PlannedPackage>> = BTreeMap::new();
    for (idx, record) in universe.records().iter().enumerate() {
      by_degree.entry(order.degree(idx)).or_default().push(PlannedPackage {
        index: idx,
        id: record.id().to_string(),
        version: record.version().to_string(),
        source: record.source().to_string(),
      });
    }

    let groups: Vec<PublishGroup> = by_degree
      .into_iter()
      .map(|(degree, mut packages)| {
        packages.sort_by(|a, b| a.id.to_lowercase().cmp(&b.id.to_lowercase()));
        PublishGroup { degree, packages }
      })
      .collect();

    let listing: String = groups
      .iter()
      .flat_map(|g| g.packages.iter())
      .map(|p| format!("{}@{}\n", p.id.to_lowercase(), p.version))
      .collect();

    Self {
      id: PlanId::from_contents(listing.as_bytes()),
      groups,
    }
  }

  /// Total number of packages in the plan
  pub fn len(&self) -> usize {
    self.groups.iter().map(|g| g.packages.len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.groups.is_empty()
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> CoherenceResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!(
      "📋 Publish plan ({}): {} package(s) in {} group(s)\n",
      self.id,
      self.len(),
      self.groups.len()
    ));

    for group in &self.groups {
      output.push_str(&format!("\n   Degree {}:\n", group.label()));
      for package in &group.packages {
        output.push_str(&format!("     {} {} ({})\n", package.id, package.version, package.source));
      }
    }

    output
  }
}
