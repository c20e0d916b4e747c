//! Collection: repository manifests → frozen universe
//!
//! Each repository's build drop is described by a JSON manifest. Manifests
//! are parsed in parallel; the records are then merged on one thread into a
//! `Universe`, which rejects duplicate package ids.

use crate::core::error::{CollectionError, CoherenceResult};
use crate::model::package::package_key;
use crate::model::{DependencyGroup, PackageRecord, Universe, parse_version};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SYMBOLS_SUFFIX: &str = ".symbols.nupkg";

/// One repository's build output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryManifest {
  pub repository: String,
  #[serde(default)]
  pub build_number: Option<String>,
  /// Every package in this repository is a partner package
  #[serde(default)]
  pub partner: bool,
  /// Package ids dropped before they reach the universe
  #[serde(default)]
  pub skip_packages: Vec<String>,
  #[serde(default)]
  pub packages: Vec<ManifestPackage>,
}

/// One package archive in a repository manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestPackage {
  pub id: String,
  pub version: String,
  /// Archive location, relative to the manifest
  pub path: PathBuf,
  #[serde(default)]
  pub lineup: bool,
  #[serde(default)]
  pub dependency_groups: Vec<DependencyGroup>,
}

/// Read every manifest and freeze the result into a universe
pub fn collect_universe(manifests: &[PathBuf]) -> CoherenceResult<Universe> {
  let loaded: Vec<Result<Vec<PackageRecord>, CollectionError>> =
    manifests.par_iter().map(|path| load_manifest(path)).collect();

  let mut records = Vec::new();
  for result in loaded {
    records.extend(result?);
  }

  let universe = Universe::from_records(records)?;
  info!(
    manifests = manifests.len(),
    packages = universe.len(),
    "collected package universe"
  );
  Ok(universe)
}

fn load_manifest(path: &Path) -> Result<Vec<PackageRecord>, CollectionError> {
  let invalid = |reason: String| CollectionError::InvalidManifest {
    path: path.to_path_buf(),
    reason,
  };

  let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
  let manifest: RepositoryManifest = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
  if manifest.repository.trim().is_empty() {
    return Err(invalid("`repository` must not be empty".to_string()));
  }

  let base = path.parent().unwrap_or_else(|| Path::new("."));
  let skip: HashSet<String> = manifest.skip_packages.iter().map(|id| package_key(id)).collect();
  let mut records = Vec::with_capacity(manifest.packages.len());

  for package in manifest.packages {
    if package.id.trim().is_empty() {
      return Err(invalid("package with an empty `id`".to_string()));
    }
    if package
      .path
      .to_string_lossy()
      .to_ascii_lowercase()
      .ends_with(SYMBOLS_SUFFIX)
    {
      debug!(package = %package.id, "ignoring symbols package");
      continue;
    }
    if skip.contains(&package_key(&package.id)) {
      info!(
        package = %package.id,
        repository = %manifest.repository,
        "skipping package listed in skip_packages"
      );
      continue;
    }

    let version = parse_version(&package.version).map_err(|e| invalid(format!("package '{}': {}", package.id, e)))?;
    records.push(
      PackageRecord::new(package.id, version, manifest.repository.clone(), base.join(&package.path))
        .partner(manifest.partner)
        .lineup(package.lineup)
        .with_dependency_groups(package.dependency_groups),
    );
  }

  info!(
    repository = %manifest.repository,
    build = manifest.build_number.as_deref().unwrap_or("unknown"),
    packages = records.len(),
    "read repository manifest"
  );
  Ok(records)
}
