//! Run context - build once, pass everywhere
//!
//! Resolves configuration (file, CLI overrides, environment) once in
//! main.rs and hands it to every command by reference.

use crate::core::config::{CoherenceConfig, ConfigOverrides};
use crate::core::error::CoherenceResult;
use crate::verify::VerifyPolicy;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared state for one coherence-build invocation
#[derive(Clone)]
pub struct CoherenceContext {
  /// Directory the config was searched in
  pub work_dir: PathBuf,

  /// Effective configuration after overrides
  pub config: Arc<CoherenceConfig>,
}

impl CoherenceContext {
  /// Load configuration and apply overrides.
  ///
  /// An explicit `config_path` must exist; otherwise the standard search
  /// order is used and a missing file means defaults.
  pub fn build(work_dir: &Path, config_path: Option<&Path>, overrides: &ConfigOverrides) -> CoherenceResult<Self> {
    let mut config = match config_path {
      Some(path) => CoherenceConfig::load_file(path)?,
      None => CoherenceConfig::load(work_dir)?,
    };
    config.apply_overrides(overrides)?;

    Ok(Self {
      work_dir: work_dir.to_path_buf(),
      config: Arc::new(config),
    })
  }

  /// Resolve a command-line path against the working directory
  pub fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.work_dir.join(path)
    }
  }

  pub fn verify_policy(&self) -> VerifyPolicy {
    VerifyPolicy::from_config(&self.config.verify)
  }
}
