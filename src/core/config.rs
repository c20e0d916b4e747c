use crate::core::error::{CoherenceResult, ConfigError, ResultExt};
use crate::verify::VerifyBehavior;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment switch that turns the coherence check off entirely
pub const DISABLE_CHECK_ENV: &str = "COHERENCE_DISABLE_CHECK";

/// Configuration for coherence-build
/// Searched in order: coherence.toml, .coherence.toml, .config/coherence.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoherenceConfig {
  #[serde(default)]
  pub verify: VerifyConfig,
  #[serde(default)]
  pub publish: PublishConfig,
  #[serde(default)]
  pub props: PropsConfig,
}

/// Which packages the coherence check covers and what it exempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
  /// none | product | partner | all
  #[serde(default = "default_behavior")]
  pub behavior: BehaviorSetting,

  /// Package ids never verified (case-insensitive)
  #[serde(default)]
  pub skip_packages: Vec<String>,

  /// Partner references under these framework identifiers are not checked
  #[serde(default = "default_exempt_frameworks")]
  pub exempt_frameworks: Vec<String>,

  /// When non-empty, partner references are only allowed under these frameworks
  #[serde(default)]
  pub partner_reference_frameworks: Vec<String>,
}

fn default_behavior() -> BehaviorSetting {
  BehaviorSetting::All
}

fn default_exempt_frameworks() -> Vec<String> {
  vec![".NETCore".to_string()]
}

impl Default for VerifyConfig {
  fn default() -> Self {
    Self {
      behavior: default_behavior(),
      skip_packages: Vec::new(),
      exempt_frameworks: default_exempt_frameworks(),
      partner_reference_frameworks: Vec::new(),
    }
  }
}

/// Verification behavior as written in config and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorSetting {
  None,
  Product,
  Partner,
  All,
}

impl From<BehaviorSetting> for VerifyBehavior {
  fn from(setting: BehaviorSetting) -> Self {
    match setting {
      BehaviorSetting::None => VerifyBehavior::NONE,
      BehaviorSetting::Product => VerifyBehavior::PRODUCT,
      BehaviorSetting::Partner => VerifyBehavior::PARTNER,
      BehaviorSetting::All => VerifyBehavior::ALL,
    }
  }
}

/// Feed publishing limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
  #[serde(default = "default_max_parallel")]
  pub max_parallel: usize,

  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,

  #[serde(default = "default_attempt_timeout_secs")]
  pub attempt_timeout_secs: u64,

  #[serde(default = "default_retry_delay_ms")]
  pub retry_delay_ms: u64,

  /// Fraction of `retry_delay_ms` applied as random +/- jitter
  #[serde(default = "default_retry_jitter")]
  pub retry_jitter: f64,

  /// Repositories whose packages are re-pushed without an existence check
  #[serde(default)]
  pub always_push_sources: Vec<String>,
}

fn default_max_parallel() -> usize {
  4
}

fn default_max_attempts() -> u32 {
  5
}

fn default_attempt_timeout_secs() -> u64 {
  180
}

fn default_retry_delay_ms() -> u64 {
  3000
}

fn default_retry_jitter() -> f64 {
  0.25
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      max_parallel: default_max_parallel(),
      max_attempts: default_max_attempts(),
      attempt_timeout_secs: default_attempt_timeout_secs(),
      retry_delay_ms: default_retry_delay_ms(),
      retry_jitter: default_retry_jitter(),
      always_push_sources: Vec::new(),
    }
  }
}

impl PublishConfig {
  /// Validate publish limits
  pub fn validate(&self) -> CoherenceResult<()> {
    if self.max_parallel == 0 {
      return Err(invalid("publish.max_parallel", "must be at least 1"));
    }
    if self.max_attempts == 0 {
      return Err(invalid("publish.max_attempts", "must be at least 1"));
    }
    if self.attempt_timeout_secs == 0 {
      return Err(invalid("publish.attempt_timeout_secs", "must be at least 1"));
    }
    if !(0.0..=1.0).contains(&self.retry_jitter) {
      return Err(invalid(
        "publish.retry_jitter",
        format!("{} is outside 0.0..=1.0", self.retry_jitter),
      ));
    }
    Ok(())
  }

  pub fn attempt_timeout(&self) -> Duration {
    Duration::from_secs(self.attempt_timeout_secs)
  }

  pub fn retry_delay(&self) -> Duration {
    Duration::from_millis(self.retry_delay_ms)
  }
}

/// The MSBuild props file written by `--props`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropsConfig {
  /// Package whose version becomes the product version property
  #[serde(default)]
  pub product_package: Option<String>,

  #[serde(default = "default_product_property")]
  pub product_property: String,
}

fn default_product_property() -> String {
  "ProductVersion".to_string()
}

impl Default for PropsConfig {
  fn default() -> Self {
    Self {
      product_package: None,
      product_property: default_product_property(),
    }
  }
}

impl PropsConfig {
  /// The property name must be usable as an XML element name
  pub fn validate(&self) -> CoherenceResult<()> {
    let name = &self.product_property;
    let valid_start = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
      return Err(invalid(
        "props.product_property",
        format!("'{}' is not a valid element name", name),
      ));
    }
    Ok(())
  }
}

fn invalid(field: &str, reason: impl Into<String>) -> crate::core::error::CoherenceError {
  ConfigError::InvalidValue {
    field: field.to_string(),
    reason: reason.into(),
  }
  .into()
}

/// Values from the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
  pub behavior: Option<BehaviorSetting>,
  pub max_parallel: Option<usize>,
  pub max_attempts: Option<u32>,
}

impl CoherenceConfig {
  /// Find config file in search order: coherence.toml, .coherence.toml, .config/coherence.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("coherence.toml"),
      path.join(".coherence.toml"),
      path.join(".config").join("coherence.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from a directory, falling back to defaults when none is found
  pub fn load(dir: &Path) -> CoherenceResult<Self> {
    match Self::find_config_path(dir) {
      Some(config_path) => Self::load_file(&config_path),
      None => Ok(Self::default()),
    }
  }

  /// Load an explicit config file; a missing file is an error
  pub fn load_file(config_path: &Path) -> CoherenceResult<Self> {
    if !config_path.is_file() {
      return Err(
        ConfigError::NotFound {
          path: config_path.to_path_buf(),
        }
        .into(),
      );
    }

    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: CoherenceConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .publish
      .validate()
      .with_context(|| format!("Invalid publish configuration in {}", config_path.display()))?;
    config
      .props
      .validate()
      .with_context(|| format!("Invalid props configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Apply command-line overrides and the disable switch, then re-validate
  pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> CoherenceResult<()> {
    if let Some(behavior) = overrides.behavior {
      self.verify.behavior = behavior;
    }
    if let Some(max_parallel) = overrides.max_parallel {
      self.publish.max_parallel = max_parallel;
    }
    if let Some(max_attempts) = overrides.max_attempts {
      self.publish.max_attempts = max_attempts;
    }
    if check_disabled_by_env() {
      self.verify.behavior = BehaviorSetting::None;
    }
    self.publish.validate()
  }
}

fn check_disabled_by_env() -> bool {
  std::env::var(DISABLE_CHECK_ENV)
    .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_defaults_without_file() {
    let dir = TempDir::new().unwrap();
    let config = CoherenceConfig::load(dir.path()).unwrap();
    assert_eq!(config.verify.behavior, BehaviorSetting::All);
    assert_eq!(config.verify.exempt_frameworks, vec![".NETCore".to_string()]);
    assert!(config.verify.skip_packages.is_empty());
    assert_eq!(config.publish.max_parallel, 4);
    assert_eq!(config.publish.max_attempts, 5);
    assert_eq!(config.publish.attempt_timeout(), Duration::from_secs(180));
  }

  #[test]
  fn test_search_order_and_partial_tables() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".config")).unwrap();
    fs::write(
      dir.path().join(".config/coherence.toml"),
      "[verify]\nbehavior = \"product\"\n",
    )
    .unwrap();
    fs::write(
      dir.path().join(".coherence.toml"),
      "[publish]\nmax_parallel = 8\n",
    )
    .unwrap();

    let config = CoherenceConfig::load(dir.path()).unwrap();
    // .coherence.toml wins over .config/coherence.toml
    assert_eq!(config.publish.max_parallel, 8);
    assert_eq!(config.verify.behavior, BehaviorSetting::All);
    assert_eq!(config.publish.max_attempts, 5);
  }

  #[test]
  fn test_validation_rejects_bad_limits() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("coherence.toml");

    fs::write(&path, "[publish]\nmax_parallel = 0\n").unwrap();
    assert!(CoherenceConfig::load(dir.path()).is_err());

    fs::write(&path, "[publish]\nretry_jitter = 1.5\n").unwrap();
    assert!(CoherenceConfig::load(dir.path()).is_err());

    fs::write(&path, "[publish]\nattempt_timeout_secs = 0\n").unwrap();
    assert!(CoherenceConfig::load(dir.path()).is_err());

    fs::write(&path, "[props]\nproduct_property = \"1Version\"\n").unwrap();
    assert!(CoherenceConfig::load(dir.path()).is_err());
  }

  #[test]
  fn test_props_section() {
    let dir = TempDir::new().unwrap();
    assert_eq!(CoherenceConfig::load(dir.path()).unwrap().props.product_property, "ProductVersion");

    fs::write(
      dir.path().join("coherence.toml"),
      "[props]\nproduct_package = \"Microsoft.AspNetCore.Mvc.Core\"\nproduct_property = \"AspNetCoreVersion\"\n",
    )
    .unwrap();
    let config = CoherenceConfig::load(dir.path()).unwrap();
    assert_eq!(config.props.product_package.as_deref(), Some("Microsoft.AspNetCore.Mvc.Core"));
    assert_eq!(config.props.product_property, "AspNetCoreVersion");
  }

  #[test]
  fn test_explicit_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = CoherenceConfig::load_file(&dir.path().join("nope.toml")).unwrap_err();
    assert!(err.to_string().contains("not found"));
  }

  #[test]
  fn test_overrides_win() {
    let mut config = CoherenceConfig::default();
    config
      .apply_overrides(&ConfigOverrides {
        behavior: Some(BehaviorSetting::Partner),
        max_parallel: Some(2),
        max_attempts: None,
      })
      .unwrap();
    assert_eq!(config.publish.max_parallel, 2);
    assert_eq!(config.publish.max_attempts, 5);

    let err = config.apply_overrides(&ConfigOverrides {
      max_attempts: Some(0),
      ..Default::default()
    });
    assert!(err.is_err());
  }
}
