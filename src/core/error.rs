//! Error types for coherence-build with contextual messages and exit codes
//!
//! This module provides a unified error type that categorizes errors and provides
//! contextual help messages to users. Coherence mismatches are *not* errors: they are
//! collected into a `VerificationReport`. Only the gate that refuses to publish a
//! failed report turns them into a `ValidationError`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for coherence-build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, unreadable manifests)
  User = 1,
  /// System error (I/O, network, terminal publish failure)
  System = 2,
  /// Validation failure (coherence check failed, malformed metadata, cycles)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for coherence-build
#[derive(Debug)]
pub enum CoherenceError {
  /// Configuration errors
  Config(ConfigError),

  /// Errors while turning repository manifests into a universe
  Collection(CollectionError),

  /// Data-integrity errors found while walking the dependency graph
  Integrity(IntegrityError),

  /// Coherence gate failures
  Validation(ValidationError),

  /// Feed publishing errors
  Publish(PublishError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl CoherenceError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    CoherenceError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      CoherenceError::Message { message, context, help } => CoherenceError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      CoherenceError::Io(e) => CoherenceError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      CoherenceError::Config(_) => ExitCode::User,
      CoherenceError::Collection(_) => ExitCode::User,
      CoherenceError::Integrity(_) => ExitCode::Validation,
      CoherenceError::Validation(_) => ExitCode::Validation,
      CoherenceError::Publish(_) => ExitCode::System,
      CoherenceError::Io(_) => ExitCode::System,
      CoherenceError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      CoherenceError::Config(e) => e.help_message(),
      CoherenceError::Collection(e) => e.help_message(),
      CoherenceError::Integrity(e) => e.help_message(),
      CoherenceError::Validation(e) => e.help_message(),
      CoherenceError::Publish(e) => e.help_message(),
      CoherenceError::Message { help, .. } => help.clone(),
      CoherenceError::Io(_) => None,
    }
  }
}

impl fmt::Display for CoherenceError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CoherenceError::Config(e) => write!(f, "{}", e),
      CoherenceError::Collection(e) => write!(f, "{}", e),
      CoherenceError::Integrity(e) => write!(f, "{}", e),
      CoherenceError::Validation(e) => write!(f, "{}", e),
      CoherenceError::Publish(e) => write!(f, "{}", e),
      CoherenceError::Io(e) => write!(f, "I/O error: {}", e),
      CoherenceError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for CoherenceError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      CoherenceError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for CoherenceError {
  fn from(err: io::Error) -> Self {
    CoherenceError::Io(err)
  }
}

impl From<String> for CoherenceError {
  fn from(msg: String) -> Self {
    CoherenceError::message(msg)
  }
}

impl From<&str> for CoherenceError {
  fn from(msg: &str) -> Self {
    CoherenceError::message(msg)
  }
}

impl From<toml_edit::de::Error> for CoherenceError {
  fn from(err: toml_edit::de::Error) -> Self {
    CoherenceError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for CoherenceError {
  fn from(err: serde_json::Error) -> Self {
    CoherenceError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for CoherenceError {
  fn from(err: semver::Error) -> Self {
    CoherenceError::message(format!("Version parse error: {}", err))
  }
}

impl From<reqwest::Error> for CoherenceError {
  fn from(err: reqwest::Error) -> Self {
    CoherenceError::message(format!("HTTP error: {}", err))
  }
}

impl From<tokio::task::JoinError> for CoherenceError {
  fn from(err: tokio::task::JoinError) -> Self {
    CoherenceError::message(format!("Publish worker failed: {}", err))
  }
}

impl From<ConfigError> for CoherenceError {
  fn from(err: ConfigError) -> Self {
    CoherenceError::Config(err)
  }
}

impl From<CollectionError> for CoherenceError {
  fn from(err: CollectionError) -> Self {
    CoherenceError::Collection(err)
  }
}

impl From<IntegrityError> for CoherenceError {
  fn from(err: IntegrityError) -> Self {
    CoherenceError::Integrity(err)
  }
}

impl From<ValidationError> for CoherenceError {
  fn from(err: ValidationError) -> Self {
    CoherenceError::Validation(err)
  }
}

impl From<PublishError> for CoherenceError {
  fn from(err: PublishError) -> Self {
    CoherenceError::Publish(err)
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// An explicitly requested config file does not exist
  NotFound { path: PathBuf },

  /// A field holds a value outside its allowed range
  InvalidValue { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some(
        "Create coherence.toml in the working directory or drop --config to use the defaults.".to_string(),
      ),
      ConfigError::InvalidValue { field, .. } => Some(format!("Fix `{}` in coherence.toml.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Configuration file not found: {}", path.display())
      }
      ConfigError::InvalidValue { field, reason } => {
        write!(f, "Invalid value for {}: {}", field, reason)
      }
    }
  }
}

/// Errors raised while collecting packages into a universe
#[derive(Debug)]
pub enum CollectionError {
  /// Manifest could not be read or parsed
  InvalidManifest { path: PathBuf, reason: String },

  /// Two packages share an identifier (case-insensitive)
  DuplicatePackage {
    id: String,
    first_source: String,
    second_source: String,
  },
}

impl CollectionError {
  fn help_message(&self) -> Option<String> {
    match self {
      CollectionError::InvalidManifest { .. } => {
        Some("Regenerate the repository manifest from the build drop and try again.".to_string())
      }
      CollectionError::DuplicatePackage { id, .. } => Some(format!(
        "Only one repository may produce '{}'. Add it to `skip_packages` in one of the manifests.",
        id
      )),
    }
  }
}

impl fmt::Display for CollectionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CollectionError::InvalidManifest { path, reason } => {
        write!(f, "Invalid repository manifest {}: {}", path.display(), reason)
      }
      CollectionError::DuplicatePackage {
        id,
        first_source,
        second_source,
      } => {
        write!(
          f,
          "Multiple copies of package '{}' were found (from '{}' and '{}')",
          id, first_source, second_source
        )
      }
    }
  }
}

/// Data-integrity errors: the package metadata itself is broken
#[derive(Debug)]
pub enum IntegrityError {
  /// A dependency group or range could not be interpreted
  MalformedMetadata { package: String, reason: String },

  /// Product dependencies form a cycle, so no publish order exists
  DependencyCycle { packages: Vec<String> },
}

impl IntegrityError {
  fn help_message(&self) -> Option<String> {
    match self {
      IntegrityError::MalformedMetadata { package, .. } => Some(format!(
        "Inspect the nuspec of '{}'. Malformed metadata is a build problem, not a coherence issue.",
        package
      )),
      IntegrityError::DependencyCycle { .. } => {
        Some("Break the circular dependency between the listed packages before publishing.".to_string())
      }
    }
  }
}

impl fmt::Display for IntegrityError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      IntegrityError::MalformedMetadata { package, reason } => {
        write!(f, "Unable to verify package {}: {}", package, reason)
      }
      IntegrityError::DependencyCycle { packages } => {
        write!(f, "Circular dependency detected: {}", packages.join(" → "))
      }
    }
  }
}

/// Coherence gate failures
#[derive(Debug)]
pub enum ValidationError {
  /// At least one package has mismatches or invalid references
  CoherenceCheckFailed { failed_packages: usize },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::CoherenceCheckFailed { .. } => Some(
        "Rebuild the listed packages against the latest dependency versions, or add accepted exceptions to `verify.skip_packages`."
          .to_string(),
      ),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::CoherenceCheckFailed { failed_packages } => {
        write!(f, "Coherence check failed for {} package(s)", failed_packages)
      }
    }
  }
}

/// Feed publishing errors
#[derive(Debug)]
pub enum PublishError {
  /// The feed location could not be understood
  InvalidFeed { feed: String, reason: String },

  /// A push exhausted every attempt
  PushFailed {
    package: String,
    attempts: u32,
    reason: String,
  },

  /// The operation was cancelled before this package could be pushed
  Cancelled { package: String },
}

impl PublishError {
  fn help_message(&self) -> Option<String> {
    match self {
      PublishError::InvalidFeed { .. } => {
        Some("Pass an http(s):// feed URL or a local directory to --feed.".to_string())
      }
      PublishError::PushFailed { .. } => Some(
        "Packages already on the feed are skipped on the next run, so re-running publish is safe.".to_string(),
      ),
      PublishError::Cancelled { .. } => None,
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishError::InvalidFeed { feed, reason } => {
        write!(f, "Invalid feed '{}': {}", feed, reason)
      }
      PublishError::PushFailed {
        package,
        attempts,
        reason,
      } => {
        write!(
          f,
          "Failed to publish {} after {} attempt(s): {}",
          package, attempts, reason
        )
      }
      PublishError::Cancelled { package } => {
        write!(f, "Publishing of {} was cancelled", package)
      }
    }
  }
}

/// Result type alias for coherence-build
pub type CoherenceResult<T> = Result<T, CoherenceError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> CoherenceResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> CoherenceResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<CoherenceError>,
{
  fn context(self, ctx: impl Into<String>) -> CoherenceResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> CoherenceResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &CoherenceError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exit_codes_by_category() {
    let integrity = CoherenceError::from(IntegrityError::DependencyCycle {
      packages: vec!["a".to_string(), "b".to_string()],
    });
    assert_eq!(integrity.exit_code(), ExitCode::Validation);

    let publish = CoherenceError::from(PublishError::PushFailed {
      package: "A 1.0.0".to_string(),
      attempts: 5,
      reason: "timeout".to_string(),
    });
    assert_eq!(publish.exit_code(), ExitCode::System);

    let duplicate = CoherenceError::from(CollectionError::DuplicatePackage {
      id: "A".to_string(),
      first_source: "repo1".to_string(),
      second_source: "repo2".to_string(),
    });
    assert_eq!(duplicate.exit_code(), ExitCode::User);
    assert!(duplicate.help_message().is_some());
  }

  #[test]
  fn test_context_is_appended() {
    let err = CoherenceError::message("boom").context("while reading manifest");
    assert_eq!(err.to_string(), "boom\nwhile reading manifest");
  }

  #[test]
  fn test_cycle_display_lists_members() {
    let err = IntegrityError::DependencyCycle {
      packages: vec!["A".to_string(), "B".to_string(), "A".to_string()],
    };
    assert_eq!(err.to_string(), "Circular dependency detected: A → B → A");
  }
}
