//! Target framework names as they appear in package dependency groups
//!
//! Packages declare dependency groups either with a full framework name
//! (`.NETFramework,Version=v4.5,Profile=Client`) or with the short folder
//! form (`net45`, `netstandard1.3`, `portable-net45+win8`). Both are
//! normalized to an identifier plus optional version and profile.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const PORTABLE_IDENTIFIER: &str = ".NETPortable";

/// Short-name prefixes, longest first so `netstandard` wins over `net`.
const SHORT_NAMES: &[(&str, &str)] = &[
  ("netstandardapp", ".NETStandardApp"),
  ("netstandard", ".NETStandard"),
  ("netcoreapp", ".NETCoreApp"),
  ("netcore", ".NETCore"),
  ("netplatform", ".NETPlatform"),
  ("netmf", ".NETMicroFramework"),
  ("net", ".NETFramework"),
  ("dnxcore", "DNXCore"),
  ("dnx", "DNX"),
  ("dotnet", ".NETPlatform"),
  ("uap", "UAP"),
  ("wpa", "WindowsPhoneApp"),
  ("wp", "WindowsPhone"),
  ("win", "Windows"),
  ("sl", "Silverlight"),
  ("monoandroid", "MonoAndroid"),
  ("monotouch", "MonoTouch"),
  ("monomac", "MonoMac"),
  ("xamarinios", "Xamarin.iOS"),
  ("xamarinmac", "Xamarin.Mac"),
  ("xamarintvos", "Xamarin.TVOS"),
  ("xamarinwatchos", "Xamarin.WatchOS"),
  ("tizen", "Tizen"),
];

/// A parsed target framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFramework {
  /// Framework identifier, e.g. `.NETStandard`
  pub identifier: String,
  /// Version as written (`v4.5`, `1.3`), if any
  pub version: Option<String>,
  /// Profile (PCL profiles carry the platform list here)
  pub profile: Option<String>,
}

impl TargetFramework {
  /// Parse a full or short framework name
  pub fn parse(raw: &str) -> Result<Self, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err("empty target framework".to_string());
    }

    if trimmed.contains(',') || trimmed.starts_with('.') {
      Self::parse_full(trimmed)
    } else {
      Self::parse_short(trimmed)
    }
  }

  fn parse_full(raw: &str) -> Result<Self, String> {
    let mut parts = raw.split(',').map(str::trim);
    let identifier = parts
      .next()
      .filter(|s| !s.is_empty())
      .ok_or_else(|| format!("missing framework identifier in '{}'", raw))?;

    let mut version = None;
    let mut profile = None;
    for part in parts {
      let (key, value) = part
        .split_once('=')
        .ok_or_else(|| format!("expected key=value in '{}'", raw))?;
      match key.trim().to_ascii_lowercase().as_str() {
        "version" => version = Some(value.trim().to_string()),
        "profile" => profile = Some(value.trim().to_string()),
        other => return Err(format!("unknown framework component '{}' in '{}'", other, raw)),
      }
    }

    Ok(Self {
      identifier: identifier.to_string(),
      version,
      profile,
    })
  }

  fn parse_short(raw: &str) -> Result<Self, String> {
    let lower = raw.to_ascii_lowercase();

    // portable-net45+win8 and the versioned portable45-net45+win8
    if let Some(rest) = lower.strip_prefix("portable") {
      let profile = rest
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .strip_prefix('-')
        .filter(|p| !p.is_empty())
        .ok_or_else(|| format!("portable framework '{}' has no profile", raw))?;
      return Ok(Self {
        identifier: PORTABLE_IDENTIFIER.to_string(),
        version: None,
        profile: Some(profile.to_string()),
      });
    }

    let split = lower.find(|c: char| c.is_ascii_digit()).unwrap_or(lower.len());
    let (name, rest) = lower.split_at(split);
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
      return Err(format!("invalid framework name '{}'", raw));
    }

    let (version, profile) = match rest.split_once('-') {
      Some((v, p)) => (v, Some(p.to_string())),
      None => (rest, None),
    };
    if !version.chars().all(|c| c.is_ascii_digit() || c == '.') {
      return Err(format!("invalid framework version in '{}'", raw));
    }

    // Unknown names (any, native, vendor frameworks) stay opaque
    let compact = name.replace('.', "");
    let identifier = SHORT_NAMES
      .iter()
      .find(|(short, _)| *short == compact)
      .map(|(_, full)| full.to_string())
      .unwrap_or_else(|| raw[..split].to_string());

    Ok(Self {
      identifier,
      version: (!version.is_empty()).then(|| version.to_string()),
      profile,
    })
  }

  /// Portable class library targets are exempt from coherence enforcement
  pub fn is_portable(&self) -> bool {
    self.identifier.eq_ignore_ascii_case(PORTABLE_IDENTIFIER)
  }

  /// Case-insensitive identifier comparison
  pub fn has_identifier(&self, identifier: &str) -> bool {
    self.identifier.eq_ignore_ascii_case(identifier)
  }
}

impl fmt::Display for TargetFramework {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.identifier)?;
    if let Some(version) = &self.version {
      write!(f, ",Version={}", version)?;
    }
    if let Some(profile) = &self.profile {
      write!(f, ",Profile={}", profile)?;
    }
    Ok(())
  }
}
