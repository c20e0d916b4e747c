//! Package versions and dependency version ranges
//!
//! Versions are semver, with the lenient forms package feeds accept
//! (`1.0` and `1.0.0.0`) normalized to three components. Ranges use interval
//! notation: `1.0.0` means "at least 1.0.0", `[1.0.0]` is exact,
//! `[1.0.0, 2.0.0)` is bounded and `(, 2.0.0]` has no lower bound.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// Parse a package version, accepting two- and four-part numeric forms
pub fn parse_version(raw: &str) -> Result<Version, String> {
  let raw = raw.trim();
  if let Ok(version) = Version::parse(raw) {
    return Ok(version);
  }

  let split_at = raw.find(['-', '+']).unwrap_or(raw.len());
  let (numeric, suffix) = raw.split_at(split_at);
  let mut parts: Vec<&str> = numeric.split('.').collect();

  if parts.len() == 4 && parts[3].trim_start_matches('0').is_empty() {
    parts.pop();
  }
  if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
  {
    return Err(format!("'{}' is not a valid package version", raw));
  }
  while parts.len() < 3 {
    parts.push("0");
  }

  let normalized = format!("{}{}", parts.join("."), suffix);
  Version::parse(&normalized).map_err(|e| format!("'{}' is not a valid package version: {}", raw, e))
}

/// Exact version identity: prerelease counts, build metadata does not
pub fn same_version(a: &Version, b: &Version) -> bool {
  a.cmp_precedence(b) == Ordering::Equal
}

/// A parsed dependency version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
  raw: String,
  min: Option<Version>,
  max: Option<Version>,
}

impl VersionRange {
  /// Parse a range in interval notation or a bare minimum version
  pub fn parse(raw: &str) -> Result<Self, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err("empty version range".to_string());
    }

    let first = trimmed.chars().next().unwrap_or_default();
    if first != '[' && first != '(' {
      return Ok(Self {
        raw: trimmed.to_string(),
        min: Some(parse_version(trimmed)?),
        max: None,
      });
    }

    let last = trimmed.chars().last().unwrap_or_default();
    if last != ']' && last != ')' {
      return Err(format!("unterminated version range '{}'", trimmed));
    }

    let inner = &trimmed[1..trimmed.len() - 1];
    let min_inclusive = first == '[';
    let max_inclusive = last == ']';

    let (min, max) = match inner.split_once(',') {
      Some((lo, hi)) => (parse_bound(lo)?, parse_bound(hi)?),
      None => {
        // [1.0.0] pins a single version; (1.0.0) is meaningless
        if !(min_inclusive && max_inclusive) {
          return Err(format!("single-version range '{}' must use brackets", trimmed));
        }
        let exact = parse_bound(inner)?.ok_or_else(|| format!("empty version range '{}'", trimmed))?;
        (Some(exact.clone()), Some(exact))
      }
    };

    if min.is_none() && max.is_none() {
      return Err(format!("version range '{}' has no bounds", trimmed));
    }

    Ok(Self {
      raw: trimmed.to_string(),
      min,
      max,
    })
  }

  /// The range as written in the package metadata
  pub fn as_str(&self) -> &str {
    &self.raw
  }

  /// Coherence is exact equality against the minimum, not range satisfaction
  pub fn is_coherent_with(&self, actual: &Version) -> bool {
    self.min.as_ref().is_some_and(|min| same_version(min, actual))
  }
}

impl fmt::Display for VersionRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.min {
      Some(min) => write!(f, "{}", min),
      None => write!(f, "{}", self.raw),
    }
  }
}

fn parse_bound(raw: &str) -> Result<Option<Version>, String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    Ok(None)
  } else {
    parse_version(trimmed).map(Some)
  }
}

#[cfg(test)]
impl VersionRange {
  fn min_version(&self) -> Option<&Version> {
    self.min.as_ref()
  }

  fn max_version(&self) -> Option<&Version> {
    self.max.as_ref()
  }
}
