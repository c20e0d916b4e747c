//! Verification policy: the behavior bitset plus exemption lists

use crate::core::config::VerifyConfig;
use crate::model::TargetFramework;
use crate::model::package::package_key;
use bitflags::bitflags;
use std::collections::HashSet;

bitflags! {
  /// Package classifications the coherence check applies to
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct VerifyBehavior: u8 {
    const PRODUCT = 0b0000_0001;
    const PARTNER = 0b0000_0010;
    const ALL     = Self::PRODUCT.bits() | Self::PARTNER.bits();
  }
}

impl VerifyBehavior {
  /// Verification disabled
  pub const NONE: Self = Self::empty();
}

/// Everything the verifier needs to decide what to check
#[derive(Debug, Clone)]
pub struct VerifyPolicy {
  pub behavior: VerifyBehavior,
  skip_packages: HashSet<String>,
  exempt_frameworks: Vec<String>,
  partner_reference_frameworks: Vec<String>,
}

impl Default for VerifyPolicy {
  fn default() -> Self {
    Self::from_config(&VerifyConfig::default())
  }
}

impl VerifyPolicy {
  pub fn from_config(config: &VerifyConfig) -> Self {
    Self {
      behavior: config.behavior.into(),
      skip_packages: config.skip_packages.iter().map(|id| package_key(id)).collect(),
      exempt_frameworks: config.exempt_frameworks.clone(),
      partner_reference_frameworks: config.partner_reference_frameworks.clone(),
    }
  }

  #[cfg(test)]
  pub fn with_behavior(mut self, behavior: VerifyBehavior) -> Self {
    self.behavior = behavior;
    self
  }

  pub fn is_disabled(&self) -> bool {
    self.behavior.is_empty()
  }

  /// Whether a package with this classification is checked at all
  pub fn selects(&self, is_partner: bool) -> bool {
    if is_partner {
      self.behavior.contains(VerifyBehavior::PARTNER)
    } else {
      self.behavior.contains(VerifyBehavior::PRODUCT)
    }
  }

  pub fn is_skipped(&self, id: &str) -> bool {
    self.skip_packages.contains(&package_key(id))
  }

  /// Partner references under an exempt framework are ignored entirely
  pub fn is_exempt_framework(&self, framework: &TargetFramework) -> bool {
    self.exempt_frameworks.iter().any(|f| framework.has_identifier(f))
  }

  /// Partner references must stay inside the allow-list when one is configured
  pub fn allows_partner_reference(&self, framework: &TargetFramework) -> bool {
    self.partner_reference_frameworks.is_empty()
      || self
        .partner_reference_frameworks
        .iter()
        .any(|f| framework.has_identifier(f))
  }
}
