//! MSBuild props file for downstream restores
//!
//! After a successful check the verified partner versions (and optionally a
//! product version) are pinned in a `dependencies.props`-style file:
//!
//! ```xml
//! <Project>
//!   <PropertyGroup>
//!     <ProductVersion>1.0.0</ProductVersion>
//!     <Microsoft-NETCore-Runtime>1.0.0</Microsoft-NETCore-Runtime>
//!   </PropertyGroup>
//! </Project>
//! ```

use crate::core::config::PropsConfig;
use crate::core::error::{CoherenceResult, ResultExt};
use crate::model::Universe;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Property name/value pairs in output order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyProps {
  properties: Vec<(String, String)>,
}

impl DependencyProps {
  /// Collect the product version and every partner package version
  pub fn from_universe(universe: &Universe, config: &PropsConfig) -> Self {
    let mut properties = Vec::new();

    if let Some(product) = &config.product_package {
      match universe.lookup(product) {
        Some(idx) => properties.push((
          config.product_property.clone(),
          universe.record(idx).version().to_string(),
        )),
        None => warn!(package = %product, "product package not found, omitting product version"),
      }
    }

    let mut partners: Vec<_> = universe.records().iter().filter(|r| r.is_partner()).collect();
    partners.sort_by_key(|r| r.key());
    properties.extend(
      partners
        .into_iter()
        .map(|r| (property_name(r.id()), r.version().to_string())),
    );

    Self { properties }
  }

  pub fn len(&self) -> usize {
    self.properties.len()
  }

  pub fn render(&self) -> String {
    let mut output = String::from("<Project>\n  <PropertyGroup>\n");
    for (name, value) in &self.properties {
      output.push_str(&format!("    <{}>{}</{}>\n", name, value, name));
    }
    output.push_str("  </PropertyGroup>\n</Project>\n");
    output
  }

  pub fn write(&self, path: &Path) -> CoherenceResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, self.render()).with_context(|| format!("Failed to write props file {}", path.display()))?;
    info!(path = %path.display(), properties = self.len(), "wrote dependency props");
    Ok(())
  }
}

/// `dotnet restore` rejects '.' in property names
fn property_name(id: &str) -> String {
  id.replace('.', "-")
}
