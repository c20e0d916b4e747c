//! Test helpers for integration tests

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A build drop: repository manifests plus their package archives
pub struct TestDrop {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestDrop {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Write a repository manifest and a dummy archive for each package
  pub fn add_repository(&self, repository: &str, partner: bool, packages: Vec<Value>) -> Result<PathBuf> {
    let repo_dir = self.path.join(repository);
    std::fs::create_dir_all(&repo_dir)?;

    for package in &packages {
      let file = package["path"].as_str().context("package without path")?;
      std::fs::write(repo_dir.join(file), format!("archive of {}", file))?;
    }

    let manifest = json!({
      "repository": repository,
      "build_number": "20261017.1",
      "partner": partner,
      "packages": packages,
    });
    let manifest_path = repo_dir.join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    Ok(manifest_path)
  }

  /// Write coherence.toml into the drop root
  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("coherence.toml"), content)?;
    Ok(())
  }

  pub fn feed_dir(&self) -> PathBuf {
    self.path.join("feed")
  }

  /// Archive names currently on the folder feed, sorted
  pub fn feed_contents(&self) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(self.feed_dir())? {
      names.push(entry?.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
  }
}

/// A manifest package entry; `deps` are (id, range) under net8.0
pub fn package(id: &str, version: &str, deps: &[(&str, &str)]) -> Value {
  let dependencies: Vec<Value> = deps
    .iter()
    .map(|(dep_id, range)| json!({ "id": dep_id, "version": range }))
    .collect();

  json!({
    "id": id,
    "version": version,
    "path": format!("{}.{}.nupkg", id, version),
    "dependency_groups": [
      { "target_framework": "net8.0", "dependencies": dependencies }
    ],
  })
}

/// Run the coherence-build CLI, whatever its exit status
pub fn run_coherence(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_coherence-build");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("COHERENCE_DISABLE_CHECK")
    .env_remove("COHERENCE_FEED_API_KEY")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run coherence-build")
}

/// Run the coherence-build CLI and require success
pub fn run_coherence_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_coherence(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "coherence-build command failed: coherence-build {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

/// The A/B/C drop: A is a partner package, C pins an older A
pub fn abc_drop() -> Result<(TestDrop, Vec<String>)> {
  let drop = TestDrop::new()?;
  let partner = drop.add_repository("partner", true, vec![package("A", "1.0.0", &[])])?;
  let product = drop.add_repository(
    "product",
    false,
    vec![
      package("B", "2.0.0", &[("A", "1.0.0")]),
      package("C", "1.0.0", &[("A", "0.9.0")]),
    ],
  )?;
  let manifests = vec![partner.display().to_string(), product.display().to_string()];
  Ok((drop, manifests))
}

/// A coherent A/B/C drop where B and C both depend on A
pub fn coherent_drop() -> Result<(TestDrop, Vec<String>)> {
  let drop = TestDrop::new()?;
  let partner = drop.add_repository("partner", true, vec![package("A", "1.0.0", &[])])?;
  let product = drop.add_repository(
    "product",
    false,
    vec![
      package("B", "2.0.0", &[("A", "1.0.0")]),
      package("C", "1.0.0", &[("A", "[1.0.0, 2.0.0)")]),
    ],
  )?;
  let manifests = vec![partner.display().to_string(), product.display().to_string()];
  Ok((drop, manifests))
}

/// Build an argument list: `command` + manifests + extra flags
pub fn args<'a>(command: &'a str, manifests: &'a [String], extra: &[&'a str]) -> Vec<&'a str> {
  let mut args = vec![command];
  args.extend(manifests.iter().map(String::as_str));
  args.extend_from_slice(extra);
  args
}
