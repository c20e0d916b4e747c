//! Tests for the `verify` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_verify_reports_stale_dependency() -> Result<()> {
  let (drop, manifests) = abc_drop()?;

  let output = run_coherence(&drop.path, &args("verify", &manifests, &[]))?;

  assert_eq!(output.status.code(), Some(3));
  let out = stdout(&output);
  assert!(out.contains("❌ C 1.0.0 (product)"));
  assert!(out.contains("A requires 0.9.0 but 1.0.0 was built"));
  assert!(!out.contains("❌ B 2.0.0"));
  assert!(stderr(&output).contains("Coherence check failed"));

  Ok(())
}

#[test]
fn test_verify_json_lists_failures() -> Result<()> {
  let (drop, manifests) = abc_drop()?;

  let output = run_coherence(&drop.path, &args("verify", &manifests, &["--json"]))?;
  assert_eq!(output.status.code(), Some(3));

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["success"], false);
  assert_eq!(report["verified"], 3);
  let failures = report["failures"].as_array().unwrap();
  assert_eq!(failures.len(), 1);
  assert_eq!(failures[0]["package"], "C");
  assert_eq!(failures[0]["mismatches"][0]["dependency_id"], "A");
  assert_eq!(failures[0]["mismatches"][0]["kind"], "version_mismatch");

  Ok(())
}

#[test]
fn test_verify_coherent_drop_passes() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;

  let output = run_coherence_ok(&drop.path, &args("verify", &manifests, &[]))?;
  assert!(stdout(&output).contains("✅ Coherence check passed (3 package(s) verified)"));

  Ok(())
}

#[test]
fn test_verify_empty_universe_passes() -> Result<()> {
  let drop = TestDrop::new()?;
  let manifest = drop.add_repository("empty", false, vec![])?;
  let manifests = vec![manifest.display().to_string()];

  let output = run_coherence_ok(&drop.path, &args("verify", &manifests, &[]))?;
  assert!(stdout(&output).contains("0 package(s) verified"));

  Ok(())
}

#[test]
fn test_verify_behavior_none_skips_check() -> Result<()> {
  let (drop, manifests) = abc_drop()?;

  let output = run_coherence_ok(&drop.path, &args("verify", &manifests, &["--behavior", "none"]))?;
  assert!(stdout(&output).contains("Coherence check disabled"));

  Ok(())
}

#[test]
fn test_verify_behavior_from_config() -> Result<()> {
  let (drop, manifests) = abc_drop()?;
  drop.write_config("[verify]\nskip_packages = [\"C\"]\n")?;

  let output = run_coherence_ok(&drop.path, &args("verify", &manifests, &[]))?;
  let out = stdout(&output);
  assert!(out.contains("Skipped: C"));
  assert!(out.contains("✅ Coherence check passed"));

  Ok(())
}

#[test]
fn test_verify_duplicate_package_is_user_error() -> Result<()> {
  let drop = TestDrop::new()?;
  let first = drop.add_repository("one", false, vec![package("Shared", "1.0.0", &[])])?;
  let second = drop.add_repository("two", false, vec![package("shared", "1.0.1", &[])])?;
  let manifests = vec![first.display().to_string(), second.display().to_string()];

  let output = run_coherence(&drop.path, &args("verify", &manifests, &[]))?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Multiple copies of package"));

  Ok(())
}

#[test]
fn test_verify_missing_manifest_fails() -> Result<()> {
  let drop = TestDrop::new()?;

  let output = run_coherence(&drop.path, &["verify", "does-not-exist.json"])?;
  assert!(!output.status.success());

  Ok(())
}

#[test]
fn test_verify_writes_props_for_partner_versions() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;
  drop.write_config("[props]\nproduct_package = \"B\"\nproduct_property = \"ProductVersion\"\n")?;

  run_coherence_ok(&drop.path, &args("verify", &manifests, &["--props", "out/dependencies.props"]))?;

  let props = std::fs::read_to_string(drop.path.join("out/dependencies.props"))?;
  assert_eq!(
    props,
    "<Project>\n  <PropertyGroup>\n    <ProductVersion>2.0.0</ProductVersion>\n    <A>1.0.0</A>\n  </PropertyGroup>\n</Project>\n"
  );

  Ok(())
}

#[test]
fn test_verify_failure_writes_no_props() -> Result<()> {
  let (drop, manifests) = abc_drop()?;

  let output = run_coherence(&drop.path, &args("verify", &manifests, &["--props", "dependencies.props"]))?;

  assert_eq!(output.status.code(), Some(3));
  assert!(!drop.path.join("dependencies.props").exists());

  Ok(())
}
