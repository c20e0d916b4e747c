//! Tests for the `plan` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_plan_groups_by_degree() -> Result<()> {
  let (drop, manifests) = abc_drop()?;

  let output = run_coherence_ok(&drop.path, &args("plan", &manifests, &["--json"]))?;
  let plan: serde_json::Value = serde_json::from_str(&stdout(&output))?;

  assert_eq!(plan["coherent"], false);
  let groups = plan["groups"].as_array().unwrap();
  assert_eq!(groups.len(), 2);

  assert_eq!(groups[0]["degree"], 1);
  assert_eq!(groups[0]["packages"][0]["id"], "A");

  assert_eq!(groups[1]["degree"], 3);
  let ids: Vec<&str> = groups[1]["packages"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["id"].as_str().unwrap())
    .collect();
  assert_eq!(ids, vec!["B", "C"]);

  Ok(())
}

#[test]
fn test_plan_id_is_stable() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;

  let first = run_coherence_ok(&drop.path, &args("plan", &manifests, &["--json"]))?;
  let reversed: Vec<String> = manifests.iter().rev().cloned().collect();
  let second = run_coherence_ok(&drop.path, &args("plan", &reversed, &["--json"]))?;

  let first: serde_json::Value = serde_json::from_str(&stdout(&first))?;
  let second: serde_json::Value = serde_json::from_str(&stdout(&second))?;
  assert_eq!(first["coherent"], true);
  assert_eq!(first["id"], second["id"]);

  Ok(())
}

#[test]
fn test_plan_human_output_warns_on_failure() -> Result<()> {
  let (drop, manifests) = abc_drop()?;

  let output = run_coherence_ok(&drop.path, &args("plan", &manifests, &[]))?;
  let out = stdout(&output);
  assert!(out.contains("📋 Publish plan"));
  assert!(out.contains("Degree 1:"));
  assert!(out.contains("Degree 3:"));
  assert!(out.contains("1 package(s) failed the coherence check"));

  Ok(())
}

#[test]
fn test_plan_lineup_goes_last() -> Result<()> {
  let drop = TestDrop::new()?;
  let mut lineup = package("Lineup", "1.0.0", &[]);
  lineup["lineup"] = serde_json::Value::Bool(true);
  let manifest = drop.add_repository("core", false, vec![package("Lib", "1.0.0", &[]), lineup])?;
  let manifests = vec![manifest.display().to_string()];

  let output = run_coherence_ok(&drop.path, &args("plan", &manifests, &["--json"]))?;
  let plan: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let groups = plan["groups"].as_array().unwrap();

  assert_eq!(groups[0]["packages"][0]["id"], "Lib");
  assert_eq!(groups[1]["degree"], u32::MAX);
  assert_eq!(groups[1]["packages"][0]["id"], "Lineup");

  Ok(())
}

#[test]
fn test_plan_rejects_cycles() -> Result<()> {
  let drop = TestDrop::new()?;
  let manifest = drop.add_repository(
    "loop",
    false,
    vec![
      package("Left", "1.0.0", &[("Right", "1.0.0")]),
      package("Right", "1.0.0", &[("Left", "1.0.0")]),
    ],
  )?;
  let manifests = vec![manifest.display().to_string()];

  let output = run_coherence(&drop.path, &args("plan", &manifests, &[]))?;

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("Circular dependency detected: Left → Right → Left"));

  Ok(())
}
