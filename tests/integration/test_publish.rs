//! Tests for the `publish` command against a folder feed

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_publish_refuses_incoherent_drop() -> Result<()> {
  let (drop, manifests) = abc_drop()?;
  let feed = drop.feed_dir().display().to_string();

  let output = run_coherence(&drop.path, &args("publish", &manifests, &["--feed", &feed]))?;

  assert_eq!(output.status.code(), Some(3));
  assert!(!drop.feed_dir().exists());

  Ok(())
}

#[test]
fn test_publish_to_folder_feed() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;
  let feed = drop.feed_dir().display().to_string();

  let output = run_coherence_ok(&drop.path, &args("publish", &manifests, &["--feed", &feed]))?;

  assert!(stdout(&output).contains("✅ Published 3 package(s), skipped 0"));
  assert_eq!(
    drop.feed_contents()?,
    vec!["a.1.0.0.nupkg", "b.2.0.0.nupkg", "c.1.0.0.nupkg"]
  );

  Ok(())
}

#[test]
fn test_publish_twice_skips_existing() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;
  let feed = drop.feed_dir().display().to_string();

  run_coherence_ok(&drop.path, &args("publish", &manifests, &["--feed", &feed]))?;
  let output = run_coherence_ok(&drop.path, &args("publish", &manifests, &["--feed", &feed, "--json"]))?;

  let summary: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(summary["published"], 0);
  assert_eq!(summary["skipped"], 3);
  assert!(
    summary["packages"]
      .as_array()
      .unwrap()
      .iter()
      .all(|p| p["status"] == "skipped")
  );

  Ok(())
}

#[test]
fn test_publish_json_orders_by_degree() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;
  let feed = drop.feed_dir().display().to_string();

  let output = run_coherence_ok(
    &drop.path,
    &args("publish", &manifests, &["--feed", &feed, "--json", "--max-parallel", "1"]),
  )?;

  let summary: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let packages = summary["packages"].as_array().unwrap();
  assert_eq!(packages.len(), 3);
  assert_eq!(packages[0]["id"], "A");
  assert_eq!(packages[0]["degree"], 1);
  assert!(packages[1..].iter().all(|p| p["degree"] == 3));

  Ok(())
}

#[test]
fn test_publish_dry_run_pushes_nothing() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;
  let feed = drop.feed_dir().display().to_string();

  let output = run_coherence_ok(&drop.path, &args("publish", &manifests, &["--feed", &feed, "--dry-run"]))?;

  let out = stdout(&output);
  assert!(out.contains("📋 Publish plan"));
  assert!(out.contains("Dry run"));
  assert!(!drop.feed_dir().exists());

  Ok(())
}

#[test]
fn test_publish_empty_universe() -> Result<()> {
  let drop = TestDrop::new()?;
  let manifest = drop.add_repository("empty", false, vec![])?;
  let manifests = vec![manifest.display().to_string()];
  let feed = drop.feed_dir().display().to_string();

  let output = run_coherence_ok(&drop.path, &args("publish", &manifests, &["--feed", &feed, "--json"]))?;

  let summary: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(summary["published"], 0);
  assert_eq!(summary["packages"].as_array().unwrap().len(), 0);

  Ok(())
}

#[test]
fn test_publish_rejects_unknown_feed_scheme() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;

  let output = run_coherence(&drop.path, &args("publish", &manifests, &["--feed", "ftp://example.com/feed"]))?;

  assert!(!output.status.success());
  assert!(stderr(&output).contains("Invalid feed"));

  Ok(())
}

#[test]
fn test_publish_invalid_max_parallel() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;
  let feed = drop.feed_dir().display().to_string();

  let output = run_coherence(
    &drop.path,
    &args("publish", &manifests, &["--feed", &feed, "--max-parallel", "0"]),
  )?;

  assert_eq!(output.status.code(), Some(1));

  Ok(())
}

#[test]
fn test_publish_dry_run_writes_props() -> Result<()> {
  let (drop, manifests) = coherent_drop()?;
  let feed = drop.feed_dir().display().to_string();

  run_coherence_ok(
    &drop.path,
    &args("publish", &manifests, &["--feed", &feed, "--dry-run", "--props", "dependencies.props"]),
  )?;

  let props = std::fs::read_to_string(drop.path.join("dependencies.props"))?;
  assert!(props.contains("<A>1.0.0</A>"));
  assert!(!drop.feed_dir().exists());

  Ok(())
}
