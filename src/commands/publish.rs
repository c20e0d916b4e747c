use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::commands::{collect_and_verify, write_props};
use crate::core::context::CoherenceContext;
use crate::core::error::{CoherenceResult, ResultExt};
use crate::order::PublishPlan;
use crate::publish::publisher::PackageOutcome;
use crate::publish::{FeedPublisher, PublishOptions, open_feed};
use crate::ui::progress::PublishProgress;

/// Options for the publish command
#[derive(Debug, Clone)]
pub struct PublishArgs {
  pub feed: String,
  pub api_key: Option<String>,
  /// Props file written once the check has passed
  pub props: Option<PathBuf>,
  pub dry_run: bool,
  pub progress: bool,
  pub json: bool,
}

/// Run the publish command
///
/// Collect → verify → gate → order → push. Nothing touches the feed unless
/// the coherence check passed.
pub fn run_publish(ctx: &CoherenceContext, manifests: &[PathBuf], args: PublishArgs) -> CoherenceResult<()> {
  let (universe, report) = collect_and_verify(ctx, manifests)?;
  if !report.success {
    if !args.json {
      print!("{}", report.to_human_readable());
    }
    report.ensure_success()?;
  }

  if let Some(path) = &args.props {
    write_props(ctx, &universe, path)?;
  }

  let plan = PublishPlan::build(&universe)?;

  if args.dry_run {
    if args.json {
      println!("{}", plan.to_json()?);
    } else {
      print!("{}", plan.to_human_readable());
      println!("\n🔍 Dry run: nothing was pushed to {}", args.feed);
    }
    return Ok(());
  }

  let feed = open_feed(&args.feed)?;
  if !args.json {
    println!(
      "🚀 Publishing {} package(s) to {} (plan {})\n",
      plan.len(),
      feed.location(),
      plan.id
    );
  }

  let mut publisher = FeedPublisher::new(feed, PublishOptions::from_config(&ctx.config.publish)).with_api_key(args.api_key);
  if args.progress && !plan.is_empty() {
    let progress = PublishProgress::new(plan.len(), "Publishing");
    publisher = publisher.with_progress(Arc::new(move |_: &PackageOutcome| progress.inc()));
  }

  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()
    .context("Failed to start the async runtime")?;

  let summary = runtime.block_on(async {
    let cancel = publisher.cancellation_token();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received, cancelling publish");
        cancel.cancel();
      }
    });
    publisher.publish(&universe, &plan).await
  })?;

  if args.json {
    println!("{}", serde_json::to_string_pretty(&summary)?);
  } else {
    print!("{}", summary.to_human_readable());
  }

  Ok(())
}
