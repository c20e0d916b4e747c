//! Dependency-ordered feed publisher
//!
//! Groups from the publish plan are pushed one after another, lowest degree
//! first. Inside a group a bounded set of workers drains a shared queue.
//! A package that runs out of attempts cancels every other worker, and no
//! later group starts.

use crate::core::config::PublishConfig;
use crate::core::error::{CoherenceError, CoherenceResult, PublishError};
use crate::model::{PackageRecord, Universe};
use crate::order::PublishPlan;
use crate::publish::feed::PackageFeed;
use crate::publish::retry::{RetryError, RetryPolicy, retry_with_policy};
use chrono::{DateTime, Utc};
use semver::Version;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Limits and policies for one publish run
#[derive(Debug, Clone)]
pub struct PublishOptions {
  pub max_parallel: usize,
  pub max_attempts: u32,
  pub attempt_timeout: Duration,
  pub retry_delay: Duration,
  pub retry_jitter: f64,
  /// Sources whose packages are pushed without asking the feed first
  pub always_push_sources: Vec<String>,
}

impl Default for PublishOptions {
  fn default() -> Self {
    Self::from_config(&PublishConfig::default())
  }
}

impl PublishOptions {
  pub fn from_config(config: &PublishConfig) -> Self {
    Self {
      max_parallel: config.max_parallel,
      max_attempts: config.max_attempts,
      attempt_timeout: config.attempt_timeout(),
      retry_delay: config.retry_delay(),
      retry_jitter: config.retry_jitter,
      always_push_sources: config.always_push_sources.clone(),
    }
  }

  fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::new(self.max_attempts, self.retry_delay, self.retry_jitter)
  }
}

/// What happened to one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PushOutcome {
  Published { attempts: u32 },
  /// Already on the feed
  Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageOutcome {
  pub id: String,
  pub version: String,
  pub degree: u32,
  #[serde(flatten)]
  pub outcome: PushOutcome,
}

/// Result of a successful publish run
#[derive(Debug, Clone, Serialize)]
pub struct PublishSummary {
  pub plan_id: String,
  pub feed: String,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub published: usize,
  pub skipped: usize,
  pub packages: Vec<PackageOutcome>,
}

impl PublishSummary {
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();
    for package in &self.packages {
      match package.outcome {
        PushOutcome::Published { attempts } if attempts > 1 => output.push_str(&format!(
          "   📦 {} {} (after {} attempts)\n",
          package.id, package.version, attempts
        )),
        PushOutcome::Published { .. } => output.push_str(&format!("   📦 {} {}\n", package.id, package.version)),
        PushOutcome::Skipped => output.push_str(&format!(
          "   ⏭️  {} {} (already published)\n",
          package.id, package.version
        )),
      }
    }

    let elapsed = (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0;
    output.push_str(&format!(
      "\n✅ Published {} package(s), skipped {} to {} in {:.1}s\n",
      self.published, self.skipped, self.feed, elapsed
    ));
    output
  }
}

/// Called after each package finishes (progress reporting)
pub type ProgressHook = Arc<dyn Fn(&PackageOutcome) + Send + Sync>;

/// One queued push
#[derive(Debug, Clone)]
struct PushJob {
  id: String,
  version: Version,
  path: PathBuf,
  source: String,
  degree: u32,
}

impl PushJob {
  fn new(record: &PackageRecord, degree: u32) -> Self {
    Self {
      id: record.id().to_string(),
      version: record.version().clone(),
      path: record.package_path().clone(),
      source: record.source().to_string(),
      degree,
    }
  }

  fn label(&self) -> String {
    format!("{} {}", self.id, self.version)
  }

  fn outcome(&self, outcome: PushOutcome) -> PackageOutcome {
    PackageOutcome {
      id: self.id.clone(),
      version: self.version.to_string(),
      degree: self.degree,
      outcome,
    }
  }
}

/// Everything a worker task needs, cheap to clone
#[derive(Clone)]
struct WorkerContext {
  feed: Arc<dyn PackageFeed>,
  api_key: Option<Arc<str>>,
  retry: RetryPolicy,
  attempt_timeout: Duration,
  always_push_sources: Arc<[String]>,
  cancel: CancellationToken,
  on_progress: Option<ProgressHook>,
}

impl WorkerContext {
  fn always_push(&self, source: &str) -> bool {
    self.always_push_sources.iter().any(|s| s.eq_ignore_ascii_case(source))
  }
}

/// Pushes a verified universe to a feed in plan order
pub struct FeedPublisher {
  feed: Arc<dyn PackageFeed>,
  api_key: Option<String>,
  options: PublishOptions,
  cancel: CancellationToken,
  on_progress: Option<ProgressHook>,
}

impl FeedPublisher {
  pub fn new(feed: Arc<dyn PackageFeed>, options: PublishOptions) -> Self {
    Self {
      feed,
      api_key: None,
      options,
      cancel: CancellationToken::new(),
      on_progress: None,
    }
  }

  pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
    self.api_key = api_key;
    self
  }

  pub fn with_progress(mut self, hook: ProgressHook) -> Self {
    self.on_progress = Some(hook);
    self
  }

  /// Token that stops the run when cancelled (e.g. on Ctrl-C)
  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  /// Push every package in `plan`, group by group
  pub async fn publish(&self, universe: &Universe, plan: &PublishPlan) -> CoherenceResult<PublishSummary> {
    let started_at = Utc::now();
    let context = WorkerContext {
      feed: Arc::clone(&self.feed),
      api_key: self.api_key.as_deref().map(Arc::from),
      retry: self.options.retry_policy(),
      attempt_timeout: self.options.attempt_timeout,
      always_push_sources: self.options.always_push_sources.clone().into(),
      cancel: self.cancel.clone(),
      on_progress: self.on_progress.clone(),
    };

    let mut packages = Vec::with_capacity(plan.len());

    for group in &plan.groups {
      if self.cancel.is_cancelled() {
        let package = group.packages.first().map(|p| format!("{} {}", p.id, p.version));
        return Err(
          PublishError::Cancelled {
            package: package.unwrap_or_default(),
          }
          .into(),
        );
      }

      let jobs: VecDeque<PushJob> = group
        .packages
        .iter()
        .map(|p| PushJob::new(universe.record(p.index), group.degree))
        .collect();
      let workers = self.options.max_parallel.min(jobs.len()).max(1);
      info!(
        degree = group.degree,
        packages = jobs.len(),
        workers,
        "publishing degree group"
      );

      let queue = Arc::new(Mutex::new(jobs));
      let mut tasks = JoinSet::new();
      for _ in 0..workers {
        tasks.spawn(run_worker(context.clone(), Arc::clone(&queue)));
      }

      let mut failures: Vec<CoherenceError> = Vec::new();
      while let Some(joined) = tasks.join_next().await {
        match joined {
          Ok(Ok(mut done)) => packages.append(&mut done),
          Ok(Err(err)) => {
            self.cancel.cancel();
            failures.push(err);
          }
          Err(join_err) => {
            self.cancel.cancel();
            failures.push(join_err.into());
          }
        }
      }

      if let Some(err) = pick_failure(failures) {
        return Err(err);
      }
    }

    packages.sort_by(|a, b| {
      a.degree
        .cmp(&b.degree)
        .then_with(|| a.id.to_lowercase().cmp(&b.id.to_lowercase()))
    });
    let published = packages
      .iter()
      .filter(|p| matches!(p.outcome, PushOutcome::Published { .. }))
      .count();

    Ok(PublishSummary {
      plan_id: plan.id.to_string(),
      feed: self.feed.location().to_string(),
      started_at,
      finished_at: Utc::now(),
      published,
      skipped: packages.len() - published,
      packages,
    })
  }
}

/// The terminal failure wins over the cancellations it caused
fn pick_failure(mut failures: Vec<CoherenceError>) -> Option<CoherenceError> {
  let terminal = failures
    .iter()
    .position(|e| !matches!(e, CoherenceError::Publish(PublishError::Cancelled { .. })));
  match terminal {
    Some(idx) => Some(failures.swap_remove(idx)),
    None => failures.into_iter().next(),
  }
}

async fn run_worker(
  context: WorkerContext,
  queue: Arc<Mutex<VecDeque<PushJob>>>,
) -> CoherenceResult<Vec<PackageOutcome>> {
  let mut outcomes = Vec::new();

  loop {
    let Some(job) = queue.lock().await.pop_front() else {
      break;
    };
    // A cancel with work still queued fails the run
    if context.cancel.is_cancelled() {
      return Err(PublishError::Cancelled { package: job.label() }.into());
    }

    let outcome = push_package(&context, &job).await?;
    if let Some(hook) = &context.on_progress {
      hook(&outcome);
    }
    outcomes.push(outcome);
  }

  Ok(outcomes)
}

async fn push_package(context: &WorkerContext, job: &PushJob) -> CoherenceResult<PackageOutcome> {
  let label = job.label();

  if !context.always_push(&job.source) {
    match context.feed.exists(&job.id, &job.version).await {
      Ok(true) => {
        info!(package = %label, "package already published, skipping");
        return Ok(job.outcome(PushOutcome::Skipped));
      }
      Ok(false) => {}
      Err(err) => warn!(package = %label, error = %err, "existence check failed, pushing anyway"),
    }
  }

  let max_attempts = context.retry.max_attempts;
  let result = retry_with_policy(&context.retry, &context.cancel, |attempt| {
    let label = &label;
    async move {
      info!(package = %label, attempt, max_attempts, "pushing package");
      let push = context.feed.push(
        &job.id,
        &job.version,
        &job.path,
        context.api_key.as_deref(),
        context.attempt_timeout,
      );

      match tokio::time::timeout(context.attempt_timeout, push).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => {
          warn!(package = %label, attempt, max_attempts, error = %err, "push attempt failed");
          Err(err.to_string())
        }
        Err(_) => {
          let reason = format!("timed out after {}s", context.attempt_timeout.as_secs_f64());
          warn!(package = %label, attempt, max_attempts, error = %reason, "push attempt failed");
          Err(reason)
        }
      }
    }
  })
  .await;

  match result {
    Ok(((), attempts)) => {
      info!(package = %label, attempts, "package published");
      Ok(job.outcome(PushOutcome::Published { attempts }))
    }
    Err(RetryError::Exhausted { attempts, last_error }) => {
      error!(package = %label, attempts, error = %last_error, "giving up on package");
      context.cancel.cancel();
      Err(
        PublishError::PushFailed {
          package: label,
          attempts,
          reason: last_error,
        }
        .into(),
      )
    }
    Err(RetryError::Cancelled) => Err(PublishError::Cancelled { package: label }.into()),
  }
}
