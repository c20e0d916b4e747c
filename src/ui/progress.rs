//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free, concurrency-friendly progress bars.
//! Publish workers run on several tokio tasks, so the bar is shared behind a
//! mutex and updated from the publisher's progress hook.

use linya::{Bar, Progress};
use std::sync::{Arc, Mutex};

/// Thread-safe progress bar over the packages being pushed
#[derive(Clone)]
pub struct PublishProgress {
  progress: Arc<Mutex<Progress>>,
  bar: Arc<Bar>,
}

impl PublishProgress {
  /// Create a new progress bar for `total` packages
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Arc::new(Mutex::new(progress)),
      bar: Arc::new(bar),
    }
  }

  /// Increment progress by 1 (a poisoned lock just stops drawing)
  pub fn inc(&self) {
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(&self.bar, 1);
    }
  }
}
