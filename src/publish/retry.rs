//! Bounded retry with jittered delay and cancellation
//!
//! The helper knows nothing about the operation or its error type. The
//! cancellation token is checked before every attempt, and the sleep between
//! attempts is raced against it.

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub delay: Duration,
  /// Fraction of `delay` applied as random +/- jitter
  pub jitter: f64,
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, delay: Duration, jitter: f64) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      delay,
      jitter: jitter.clamp(0.0, 1.0),
    }
  }

  /// Delay before the next attempt, with jitter applied
  pub fn next_delay(&self) -> Duration {
    if self.delay.is_zero() || self.jitter == 0.0 {
      return self.delay;
    }
    let factor = 1.0 + rand::rng().random_range(-self.jitter..=self.jitter);
    Duration::from_millis((self.delay.as_millis() as f64 * factor).max(0.0) as u64)
  }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
  /// Every attempt failed
  Exhausted { attempts: u32, last_error: E },
  /// The token was cancelled before the operation succeeded
  Cancelled,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RetryError::Exhausted { attempts, last_error } => {
        write!(f, "gave up after {} attempt(s): {}", attempts, last_error)
      }
      RetryError::Cancelled => write!(f, "cancelled"),
    }
  }
}

/// Run `op` until it succeeds, attempts run out, or `cancel` fires
///
/// `op` receives the 1-based attempt number.
pub async fn retry_with_policy<F, Fut, T, E>(
  policy: &RetryPolicy,
  cancel: &CancellationToken,
  mut op: F,
) -> Result<(T, u32), RetryError<E>>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, E>>,
{
  let mut attempt: u32 = 0;

  loop {
    if cancel.is_cancelled() {
      return Err(RetryError::Cancelled);
    }

    attempt += 1;
    let err = match op(attempt).await {
      Ok(value) => return Ok((value, attempt)),
      Err(err) => err,
    };

    if attempt >= policy.max_attempts {
      return Err(RetryError::Exhausted {
        attempts: attempt,
        last_error: err,
      });
    }

    let delay = policy.next_delay();
    if !delay.is_zero() {
      tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = cancel.cancelled() => return Err(RetryError::Cancelled),
      }
    }
  }
}
