// retry.rs
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How a geocoding call is retried when it yields no result.
///
/// The delay before attempt `n + 1` is `backoff_unit * n`, plus up to `jitter`
/// of random slack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    pub jitter: Duration,
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Pause after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.backoff_unit.saturating_mul(attempt);
        if self.jitter.is_zero() {
            return base;
        }
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        base + Duration::from_millis(extra)
    }

    /// Runs `op` until it yields a value or the attempts run out. Errors count
    /// as an empty attempt. No pause follows the last attempt.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Option<T>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => debug!(label, attempt, "no result"),
                Err(e) => warn!(label, attempt, error = %e, "attempt failed"),
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.delay_for(attempt)).await;
            }
        }
        None
    }
}
