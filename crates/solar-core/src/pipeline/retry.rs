use super::VisionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Bounded retry with linear backoff around a model call.
/// Only `VisionError::Overloaded` is retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before retry `n` is `n * backoff_unit_ms`
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_unit_ms() -> u64 {
    2000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit_ms(),
        }
    }
}

impl RetryPolicy {
    /// Policy that tries once and never sleeps.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_unit_ms: 0,
        }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_unit_ms.saturating_mul(attempt as u64))
    }

    pub fn is_retryable(&self, error: &VisionError) -> bool {
        matches!(error, VisionError::Overloaded(_))
    }

    /// Runs `op` with the 1-based attempt number until it succeeds, fails with a
    /// terminal error, or attempts run out. Sleeps on the calling thread.
    pub fn run<T, F>(&self, mut op: F) -> Result<T, VisionError>
    where
        F: FnMut(u32) -> Result<T, VisionError>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max_attempts && self.is_retryable(&error) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "Model call attempt {}/{} failed ({}), retrying in {} ms",
                        attempt,
                        max_attempts,
                        error,
                        delay.as_millis()
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
