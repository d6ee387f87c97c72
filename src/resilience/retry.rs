use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{error, warn};

use crate::error::SdError;

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetrySettings {
    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self { attempts: 1, base_delay_ms: 0, max_delay_ms: 0 }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts are exhausted. The delay doubles up to `max_delay_ms`.
    pub async fn run_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T, SdError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SdError>>,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!("Attempt {attempt}/{attempts} failed: {e}");
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(self.max_delay_ms);
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        error!("all {attempt} attempts failed: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}
