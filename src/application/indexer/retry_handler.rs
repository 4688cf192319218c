//! Retry logic for block source calls that may fail temporarily

use std::future::Future;
use tokio::time::{sleep, Duration};

use crate::utils::logging;

#[derive(Debug, Clone)]
pub struct RetryHandler {
    max_attempts: u32,
    base_delay_ms: u64,
}

impl RetryHandler {
    pub fn new() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
        }
    }

    pub fn with_config(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `operation` until it succeeds or the attempts are used up,
    /// logging every failure with the operation and network name.
    ///
    /// Used for every block source read (tip height, hash lookup, block
    /// fetch). The delay doubles from `base_delay_ms` after each failure.
    /// Block application is never retried here; its errors are fatal.
    pub async fn execute_with_retry_and_logging<F, Fut, T, E>(
        &self,
        operation: F,
        operation_name: &str,
        network_name: &str,
    ) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        logging::log_info(&format!(
                            "[{}] {} succeeded after {} retries",
                            network_name, operation_name, attempt
                        ));
                    }
                    return Ok(result);
                }
                Err(e) => {
                    attempt += 1;

                    if attempt >= self.max_attempts {
                        logging::log_error(&format!(
                            "[{}] {} failed after {} attempts: {}",
                            network_name, operation_name, self.max_attempts, e
                        ));
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt);
                    logging::log_warning(&format!(
                        "[{}] {} failed (attempt {}/{}): {}. Retrying in {}ms",
                        network_name, operation_name, attempt, self.max_attempts, e, delay
                    ));

                    sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    /// Exponential backoff
    fn calculate_delay(&self, attempt: u32) -> u64 {
        self.base_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new()
    }
}
