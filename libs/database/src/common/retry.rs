//! Startup retry for backing-store connections
//!
//! Backing stores may come up after the service does (compose, k8s
//! rollouts), so the connectors offer a retried variant of `connect`.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff policy for connection attempts
///
/// The delay doubles from `first_delay` on every retry, capped at `cap`.
/// `attempts` counts retries after the initial try.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub attempts: u32,
    pub first_delay: Duration,
    pub cap: Duration,
}

impl Backoff {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            first_delay: Duration::from_millis(100),
            cap: Duration::from_secs(5),
        }
    }

    pub fn with_first_delay(mut self, delay: Duration) -> Self {
        self.first_delay = delay;
        self
    }

    pub fn with_cap(mut self, cap: Duration) -> Self {
        self.cap = cap;
        self
    }

    /// Delay before retry `attempt` (1-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.first_delay.saturating_mul(1 << exponent).min(self.cap)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Run a fallible async operation under a backoff policy
///
/// Returns the first success, or the last error once the policy's
/// attempts are spent. `label` names the target store in the logs.
pub async fn with_retries<F, Fut, T, E>(
    label: &str,
    policy: Backoff,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(label, attempt, "Connected after retrying");
                }
                return Ok(value);
            }
            Err(err) => {
                attempt += 1;
                if attempt > policy.attempts {
                    warn!(label, attempts = policy.attempts, error = %err, "Giving up on connection");
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                debug!(label, attempt, ?delay, error = %err, "Connection failed; retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
