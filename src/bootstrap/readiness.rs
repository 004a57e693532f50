//! Bounded readiness polling.

use crate::config::RetryPolicy;
use std::future::Future;
use tracing::{info, warn};

/// Result of polling a readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// The probe succeeded on attempt `attempts` (1-based)
    Ready { attempts: u32 },
    /// Every probe in the budget failed
    TimedOut { attempts: u32 },
}

impl ReadinessOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessOutcome::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ReadinessOutcome::Ready { attempts } | ReadinessOutcome::TimedOut { attempts } => {
                *attempts
            }
        }
    }
}

/// Call `probe` up to `policy.attempts` times, sleeping `policy.interval` after
/// each failed attempt. Exhausting the budget logs a warning and returns
/// [`ReadinessOutcome::TimedOut`]; it is never an error.
pub async fn wait_until_ready<F, Fut>(policy: RetryPolicy, target: &str, mut probe: F) -> ReadinessOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=policy.attempts {
        if probe().await {
            info!(target_service = target, attempt, "ready");
            return ReadinessOutcome::Ready { attempts: attempt };
        }
        info!(
            target_service = target,
            attempt,
            max = policy.attempts,
            "not ready yet, retrying in {}s",
            policy.interval.as_secs()
        );
        tokio::time::sleep(policy.interval).await;
    }

    warn!(
        target_service = target,
        attempts = policy.attempts,
        "timed out waiting for readiness; continuing anyway"
    );
    ReadinessOutcome::TimedOut {
        attempts: policy.attempts,
    }
}
