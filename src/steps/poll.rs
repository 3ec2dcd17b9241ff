//! Bounded fixed-interval polling

use crate::steps::StepError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How often and how long to poll a status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Number of status requests before giving up
    pub retries: u32,

    /// Delay between two status requests
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(retries: u32, interval: Duration) -> Self {
        Self { retries, interval }
    }

    /// Policy used for script collection deployments
    pub fn script_collection() -> Self {
        Self::new(14, Duration::from_secs(3))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::script_collection()
    }
}

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision<T> {
    /// Not settled yet, ask again after the interval
    Pending,
    /// Settled with a value
    Done(T),
}

/// Call `probe` until it settles, errors, or the retry budget runs out
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, mut probe: F) -> Result<T, StepError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollDecision<T>, StepError>>,
{
    let mut remaining = policy.retries;

    while remaining > 0 {
        let attempt = policy.retries - remaining + 1;
        debug!("poll attempt {}/{}", attempt, policy.retries);

        match probe().await? {
            PollDecision::Done(value) => return Ok(value),
            PollDecision::Pending => {
                remaining -= 1;
                if remaining > 0 {
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    warn!("status still pending after {} attempts", policy.retries);
    Err(StepError::PollExhausted {
        attempts: policy.retries,
    })
}
