//! State-polling watcher
//!
//! The control plane has no push notifications, so convergence is observed
//! by re-reading the resource. Each read is classified against the caller's
//! vocabulary for that resource kind:
//!
//! - **Target**: done, the snapshot from this read is returned
//! - **Pending**: still in progress, read again after the delay
//! - **Unknown**: anything else, which fails at once with no further reads
//!
//! Read errors and snapshots without a readable status are fatal too. The
//! watcher only observes; it never changes remote state.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, instrument};

use crate::config::WatchConfig;
use crate::context::ConvergeContext;
use crate::error::{BoxError, ConvergeError, Result};
use crate::progress::ProgressEvent;
use crate::retry::{deadline_after, pause};
use crate::snapshot::SnapshotError;

/// Expected state vocabulary and budget for one watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSpec {
    /// Transitional statuses that mean "keep polling"
    pub pending: Vec<String>,
    /// Terminal statuses that mean "done"
    pub target: Vec<String>,
    /// Overall deadline for the watch
    pub timeout: Duration,
    /// Pause between reads
    pub delay: Duration,
    /// Consecutive target reads required before succeeding
    pub continuous_target_occurrence: u32,
}

/// How a single observed status relates to a [`StateSpec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    Pending,
    Target,
    Unknown,
}

impl StateSpec {
    /// A spec with the default watch budget
    pub fn new<P, T>(pending: P, target: T) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self::from_config(&WatchConfig::default(), pending, target)
    }

    /// A spec using the budget from a `[watch]` config section
    pub fn from_config<P, T>(config: &WatchConfig, pending: P, target: T) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            timeout: config.timeout(),
            delay: config.delay(),
            continuous_target_occurrence: config.continuous_target_occurrence.max(1),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.continuous_target_occurrence = occurrences.max(1);
        self
    }

    /// Classify an observed status. Target wins if a status is listed in both.
    pub fn classify(&self, status: &str) -> StateClass {
        if self.target.iter().any(|s| s == status) {
            StateClass::Target
        } else if self.pending.iter().any(|s| s == status) {
            StateClass::Pending
        } else {
            StateClass::Unknown
        }
    }
}

/// Poll `read` until the resource reports a target status
///
/// `extract` pulls the status string out of each snapshot. On success the
/// snapshot from the most recent read is returned.
#[instrument(skip_all, fields(resource_id = %resource_id, space_id = %space_id))]
pub async fn retry_read_until_state_valid<'a, S, E, X, F, Fut>(
    ctx: &ConvergeContext,
    resource_id: &'a str,
    space_id: &'a str,
    spec: &StateSpec,
    extract: X,
    mut read: F,
) -> Result<S>
where
    X: Fn(&S) -> std::result::Result<String, SnapshotError>,
    F: FnMut(&'a str, &'a str) -> Fut,
    Fut: Future<Output = std::result::Result<S, E>>,
    E: Into<BoxError>,
{
    let cancel = ctx.cancellation_token();
    let start = Instant::now();
    let deadline = deadline_after(start, spec.timeout);
    let mut last: Option<String> = None;
    let mut target_hits: u32 = 0;
    let mut reads: u32 = 0;

    let result = loop {
        if cancel.is_cancelled() {
            break Err(ConvergeError::Cancelled);
        }
        reads += 1;

        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Err(ConvergeError::Cancelled),
            // Polled before the deadline so a snapshot landing on it is kept
            outcome = read(space_id, resource_id) => match outcome {
                Ok(snapshot) => snapshot,
                Err(err) => break Err(ConvergeError::Read {
                    resource_id: resource_id.to_string(),
                    source: err.into(),
                }),
            },
            _ = time::sleep_until(deadline) => break Err(ConvergeError::Timeout {
                timeout: spec.timeout,
                last: last.take(),
            }),
        };

        let status = match extract(&snapshot) {
            Ok(status) => status,
            Err(source) => {
                break Err(ConvergeError::MalformedSnapshot {
                    resource_id: resource_id.to_string(),
                    source,
                });
            }
        };

        let class = spec.classify(&status);
        debug!(reads, status = %status, class = ?class, elapsed_ms = start.elapsed().as_millis() as u64, "Observed state");
        ctx.emit(ProgressEvent::Polling {
            resource_id: resource_id.to_string(),
            status: status.clone(),
            elapsed: start.elapsed(),
        });

        match class {
            StateClass::Target => {
                target_hits += 1;
                if target_hits >= spec.continuous_target_occurrence {
                    break Ok(snapshot);
                }
            }
            StateClass::Pending => target_hits = 0,
            StateClass::Unknown => {
                break Err(ConvergeError::UnexpectedState {
                    resource_id: resource_id.to_string(),
                    status,
                    pending: spec.pending.clone(),
                    target: spec.target.clone(),
                });
            }
        }

        last = Some(status);
        if let Err(err) = pause(cancel, spec.delay, deadline).await {
            break Err(err);
        }
        if Instant::now() >= deadline {
            break Err(ConvergeError::Timeout {
                timeout: spec.timeout,
                last,
            });
        }
    };

    match &result {
        Ok(_) => ctx.emit(ProgressEvent::Converged {
            resource_id: Some(resource_id.to_string()),
            elapsed: start.elapsed(),
        }),
        Err(err) => {
            debug!(reads, error = %err, "Watch failed");
            ctx.emit(ProgressEvent::Failed {
                resource_id: Some(resource_id.to_string()),
                error: err.to_string(),
            });
        }
    }

    result
}
