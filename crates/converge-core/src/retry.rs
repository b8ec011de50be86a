//! Bounded retry loop for mutating calls
//!
//! Each attempt issues exactly one call, classifies the answer, and either
//! stops or sleeps a fixed delay before the next call. The whole loop is
//! bounded by a deadline, and every await (the call itself and the sleep)
//! races the caller's cancellation token.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::classify::{CodePolicy, Decision, classify};
use crate::context::ConvergeContext;
use crate::error::{BoxError, ConvergeError, Result};
use crate::http::StatusCoded;
use crate::progress::ProgressEvent;

/// Time budget for one retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Overall deadline, regardless of how many attempts were made
    pub timeout: Duration,
    /// Fixed pause between attempts
    pub delay: Duration,
}

/// Run `op` until its status code is in `policy.stop`
///
/// Returns the stopping response. Fails immediately on an operation error or
/// a code outside both sets, with `Timeout` once the deadline passes, and
/// with `Cancelled` as soon as the context is cancelled.
#[instrument(skip_all, fields(timeout = ?settings.timeout, delay = ?settings.delay))]
pub async fn retry_loop<R, E, F, Fut>(
    ctx: &ConvergeContext,
    settings: &RetrySettings,
    policy: &CodePolicy,
    mut op: F,
) -> Result<R>
where
    R: StatusCoded,
    E: Into<BoxError>,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<R, E>>,
{
    let cancel = ctx.cancellation_token();
    let start = Instant::now();
    let deadline = deadline_after(start, settings.timeout);
    let mut last: Option<StatusCode> = None;
    let mut attempt: u32 = 0;

    let result = loop {
        if cancel.is_cancelled() {
            break Err(ConvergeError::Cancelled);
        }
        attempt += 1;
        ctx.emit(ProgressEvent::Attempt {
            attempt,
            elapsed: start.elapsed(),
        });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Err(ConvergeError::Cancelled),
            // Polled before the deadline so an answer landing on it is kept
            outcome = op() => outcome.map_err(Into::into),
            _ = time::sleep_until(deadline) => break Err(timed_out(settings.timeout, last)),
        };

        let status = outcome.as_ref().ok().map(StatusCoded::status_code);
        debug!(attempt, status = ?status, elapsed_ms = start.elapsed().as_millis() as u64, "Attempt finished");

        match classify(outcome, policy, settings.delay) {
            Decision::Succeed(response) => break Ok(response),
            Decision::FailPermanently(err) => break Err(err),
            Decision::RetryAfter(delay) => {
                last = status;
                if let Some(status) = status {
                    ctx.emit(ProgressEvent::Retrying {
                        attempt,
                        status,
                        delay,
                    });
                }

                if let Err(err) = pause(cancel, delay, deadline).await {
                    break Err(err);
                }
                if Instant::now() >= deadline {
                    break Err(timed_out(settings.timeout, last));
                }
            }
        }
    };

    match &result {
        Ok(_) => ctx.emit(ProgressEvent::Converged {
            resource_id: None,
            elapsed: start.elapsed(),
        }),
        Err(err) => {
            debug!(attempt, error = %err, "Retry loop gave up");
            ctx.emit(ProgressEvent::Failed {
                resource_id: None,
                error: err.to_string(),
            });
        }
    }

    result
}

/// Sleep for `delay`, but never past `deadline`, and wake up immediately on
/// cancellation
pub(crate) async fn pause(
    cancel: &CancellationToken,
    delay: Duration,
    deadline: Instant,
) -> Result<()> {
    let wake = deadline_after(Instant::now(), delay).min(deadline);
    trace!(delay = ?delay, "Sleeping before next attempt");

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConvergeError::Cancelled),
        _ = time::sleep_until(wake) => Ok(()),
    }
}

/// `start + timeout`, saturating instead of overflowing on absurd budgets
pub(crate) fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .unwrap_or_else(|| start + Duration::from_secs(60 * 60 * 24 * 365))
}

fn timed_out(timeout: Duration, last: Option<StatusCode>) -> ConvergeError {
    ConvergeError::Timeout {
        timeout,
        last: last.map(|code| code.to_string()),
    }
}
