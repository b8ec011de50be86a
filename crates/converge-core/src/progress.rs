//! Progress events for long-running convergence
//!
//! The core never prints. A presentation layer that wants to show progress
//! (a CLI spinner, a provider's diagnostics) attaches a callback to the
//! [`ConvergeContext`](crate::ConvergeContext) and receives these events.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

/// Progress events emitted by the retry loop and the state watcher
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A mutating call is about to be issued
    Attempt { attempt: u32, elapsed: Duration },
    /// The call answered with a transient code; sleeping before the next one
    Retrying {
        attempt: u32,
        status: StatusCode,
        delay: Duration,
    },
    /// A read observed the given status
    Polling {
        resource_id: String,
        status: String,
        elapsed: Duration,
    },
    /// Convergence finished successfully
    Converged {
        resource_id: Option<String>,
        elapsed: Duration,
    },
    /// Convergence failed
    Failed {
        resource_id: Option<String>,
        error: String,
    },
}

/// Callback type for progress updates
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
