//! # converge-core
//!
//! Drives an asynchronous, eventually consistent control-plane API into a
//! confirmed terminal state.
//!
//! Create and delete calls on such APIs often return before the work is
//! done, answer with "try again" codes while a dependency is still settling,
//! and expose a status field that moves through intermediate states. This
//! crate turns "I issued a mutating call" into "the remote resource reached
//! a state I can trust", without ever retrying a real rejection.
//!
//! ## Building blocks
//!
//! - [`classify()`] maps one attempt's status code (or error) to a
//!   [`Decision`]: succeed, fail permanently, or retry after a delay.
//! - [`retry_loop`] repeats a single call under a fixed delay and an overall
//!   deadline, observing cancellation.
//! - [`retry_create_until_resource_available`],
//!   [`retry_create_until_resource_available_with_body`] and
//!   [`retry_delete_until_resource_available`] fix the status-code policy
//!   for creation and deletion.
//! - [`retry_read_until_state_valid`] polls a resource until its status is
//!   in a target set, failing fast on statuses nobody expected.
//! - [`create_and_wait`] and [`delete_and_wait`] compose the two.
//!
//! The retry loop and the watcher are independent and are always composed
//! sequentially.
//!
//! ## Example
//!
//! ```rust,ignore
//! use converge_core::{
//!     ApiResponse, ConvergeContext, ConvergenceConfig, JsonPointer,
//!     retry_create_until_resource_available, retry_read_until_state_valid,
//! };
//! use serde_json::Value;
//!
//! let ctx = ConvergeContext::new(ConvergenceConfig::load()?);
//!
//! // Step 1: Create (409/424 are retried, 201 is done)
//! let created = retry_create_until_resource_available(&ctx, space_id, |space| {
//!     let request = client.post(format!("{base}/spaces/{space}/volumes")).json(&body);
//!     async move { ApiResponse::<Value>::read(request.send().await?).await }
//! })
//! .await?;
//!
//! // Step 2: Wait for the volume to become available
//! let status = JsonPointer::new("/status/state");
//! let spec = ctx.state_spec(["pending", "requested"], ["available"]);
//! let volume = retry_read_until_state_valid(
//!     &ctx,
//!     &volume_id,
//!     space_id,
//!     &spec,
//!     |v: &Value| status.extract(v),
//!     |space, id| {
//!         let request = client.get(format!("{base}/spaces/{space}/volumes/{id}"));
//!         async move { request.send().await?.error_for_status()?.json::<Value>().await }
//!     },
//! )
//! .await?;
//! ```

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod operations;
pub mod progress;
pub mod retry;
pub mod snapshot;
pub mod watch;
pub mod workflows;

pub use classify::{CodePolicy, Decision, StatusCodes, classify};
pub use config::{ConfigError, ConvergenceConfig, RetryConfig, WatchConfig};
pub use context::ConvergeContext;
pub use error::{BoxError, ConvergeError, Result};
pub use http::{ApiResponse, StatusCoded};
pub use operations::{
    retry_create_until_resource_available, retry_create_until_resource_available_with_body,
    retry_delete_until_resource_available,
};
pub use progress::{ProgressCallback, ProgressEvent};
pub use retry::{RetrySettings, retry_loop};
pub use snapshot::{JsonPointer, SnapshotError};
pub use watch::{StateClass, StateSpec, retry_read_until_state_valid};
pub use workflows::{Converged, create_and_wait, delete_and_wait};

// Re-exported so callers can build contexts without a direct dependency
pub use tokio_util::sync::CancellationToken;
