//! Create/delete convergence wrappers
//!
//! Thin specializations of [`retry_loop`] that pick the status-code policy
//! for creation or deletion from the context's configuration. They do no
//! status inspection of their own and pass classifier errors through as-is.
//!
//! # Example
//!
//! ```rust,ignore
//! use converge_core::{ApiResponse, ConvergeContext, retry_create_until_resource_available};
//! use serde_json::Value;
//!
//! let ctx = ConvergeContext::default();
//! let created = retry_create_until_resource_available(&ctx, "space-1", |space| {
//!     let request = client.post(format!("{base}/spaces/{space}/volumes")).json(&body);
//!     async move { ApiResponse::<Value>::read(request.send().await?).await }
//! })
//! .await?;
//! ```

use std::future::Future;

use tracing::instrument;

use crate::context::ConvergeContext;
use crate::error::{BoxError, Result};
use crate::http::StatusCoded;
use crate::retry::retry_loop;

/// Issue a create call until the control plane accepts it
#[instrument(skip_all, fields(space_id = %space_id))]
pub async fn retry_create_until_resource_available<'a, R, E, F, Fut>(
    ctx: &ConvergeContext,
    space_id: &'a str,
    mut op: F,
) -> Result<R>
where
    R: StatusCoded,
    E: Into<BoxError>,
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = std::result::Result<R, E>>,
{
    let config = ctx.config();
    retry_loop(ctx, &config.retry.settings(), &config.create, || op(space_id)).await
}

/// Issue a create call carrying a request body until the control plane
/// accepts it
///
/// The same body is handed to every attempt.
#[instrument(skip_all, fields(space_id = %space_id))]
pub async fn retry_create_until_resource_available_with_body<'a, B, R, E, F, Fut>(
    ctx: &ConvergeContext,
    space_id: &'a str,
    body: &'a B,
    mut op: F,
) -> Result<R>
where
    B: ?Sized,
    R: StatusCoded,
    E: Into<BoxError>,
    F: FnMut(&'a str, &'a B) -> Fut,
    Fut: Future<Output = std::result::Result<R, E>>,
{
    let config = ctx.config();
    retry_loop(ctx, &config.retry.settings(), &config.create, || {
        op(space_id, body)
    })
    .await
}

/// Issue a delete call until the control plane accepts it
#[instrument(skip_all, fields(space_id = %space_id, resource_id = %resource_id))]
pub async fn retry_delete_until_resource_available<'a, R, E, F, Fut>(
    ctx: &ConvergeContext,
    space_id: &'a str,
    resource_id: &'a str,
    mut op: F,
) -> Result<()>
where
    R: StatusCoded,
    E: Into<BoxError>,
    F: FnMut(&'a str, &'a str) -> Fut,
    Fut: Future<Output = std::result::Result<R, E>>,
{
    let config = ctx.config();
    retry_loop(ctx, &config.retry.settings(), &config.delete, || {
        op(space_id, resource_id)
    })
    .await?;
    Ok(())
}
