//! Create-then-wait and delete-then-wait workflows
//!
//! These compose a retry wrapper and the state watcher sequentially: first
//! the mutating call is driven to an accepted status code, then the resource
//! is polled until it reaches its terminal state.

use std::future::Future;

use tracing::{debug, instrument};

use crate::context::ConvergeContext;
use crate::error::{BoxError, ConvergeError, Result};
use crate::http::StatusCoded;
use crate::operations::{retry_create_until_resource_available, retry_delete_until_resource_available};
use crate::snapshot::SnapshotError;
use crate::watch::{StateSpec, retry_read_until_state_valid};

/// Result of a create-and-wait workflow
#[derive(Debug, Clone, PartialEq)]
pub struct Converged<R, S> {
    /// Identifier derived from the create response
    pub resource_id: String,
    /// The accepted create response
    pub created: R,
    /// The snapshot that reached a target state
    pub snapshot: S,
}

/// Create a resource and wait for it to reach a target state
///
/// # Arguments
///
/// * `ctx` - Cancellation, budgets, and progress hook
/// * `space_id` - The space the resource lives in
/// * `spec` - Pending/target vocabulary for this resource kind
/// * `create` - Issues one create call
/// * `resource_id` - Derives the new resource's id from the create response
/// * `extract` - Reads the status out of a snapshot
/// * `read` - Fetches the resource by space and id
#[instrument(skip_all, fields(space_id = %space_id))]
pub async fn create_and_wait<'a, R, S, CE, RE, C, CFut, I, X, G, GFut>(
    ctx: &ConvergeContext,
    space_id: &'a str,
    spec: &StateSpec,
    create: C,
    resource_id: I,
    extract: X,
    read: G,
) -> Result<Converged<R, S>>
where
    R: StatusCoded,
    CE: Into<BoxError>,
    C: FnMut(&'a str) -> CFut,
    CFut: Future<Output = std::result::Result<R, CE>>,
    I: FnOnce(&R) -> Option<String>,
    X: Fn(&S) -> std::result::Result<String, SnapshotError>,
    G: FnMut(&str, &str) -> GFut,
    GFut: Future<Output = std::result::Result<S, RE>>,
    RE: Into<BoxError>,
{
    // Step 1: Create until accepted
    let created = retry_create_until_resource_available(ctx, space_id, create).await?;

    // Step 2: Work out what to poll
    let id = resource_id(&created).ok_or(ConvergeError::MissingResourceId)?;
    debug!(resource_id = %id, "Create accepted, waiting for target state");

    // Step 3: Poll until converged
    let snapshot = retry_read_until_state_valid(ctx, &id, space_id, spec, extract, read).await?;

    Ok(Converged {
        resource_id: id,
        created,
        snapshot,
    })
}

/// Delete a resource and wait for it to reach a "gone" state
///
/// `read` is expected to map the control plane's "not found" answer to a
/// snapshot whose status is in `spec.target`.
#[instrument(skip_all, fields(space_id = %space_id, resource_id = %resource_id))]
pub async fn delete_and_wait<'a, R, S, DE, RE, D, DFut, X, G, GFut>(
    ctx: &ConvergeContext,
    space_id: &'a str,
    resource_id: &'a str,
    spec: &StateSpec,
    delete: D,
    extract: X,
    read: G,
) -> Result<S>
where
    R: StatusCoded,
    DE: Into<BoxError>,
    D: FnMut(&'a str, &'a str) -> DFut,
    DFut: Future<Output = std::result::Result<R, DE>>,
    X: Fn(&S) -> std::result::Result<String, SnapshotError>,
    G: FnMut(&'a str, &'a str) -> GFut,
    GFut: Future<Output = std::result::Result<S, RE>>,
    RE: Into<BoxError>,
{
    // Step 1: Delete until accepted
    retry_delete_until_resource_available(ctx, space_id, resource_id, delete).await?;

    // Step 2: Poll until gone
    retry_read_until_state_valid(ctx, resource_id, space_id, spec, extract, read).await
}
