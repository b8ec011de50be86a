//! `convergectl delete`

use anyhow::{Context, Result};
use converge_core::{
    ConvergeContext, JsonPointer, delete_and_wait, retry_delete_until_resource_available,
};
use serde_json::Value;
use tracing::info;

use super::{expand_url, http_client, read_optional_json};
use crate::cli::DeleteArgs;

/// Synthetic state reported once reads answer 404
const GONE_STATE: &str = "deleted";

pub async fn run(ctx: &ConvergeContext, args: &DeleteArgs) -> Result<()> {
    let client = http_client()?;
    let label = if args.id.is_empty() {
        args.url.as_str()
    } else {
        args.id.as_str()
    };

    if !args.wait {
        retry_delete_until_resource_available(ctx, &args.space, &args.id, |space, id| {
            client.delete(expand_url(&args.url, space, Some(id))).send()
        })
        .await
        .context("Delete did not succeed")?;

        println!("Delete of {} accepted", label);
        return Ok(());
    }

    let read_url = args.read_url.as_deref().unwrap_or(&args.url);
    let spec = args.state.spec_with_target(ctx, GONE_STATE)?;
    let status = JsonPointer::new(&args.state.status_path);

    delete_and_wait(
        ctx,
        &args.space,
        &args.id,
        &spec,
        |space, id| client.delete(expand_url(&args.url, space, Some(id))).send(),
        |snapshot: &Option<Value>| match snapshot {
            None => Ok(GONE_STATE.to_string()),
            Some(value) => status.extract(value),
        },
        |space, id| read_optional_json(client.get(expand_url(read_url, space, Some(id)))),
    )
    .await
    .context("Delete did not converge")?;

    info!(resource = %label, "Resource deleted");
    println!("{} deleted", label);
    Ok(())
}
