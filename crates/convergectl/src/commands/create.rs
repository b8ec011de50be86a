//! `convergectl create`

use anyhow::{Context, Result};
use converge_core::{
    ApiResponse, ConvergeContext, JsonPointer, create_and_wait,
    retry_create_until_resource_available_with_body,
};
use serde_json::Value;
use tracing::info;

use super::{
    expand_url, http_client, load_body, print_json, read_json, scalar_to_string, with_json,
};
use crate::cli::CreateArgs;

pub async fn run(ctx: &ConvergeContext, args: &CreateArgs) -> Result<()> {
    let client = http_client()?;
    let body = load_body(args.body.as_deref())?;

    if !args.wait {
        let created =
            retry_create_until_resource_available_with_body(ctx, &args.space, &body, |space, body| {
                let request = with_json(client.post(expand_url(&args.url, space, None)), body);
                async move { ApiResponse::<Value>::read(request.send().await?).await }
            })
            .await
            .context("Create did not succeed")?;

        info!(status = %created.status, "Create accepted");
        return print_json(&created.body.unwrap_or(Value::Null));
    }

    let read_url = args
        .read_url
        .as_deref()
        .context("--read-url is required with --wait")?;
    let spec = args.state.spec(ctx)?;
    let id_path = JsonPointer::new(&args.id_path);
    let status = JsonPointer::new(&args.state.status_path);

    let converged = create_and_wait(
        ctx,
        &args.space,
        &spec,
        |space| {
            let request = with_json(client.post(expand_url(&args.url, space, None)), &body);
            async move { ApiResponse::<Value>::read(request.send().await?).await }
        },
        |created: &ApiResponse<Value>| {
            created
                .body
                .as_ref()
                .and_then(|b| id_path.lookup(b))
                .and_then(scalar_to_string)
        },
        |snapshot: &Value| status.extract(snapshot),
        |space, id| read_json(client.get(expand_url(read_url, space, Some(id)))),
    )
    .await
    .context("Create did not converge")?;

    info!(resource_id = %converged.resource_id, "Resource converged");
    print_json(&converged.snapshot)
}
