//! `convergectl wait`

use anyhow::{Context, Result};
use converge_core::{ConvergeContext, JsonPointer, retry_read_until_state_valid};
use serde_json::Value;

use super::{expand_url, http_client, print_json, read_json};
use crate::cli::WaitArgs;

pub async fn run(ctx: &ConvergeContext, args: &WaitArgs) -> Result<()> {
    let client = http_client()?;
    let spec = args.state.spec(ctx)?;
    let status = JsonPointer::new(&args.state.status_path);
    let resource_id = args.id.as_deref().unwrap_or(&args.url);

    let snapshot = retry_read_until_state_valid(
        ctx,
        resource_id,
        &args.space,
        &spec,
        |snapshot: &Value| status.extract(snapshot),
        |space, _| read_json(client.get(expand_url(&args.url, space, args.id.as_deref()))),
    )
    .await
    .with_context(|| format!("{} did not reach {:?}", resource_id, spec.target))?;

    print_json(&snapshot)
}
