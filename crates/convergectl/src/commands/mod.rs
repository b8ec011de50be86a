//! Command implementations and shared HTTP helpers

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use converge_core::{BoxError, ConvergeContext, StateSpec};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;

use crate::cli::StateArgs;

pub mod config;
pub mod create;
pub mod delete;
pub mod wait;

/// Per-request timeout; the convergence deadline bounds the whole loop
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("convergectl/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Fill `{space}` and `{id}` placeholders in a URL template
pub fn expand_url(template: &str, space: &str, id: Option<&str>) -> String {
    let url = template.replace("{space}", space);
    match id {
        Some(id) => url.replace("{id}", id),
        None => url,
    }
}

/// Load a JSON request body from a file, or stdin for `-`
pub fn load_body(path: Option<&Path>) -> Result<Option<Value>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read body from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read body from {}", path.display()))?
    };

    let body = serde_json::from_str(&content).context("Request body is not valid JSON")?;
    Ok(Some(body))
}

/// Attach an optional JSON body to a request
pub fn with_json(request: RequestBuilder, body: &Option<Value>) -> RequestBuilder {
    match body {
        Some(body) => request.json(body),
        None => request,
    }
}

/// GET a resource and decode it, treating any non-2xx answer as an error
pub async fn read_json(request: RequestBuilder) -> std::result::Result<Value, BoxError> {
    let response = request.send().await?.error_for_status()?;
    Ok(response.json::<Value>().await?)
}

/// Like [`read_json`], but a 404 means the resource is gone
pub async fn read_optional_json(
    request: RequestBuilder,
) -> std::result::Result<Option<Value>, BoxError> {
    let response = request.send().await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let response = response.error_for_status()?;
    Ok(Some(response.json::<Value>().await?))
}

/// Render a JSON scalar as an id string
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl StateArgs {
    /// Build a state spec from the flags, falling back to the `[watch]` config
    pub fn spec(&self, ctx: &ConvergeContext) -> Result<StateSpec> {
        if self.target.is_empty() {
            bail!("--target must list at least one state");
        }
        self.apply(ctx.state_spec(self.pending.clone(), self.target.clone()))
    }

    /// Like [`StateArgs::spec`], with `extra_target` always counted as done
    pub fn spec_with_target(
        &self,
        ctx: &ConvergeContext,
        extra_target: &str,
    ) -> Result<StateSpec> {
        let mut target = self.target.clone();
        if !target.iter().any(|t| t == extra_target) {
            target.push(extra_target.to_string());
        }
        self.apply(ctx.state_spec(self.pending.clone(), target))
    }

    /// Layer the per-command overrides, rejecting the same values the
    /// `[watch]` config rejects
    fn apply(&self, mut spec: StateSpec) -> Result<StateSpec> {
        if let Some(secs) = self.wait_timeout {
            if secs == 0 {
                bail!("--wait-timeout must be greater than zero");
            }
            spec = spec.with_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = self.wait_interval_ms {
            spec = spec.with_delay(Duration::from_millis(ms));
        }
        if let Some(n) = self.target_occurrence {
            if n == 0 {
                bail!("--target-occurrence must be at least 1");
            }
            spec = spec.with_continuous_target_occurrence(n);
        }
        Ok(spec)
    }
}
