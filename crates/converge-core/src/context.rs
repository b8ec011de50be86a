//! Per-call convergence context
//!
//! Bundles what every convergence call needs from its caller: the
//! cancellation signal, the budgets and code policies, and an optional
//! progress hook. Cloning is cheap, so one context can be shared by many
//! concurrent convergences.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ConvergenceConfig;
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::watch::StateSpec;

#[derive(Clone, Default)]
pub struct ConvergeContext {
    cancel: CancellationToken,
    config: Arc<ConvergenceConfig>,
    on_progress: Option<ProgressCallback>,
}

impl ConvergeContext {
    pub fn new(config: ConvergenceConfig) -> Self {
        Self {
            cancel: CancellationToken::new(),
            config: Arc::new(config),
            on_progress: None,
        }
    }

    /// Use an existing cancellation token (e.g. a child of the caller's)
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel every convergence running under this context
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A state spec using this context's watch budget
    pub fn state_spec<P, T>(&self, pending: P, target: T) -> StateSpec
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        StateSpec::from_config(&self.config.watch, pending, target)
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event);
        }
    }
}

impl fmt::Debug for ConvergeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvergeContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("config", &self.config)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}
