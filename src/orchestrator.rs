//! Fallback chain: library → local HTTP → CLI runner.

use crate::backend::{Backend, HttpBackend, LibraryBackend, Outcome, ProcessBackend};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::request::PromptRequest;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Returned when every backend is unavailable.
pub const NO_BACKEND_MESSAGE: &str = "No model backend available. Ensure OPENAI_API_KEY is set \
     or Ollama is running and model installed.";

pub struct Orchestrator {
    backends: Vec<Box<dyn Backend>>,
    default_model: String,
}

impl Orchestrator {
    /// Backends are attempted in the order given.
    pub fn new(backends: Vec<Box<dyn Backend>>, default_model: impl Into<String>) -> Self {
        Self {
            backends,
            default_model: default_model.into(),
        }
    }

    /// The standard chain built from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backends: Vec<Box<dyn Backend>> = vec![
            Box::new(LibraryBackend::from_config(&config.library)),
            Box::new(HttpBackend::from_config(&config.http)?),
            Box::new(ProcessBackend::from_config(&config.process)),
        ];
        Ok(Self::new(backends, config.default_model.clone()))
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Answer `request` from the first backend that succeeds, or
    /// [`NO_BACKEND_MESSAGE`] when none does. Never fails.
    pub async fn process(&self, request: &PromptRequest) -> String {
        let never = CancellationToken::new();
        self.process_with_cancel(request, &never)
            .await
            .unwrap_or_else(|_| NO_BACKEND_MESSAGE.to_string())
    }

    /// Like [`process`](Self::process), but stops as soon as `cancel` fires.
    ///
    /// The in-flight attempt is dropped, which aborts an HTTP request or kills
    /// a runner process. The only error is [`Error::Cancelled`].
    pub async fn process_with_cancel(
        &self,
        request: &PromptRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        for backend in &self.backends {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            debug!(backend = backend.name(), "attempting backend");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(backend = backend.name(), "request cancelled");
                    return Err(Error::Cancelled);
                }
                outcome = backend.attempt(request, &self.default_model) => outcome,
            };

            if let Outcome::Success(text) = outcome {
                info!(backend = backend.name(), "backend answered");
                return Ok(text);
            }
        }

        info!("no backend available");
        Ok(NO_BACKEND_MESSAGE.to_string())
    }
}
