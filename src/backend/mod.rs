//! Transport adapters tried by the orchestrator.
//!
//! Each adapter turns one transport (in-process library, local HTTP server,
//! CLI runner) into an [`Outcome`]. Failures of any kind become
//! [`Outcome::Unavailable`] here and are never surfaced to the caller.

pub mod http;
pub mod library;
pub mod process;

pub use http::HttpBackend;
pub use library::{ChatLibrary, ConfiguredLibrary, LibraryBackend, LibraryResolver};
pub use process::ProcessBackend;

use crate::error::Result;
use crate::request::PromptRequest;
use async_trait::async_trait;
use tracing::debug;

/// Result of one adapter attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Unavailable,
}

impl Outcome {
    /// Blank answers never short-circuit the chain.
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            Self::Unavailable
        } else {
            Self::Success(text)
        }
    }

    /// Collapse an adapter-internal result, logging the reason at debug level.
    pub fn from_result(backend: &str, result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::from_text(text),
            Err(e) => {
                debug!(backend, error = %e, "backend unavailable");
                Self::Unavailable
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// One transport strategy in the fallback chain.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Try to answer `request`. `default_model` is the chain-wide model used
    /// when the request does not name one.
    async fn attempt(&self, request: &PromptRequest, default_model: &str) -> Outcome;
}
