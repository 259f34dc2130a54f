use super::{Backend, Outcome};
use crate::config::LibraryConfig;
use crate::error::Result;
use crate::llm::ChatClient;
use crate::request::PromptRequest;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// In-process chat capability: `ask(prompt, model, credential) -> answer`.
#[async_trait]
pub trait ChatLibrary: Send + Sync {
    async fn ask(&self, prompt: &str, model: &str, credential: Option<&str>) -> Result<String>;
}

/// Locates the chat library. Called on every attempt, never cached;
/// `None` means the library is not present, which is not an error.
pub trait LibraryResolver: Send + Sync {
    fn resolve(&self) -> Option<Arc<dyn ChatLibrary>>;
}

/// Resolver backed by `[library]` config: present when enabled and the
/// client can be built.
pub struct ConfiguredLibrary {
    config: LibraryConfig,
}

impl ConfiguredLibrary {
    pub fn new(config: LibraryConfig) -> Self {
        Self { config }
    }
}

impl LibraryResolver for ConfiguredLibrary {
    fn resolve(&self) -> Option<Arc<dyn ChatLibrary>> {
        if !self.config.enabled {
            return None;
        }
        match ChatClient::from_config(&self.config) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                debug!(error = %e, "chat library could not be built");
                None
            }
        }
    }
}

/// Adapter over an optional in-process chat library.
///
/// "Library absent" and "library call failed" both end as
/// [`Outcome::Unavailable`].
pub struct LibraryBackend {
    resolver: Arc<dyn LibraryResolver>,
    default_model: String,
}

impl LibraryBackend {
    /// `default_model` is the library's own default (a hosted model), which
    /// is distinct from the chain-wide local default.
    pub fn new(resolver: Arc<dyn LibraryResolver>, default_model: impl Into<String>) -> Self {
        Self {
            resolver,
            default_model: default_model.into(),
        }
    }

    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(
            Arc::new(ConfiguredLibrary::new(config.clone())),
            config.model.clone(),
        )
    }
}

#[async_trait]
impl Backend for LibraryBackend {
    fn name(&self) -> &'static str {
        "library"
    }

    async fn attempt(&self, request: &PromptRequest, _default_model: &str) -> Outcome {
        let Some(library) = self.resolver.resolve() else {
            debug!("chat library not present");
            return Outcome::Unavailable;
        };
        let model = request.model_or(&self.default_model);
        let result = library
            .ask(request.text(), model, request.credential())
            .await;
        Outcome::from_result(self.name(), result)
    }
}
