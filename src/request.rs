use crate::error::{Error, Result};

/// A single prompt handed to the fallback chain.
///
/// Construction goes through [`PromptRequest::new`], so `text` is always
/// trimmed and non-blank by the time any backend sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    text: String,
    model: Option<String>,
    credential: Option<String>,
}

impl PromptRequest {
    pub fn new(text: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(Error::EmptyPrompt);
        }
        Ok(Self {
            text: text.to_string(),
            model: None,
            credential: None,
        })
    }

    /// Override the default model. Blank identifiers count as unset.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        self
    }

    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// The caller's model if present, otherwise `default`.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model().unwrap_or(default)
    }
}
