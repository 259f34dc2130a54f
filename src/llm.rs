use crate::backend::library::ChatLibrary;
use crate::config::LibraryConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Chat provider: determines API format and endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenRouter,
    /// Any OpenAI-compatible API.
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Hosted chat-completions client used as the in-process library backend.
///
/// The model and credential are supplied per call; the credential falls back
/// to the configured environment variable.
pub struct ChatClient {
    provider: Provider,
    api_key_env: String,
    max_tokens: u32,
    base_url: String,
    http: HttpClient,
}

// -- Anthropic format --

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

// -- OpenAI-compatible format --

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

// -- Shared --

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

impl ChatClient {
    pub fn new(
        provider: Provider,
        api_key_env: Option<String>,
        max_tokens: u32,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = HttpClient::new(concat!("prompt-relay/", env!("CARGO_PKG_VERSION")), timeout)?;
        let api_key_env = api_key_env.unwrap_or_else(|| provider.default_api_key_env().into());
        let base_url = base_url.unwrap_or_else(|| provider.default_base_url().into());
        Ok(Self {
            provider,
            api_key_env,
            max_tokens,
            base_url,
            http,
        })
    }

    pub fn from_config(config: &LibraryConfig) -> Result<Self> {
        Self::new(
            config.provider.clone(),
            config.api_key_env.clone(),
            config.max_tokens,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Explicit credential if given, else the configured env var.
    fn resolve_key(&self, credential: Option<&str>) -> Result<String> {
        credential
            .map(str::to_string)
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::MissingCredential {
                env_var: self.api_key_env.clone(),
            })
    }

    pub async fn complete(&self, prompt: &str, model: &str, api_key: &str) -> Result<String> {
        debug!(provider = ?self.provider, model, "sending chat request");

        match self.provider {
            Provider::Anthropic => self.complete_anthropic(prompt, model, api_key).await,
            Provider::OpenRouter | Provider::OpenAi => {
                self.complete_openai(prompt, model, api_key).await
            }
        }
    }

    async fn complete_anthropic(&self, prompt: &str, model: &str, api_key: &str) -> Result<String> {
        let request = AnthropicRequest {
            model,
            max_tokens: self.max_tokens,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let body = serde_json::to_string(&request)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/messages", self.base_url);
        let response_text = self
            .http
            .post_json_raw(
                &url,
                &body,
                &[("x-api-key", api_key), ("anthropic-version", "2023-06-01")],
            )
            .await?;

        let resp: AnthropicResponse = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse Anthropic response: {e}")))?;

        Ok(resp
            .content
            .into_iter()
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn complete_openai(&self, prompt: &str, model: &str, api_key: &str) -> Result<String> {
        let request = OpenAiRequest {
            model,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let body = serde_json::to_string(&request)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/chat/completions", self.base_url);
        let response_text = self
            .http
            .post_json_raw(
                &url,
                &body,
                &[("Authorization", &format!("Bearer {api_key}"))],
            )
            .await?;

        let resp: OpenAiResponse = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse chat response: {e}")))?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::parse("empty response from chat API"))
    }
}

#[async_trait]
impl ChatLibrary for ChatClient {
    async fn ask(&self, prompt: &str, model: &str, credential: Option<&str>) -> Result<String> {
        let api_key = self.resolve_key(credential)?;
        self.complete(prompt, model, &api_key).await
    }
}
