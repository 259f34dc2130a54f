use super::{Backend, Outcome};
use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::normalize::{RawResponse, ResponseShape};
use crate::request::PromptRequest;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Single POST to a local model server's generate endpoint.
pub struct HttpBackend {
    endpoint: String,
    stream: Option<bool>,
    http: HttpClient,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(concat!("prompt-relay/", env!("CARGO_PKG_VERSION")), timeout)?;
        Ok(Self {
            endpoint: endpoint.into(),
            stream: None,
            http,
        })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Ok(Self::new(config.endpoint.clone(), config.timeout())?.with_stream(config.stream))
    }

    pub fn with_stream(mut self, stream: Option<bool>) -> Self {
        self.stream = stream;
        self
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        let body = serde_json::to_string(&GenerateRequest {
            model,
            prompt,
            stream: self.stream,
        })
        .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let text = self.http.post_json_raw(&self.endpoint, &body, &[]).await?;
        let value = RawResponse::parse(&text)?;
        let shape = ResponseShape::classify(&value);
        debug!(shape = shape.kind(), "normalized HTTP response");
        Ok(shape.into_text())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn attempt(&self, request: &PromptRequest, default_model: &str) -> Outcome {
        let model = request.model_or(default_model);
        debug!(endpoint = %self.endpoint, model, "trying HTTP backend");
        Outcome::from_result(self.name(), self.generate(request.text(), model).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_omits_unset_stream() {
        let body = serde_json::to_value(GenerateRequest {
            model: "m",
            prompt: "p",
            stream: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "m", "prompt": "p"}));
    }

    #[test]
    fn request_body_carries_stream_flag() {
        let body = serde_json::to_value(GenerateRequest {
            model: "m",
            prompt: "p",
            stream: Some(false),
        })
        .unwrap();
        assert_eq!(body["stream"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        // Port 1 is reserved and refuses connections on loopback.
        let backend =
            HttpBackend::new("http://127.0.0.1:1/api/generate", Duration::from_secs(2)).unwrap();
        let req = PromptRequest::new("hi").unwrap();
        assert_eq!(backend.attempt(&req, "m").await, Outcome::Unavailable);
    }
}
