use crate::error::{Error, Result};
use reqwest::{Client, header};
use std::time::Duration;
use tracing::debug;

/// Thin `reqwest` wrapper: one attempt per call, bounded by a client-wide timeout.
/// Failures are returned as-is and never retried.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::http(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    pub async fn post_json_raw(
        &self,
        url: &str,
        body: &str,
        headers: &[(&str, &str)],
    ) -> Result<String> {
        let mut req = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        debug!(url, timeout_ms = self.timeout.as_millis() as u64, "POST");
        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::http(format!("timed out after {:?}: {e}", self.timeout))
            } else {
                Error::http(e.to_string())
            }
        })?;
        self.handle_response(resp).await
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        let url = resp.url().to_string();

        if status.is_success() {
            return resp.text().await.map_err(|e| Error::http(e.to_string()));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::api_with_status(
            extract_domain(&url),
            body,
            status.as_u16(),
        ))
    }
}

fn extract_domain(url: &str) -> String {
    url.split("//")
        .nth(1)
        .and_then(|s| s.split('/').next())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_from_url() {
        assert_eq!(
            extract_domain("http://localhost:11434/api/generate"),
            "localhost:11434"
        );
        assert_eq!(extract_domain("not a url"), "unknown");
    }
}
