use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `default_model`.
pub const MODEL_ENV: &str = "PROMPT_RELAY_MODEL";
/// Environment variable overriding `http.endpoint`.
pub const ENDPOINT_ENV: &str = "PROMPT_RELAY_HTTP_ENDPOINT";
/// Environment variable overriding `process.executable`.
pub const RUNNER_ENV: &str = "PROMPT_RELAY_RUNNER";

/// Placeholder in `process.args` replaced by the resolved model identifier.
pub const MODEL_PLACEHOLDER: &str = "{model}";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Model used by the HTTP and process backends when the caller names none.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub process: ProcessConfig,
}

/// In-process chat library (first in the chain).
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub provider: crate::llm::Provider,
    /// Model used by the library when the caller names none.
    #[serde(default = "default_library_model")]
    pub model: String,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: crate::llm::Provider::default(),
            model: default_library_model(),
            api_key_env: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Local model-serving HTTP endpoint (second in the chain).
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sent as the request's `stream` field when set; omitted otherwise.
    #[serde(default)]
    pub stream: Option<bool>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            stream: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Command-line model runner (last in the chain).
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessConfig {
    #[serde(default = "default_executable")]
    pub executable: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Kill the runner after this many seconds. Unbounded when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            args: default_args(),
            timeout_secs: None,
        }
    }
}

impl ProcessConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

// Defaults
fn default_model() -> String {
    "hf.co/bartowski/Llama-3.2-1B-Instruct-GGUF".into()
}
fn default_library_model() -> String {
    "gpt-4".into()
}
fn default_true() -> bool {
    true
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_endpoint() -> String {
    "http://localhost:11434/api/generate".into()
}
fn default_executable() -> String {
    "ollama".into()
}
fn default_args() -> Vec<String> {
    vec!["run".into(), MODEL_PLACEHOLDER.into()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            library: LibraryConfig::default(),
            http: HttpConfig::default(),
            process: ProcessConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Load `path` if it exists, otherwise use built-in defaults. A file that
    /// exists but fails to parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `PROMPT_RELAY_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(model) = get(MODEL_ENV) {
            self.default_model = model;
        }
        if let Some(endpoint) = get(ENDPOINT_ENV) {
            self.http.endpoint = endpoint;
        }
        if let Some(runner) = get(RUNNER_ENV) {
            self.process.executable = runner;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_model.trim().is_empty() {
            return Err(Error::config("default_model must not be empty"));
        }
        if self.http.endpoint.trim().is_empty() {
            return Err(Error::config("http.endpoint must not be empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::config("http.timeout_secs must be greater than zero"));
        }
        if self.process.executable.trim().is_empty() {
            return Err(Error::config("process.executable must not be empty"));
        }
        Ok(())
    }
}
