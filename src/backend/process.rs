use super::{Backend, Outcome};
use crate::config::{MODEL_PLACEHOLDER, ProcessConfig};
use crate::error::{Error, Result};
use crate::request::PromptRequest;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Runs a CLI model runner (`ollama run <model>` by default) with the prompt
/// on stdin and takes its stdout as the answer.
///
/// Exit status does not decide the outcome: non-empty stdout is kept even
/// when the runner exits non-zero, because some runners print a full answer
/// and then fail on a trailing warning. Truncated output from a crashed
/// runner is indistinguishable from that case and is returned as well.
pub struct ProcessBackend {
    executable: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessBackend {
    pub fn new(executable: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            args,
            timeout: None,
        }
    }

    pub fn from_config(config: &ProcessConfig) -> Self {
        Self::new(config.executable.clone(), config.args.clone()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_args(&self, model: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(MODEL_PLACEHOLDER, model))
            .collect()
    }

    async fn run(&self, prompt: &str, model: &str) -> Result<String> {
        let mut child = Command::new(&self.executable)
            .args(self.command_args(model))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::process(format!("runner '{}' not found", self.executable))
                } else {
                    Error::process(format!("failed to spawn '{}': {e}", self.executable))
                }
            })?;

        // Written from its own task so a runner that never drains stdin
        // cannot block collection of its output.
        if let Some(mut stdin) = child.stdin.take() {
            let input = prompt.to_string();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    debug!(error = %e, "runner closed stdin early");
                }
            });
        }

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    Error::process(format!("'{}' timed out after {limit:?}", self.executable))
                })??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            debug!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "runner exited unsuccessfully, salvaging stdout"
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Backend for ProcessBackend {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn attempt(&self, request: &PromptRequest, default_model: &str) -> Outcome {
        let model = request.model_or(default_model);
        debug!(runner = %self.executable, model, "trying process backend");
        Outcome::from_result(self.name(), self.run(request.text(), model).await)
    }
}
