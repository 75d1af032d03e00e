use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("failed to start \"{}\": {source}", program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("jq failed: {0}")]
    Failed(String),
}

/// Filters a JSON payload with a query expression.
#[async_trait]
pub trait QueryDelegate: Send + Sync {
    async fn apply(&self, expression: &str, payload: &[u8]) -> Result<Vec<u8>, QueryError>;
}

/// Only payloads starting with `{` or `[` are treated as JSON
pub fn is_json(payload: &[u8]) -> bool {
    matches!(payload.first(), Some(b'{') | Some(b'['))
}

/// Pretty-print JSON with a trailing newline, the way `jq .` does.
pub fn pretty_print(payload: &[u8]) -> Result<Vec<u8>, QueryError> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    let mut pretty = serde_json::to_vec_pretty(&value)?;
    pretty.push(b'\n');
    Ok(pretty)
}

/// Run the query over a response body; non-JSON bodies pass through untouched.
pub async fn format_response(
    delegate: &dyn QueryDelegate,
    expression: &str,
    body: Vec<u8>,
) -> Result<Vec<u8>, QueryError> {
    if !is_json(&body) {
        return Ok(body);
    }
    delegate.apply(expression, &body).await
}

/// Empty expressions are pretty-printed in process, everything else goes to the `jq` binary.
pub struct JqQuery {
    program: PathBuf,
}

impl JqQuery {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl QueryDelegate for JqQuery {
    async fn apply(&self, expression: &str, payload: &[u8]) -> Result<Vec<u8>, QueryError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return pretty_print(payload);
        }

        let spawn_error = |source| QueryError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .arg(expression)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = payload.to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    error!("Failed to feed jq. Error: {}", e);
                }
            });
        }

        let output = child.wait_with_output().await.map_err(spawn_error)?;

        if !output.status.success() && output.stdout.is_empty() {
            let message = String::from_utf8_lossy(&output.stderr).replace('\n', " ");
            error!("JQ execution failed. Error: {}", message.trim());
            return Err(QueryError::Failed(message.trim().to_string()));
        }

        Ok(output.stdout)
    }
}
