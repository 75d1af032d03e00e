use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::catalog::RequestDefinition;
use crate::http::{
    ExecutionError, ExecutionLimits, HttpDelegate, HttpOutcome, build_url, encode_form_body,
    is_success, sends_body,
};

const STATUS_CODE_LEN: usize = 3;
const INDENT: &str = "     ";

/// Flags whose value is shown unquoted in the debug listing
const BARE_VALUE_FLAGS: [&str; 3] = ["--request", "--connect-timeout", "--max-time"];

/// Flags that take a value
const VALUE_FLAGS: [&str; 8] = [
    "--request",
    "--connect-timeout",
    "--max-time",
    "--url",
    "--write-out",
    "--data",
    "--user",
    "--header",
];

/// Runs requests through an external `curl` process.
pub struct CurlClient {
    program: PathBuf,
    limits: ExecutionLimits,
    debug_mode: bool,
}

impl CurlClient {
    pub fn new(program: impl Into<PathBuf>, limits: ExecutionLimits, debug_mode: bool) -> Self {
        Self {
            program: program.into(),
            limits,
            debug_mode,
        }
    }
}

/// Command line arguments for one request.
///
/// The status code is appended to the body with `--write-out`.
pub fn curl_args(
    def: &RequestDefinition,
    limits: &ExecutionLimits,
) -> Result<Vec<String>, ExecutionError> {
    let spec = &def.request;
    let url = build_url(spec)?;

    let mut args: Vec<String> = vec![
        "--request".into(),
        spec.method.clone(),
        "--silent".into(),
        "--location".into(),
        "--insecure".into(),
        "--connect-timeout".into(),
        limits.connect_timeout.as_secs().to_string(),
        "--max-time".into(),
        limits.max_time.as_secs().to_string(),
        "--url".into(),
        url.to_string(),
        "--write-out".into(),
        "%{http_code}".into(),
    ];

    if spec.method == "GET" {
        args.push("--get".into());
    }

    if sends_body(&spec.method, &spec.post_body) {
        let body = if def.is_form_encoded() {
            encode_form_body(&spec.post_body)
        } else {
            spec.post_body.clone()
        };
        args.push("--data".into());
        args.push(body);
    }

    if !spec.basic_auth.is_empty() {
        args.push("--user".into());
        args.push(spec.basic_auth.clone());
    }

    for header in &spec.headers {
        args.push("--header".into());
        args.push(header.clone());
    }

    Ok(args)
}

/// Multi-line, shell-quoted rendering of a curl invocation.
pub fn format_curl_command(args: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut iter = args.iter();

    while let Some(flag) = iter.next() {
        let rendered = if VALUE_FLAGS.contains(&flag.as_str()) {
            let value = iter.next().map(String::as_str).unwrap_or_default();
            if BARE_VALUE_FLAGS.contains(&flag.as_str()) {
                format!("{} {}", flag, value)
            } else {
                format!("{} '{}'", flag, value.replace('\'', "'\\''"))
            }
        } else {
            flag.clone()
        };

        if lines.is_empty() {
            lines.push(format!("curl {}", rendered));
        } else {
            lines.push(format!("{}{}", INDENT, rendered));
        }
    }

    if lines.is_empty() {
        return "curl".to_string();
    }
    lines.join(" \\\n")
}

/// Split curl stdout into body and the trailing three-digit status code.
pub fn split_status(mut output: Vec<u8>) -> Result<HttpOutcome, ExecutionError> {
    if output.len() < STATUS_CODE_LEN {
        warn!(
            "Output too short to contain status code: only {} bytes",
            output.len()
        );
        return Err(ExecutionError::MissingStatus(output.len()));
    }

    let status_bytes = output.split_off(output.len() - STATUS_CODE_LEN);
    Ok(HttpOutcome {
        body: output,
        status: String::from_utf8_lossy(&status_bytes).into_owned(),
    })
}

#[async_trait]
impl HttpDelegate for CurlClient {
    async fn execute(&self, def: &RequestDefinition) -> Result<HttpOutcome, ExecutionError> {
        let args = curl_args(def, &self.limits)?;
        if self.debug_mode {
            debug!("\n{}", format_curl_command(&args));
        }

        debug!("Executing endpoint request \"{}\"", def.request.endpoint);
        info!("Description: \"{}\"", def.request.description);

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| {
                error!("Curl execution failed. Error: {}", source);
                ExecutionError::Spawn {
                    program: self.program.clone(),
                    source,
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Curl execution failed. Exit: {}", output.status);
            return Err(ExecutionError::Transport(format!(
                "curl exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let outcome = split_status(output.stdout)?;
        debug!(
            "Status: {}, Duration: {}ms",
            outcome.status,
            start.elapsed().as_millis()
        );

        if !is_success(&outcome.status) {
            warn!("Non-2xx status code received: status {}", outcome.status);
            return Err(ExecutionError::Status {
                status: outcome.status,
            });
        }

        Ok(outcome)
    }
}
