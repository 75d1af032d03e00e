pub mod client;
pub mod curl;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::catalog::{HttpRequestSpec, RequestDefinition};
use crate::config::ExecutorConfig;

pub use client::NativeClient;
pub use curl::CurlClient;

/// Raw outcome of a successful (2xx) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOutcome {
    pub body: Vec<u8>,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("invalid request URL \"{url}\": {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("invalid HTTP method \"{0}\"")]
    InvalidMethod(String),

    #[error("invalid header \"{0}\", expected \"Key: value\"")]
    InvalidHeader(String),

    #[error("non-2xx status {status}")]
    Status { status: String },

    #[error("failed to start \"{}\": {source}", program.display())]
    Spawn { program: PathBuf, source: io::Error },

    #[error("output too short to contain a status code ({0} bytes)")]
    MissingStatus(usize),

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl ExecutionError {
    /// The status code to report, empty when the call never got an answer.
    pub fn status_code(&self) -> &str {
        match self {
            ExecutionError::Status { status } => status,
            _ => "",
        }
    }
}

/// Connect and total time limits of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub connect_timeout: Duration,
    pub max_time: Duration,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(8),
            max_time: Duration::from_secs(24),
        }
    }
}

impl From<&ExecutorConfig> for ExecutionLimits {
    fn from(config: &ExecutorConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            max_time: Duration::from_secs(config.max_time_secs),
        }
    }
}

/// Executes one request. A single attempt; non-2xx answers are errors.
#[async_trait]
pub trait HttpDelegate: Send + Sync {
    async fn execute(&self, def: &RequestDefinition) -> Result<HttpOutcome, ExecutionError>;
}

/// `base_url + endpoint`, with the params joined by `&` as query string.
pub fn build_url(spec: &HttpRequestSpec) -> Result<Url, ExecutionError> {
    let raw = format!("{}{}", spec.base_url, spec.endpoint);
    let mut url = Url::parse(&raw).map_err(|source| ExecutionError::InvalidUrl {
        url: raw.clone(),
        source,
    })?;

    if !spec.params.is_empty() {
        let params = spec.params.join("&");
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, params),
            _ => params,
        };
        url.set_query(Some(&query));
    }

    Ok(url)
}

/// Whether the body goes on the wire for this method.
pub fn sends_body(method: &str, body: &str) -> bool {
    !body.is_empty() && !matches!(method, "GET" | "HEAD")
}

/// Re-encode an opaque form body so every key and value is properly escaped.
pub fn encode_form_body(body: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(url::form_urlencoded::parse(body.as_bytes()))
        .finish()
}

/// Split a `"Key: value"` header line.
pub fn split_header(header: &str) -> Result<(&str, &str), ExecutionError> {
    header
        .split_once(':')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| ExecutionError::InvalidHeader(header.to_string()))
}

pub(crate) fn is_success(status: &str) -> bool {
    status.starts_with('2')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(base: &str, endpoint: &str, params: &[&str]) -> HttpRequestSpec {
        HttpRequestSpec {
            method: "GET".to_string(),
            base_url: base.to_string(),
            endpoint: endpoint.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_url() {
        let url = build_url(&spec("https://reqres.in", "/api/users", &["page=2", "per_page=6"])).unwrap();
        assert_eq!(url.as_str(), "https://reqres.in/api/users?page=2&per_page=6");
    }

    #[test]
    fn test_build_url_escapes_spaces() {
        let url = build_url(&spec("https://example.com", "/search", &["q=hello world"])).unwrap();
        assert_eq!(url.as_str(), "https://example.com/search?q=hello%20world");
    }

    #[test]
    fn test_build_url_keeps_existing_query() {
        let url = build_url(&spec("https://example.com", "/items?sort=asc", &["page=1"])).unwrap();
        assert_eq!(url.query(), Some("sort=asc&page=1"));
    }

    #[test]
    fn test_build_url_invalid() {
        let result = build_url(&spec("", "/api/users", &[]));
        assert!(matches!(result, Err(ExecutionError::InvalidUrl { .. })));
    }

    #[test]
    fn test_encode_form_body() {
        assert_eq!(
            encode_form_body("grant_type=password&username=j doe&scope=a+b"),
            "grant_type=password&username=j+doe&scope=a+b"
        );
        assert_eq!(encode_form_body("pw=p@ss&x=1"), "pw=p%40ss&x=1");
    }

    #[test]
    fn test_split_header() {
        assert_eq!(
            split_header("Authorization: Bearer a:b").unwrap(),
            ("Authorization", "Bearer a:b")
        );
        assert!(split_header("no separator").is_err());
        assert!(split_header(": value").is_err());
    }

    #[test]
    fn test_sends_body() {
        assert!(sends_body("POST", "{}"));
        assert!(sends_body("PUT", "x"));
        assert!(!sends_body("GET", "x"));
        assert!(!sends_body("POST", ""));
    }

    #[test]
    fn test_status_code_of_error() {
        let err = ExecutionError::Status {
            status: "404".to_string(),
        };
        assert_eq!(err.status_code(), "404");
        assert_eq!(ExecutionError::MissingStatus(1).status_code(), "");
    }
}
