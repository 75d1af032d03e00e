use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One declaratively authored HTTP call plus its test-case variations.
///
/// Values are created once by the catalog loader and never mutated afterwards; every later
/// stage (secret resolution, token injection, variant expansion) builds a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefinition {
    /// Canonically a 10-character lowercase hex string
    pub id: String,

    /// Inactive definitions stay in the plan but are not executed
    pub is_active: bool,

    /// The response of an auth request is relayed as a bearer token
    pub is_auth_request: bool,

    /// Id of the definition that has to run first
    pub pre_request_id: Option<String>,

    pub tags: Vec<String>,

    pub request: HttpRequestSpec,

    pub test_cases: Vec<TestCaseOverride>,

    /// Query expression applied to JSON responses (empty means pretty-print only)
    pub query: String,

    /// Definition file path, relative to the input root
    pub source_file: PathBuf,

    /// The source file holds more than one definition, so outputs are told apart by id
    pub shares_source_file: bool,
}

impl RequestDefinition {
    /// Create a bare definition, mostly useful for building plans by hand.
    pub fn new(id: impl Into<String>, source_file: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            is_active: true,
            is_auth_request: false,
            pre_request_id: None,
            tags: Vec::new(),
            request: HttpRequestSpec::default(),
            test_cases: Vec::new(),
            query: String::new(),
            source_file: source_file.into(),
            shares_source_file: false,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether any header marks the body as `application/x-www-form-urlencoded`
    pub fn is_form_encoded(&self) -> bool {
        is_form_encoded(&self.request.headers)
    }

    pub fn test_case_name(&self, index: usize) -> &str {
        self.test_cases
            .get(index)
            .map(|tc| tc.name.as_str())
            .unwrap_or_default()
    }
}

/// HTTP-level details of a definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpRequestSpec {
    pub description: String,
    pub method: String,
    pub base_url: String,
    pub endpoint: String,

    /// `user:password`, may contain a secret placeholder
    pub basic_auth: String,

    /// `"Key: value"` entries in authoring order
    pub headers: Vec<String>,

    /// `"key=value"` query parameters in authoring order
    pub params: Vec<String>,

    /// Normalized body: empty, opaque form string or compact JSON
    pub post_body: String,
}

/// Input variation of a definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestCaseOverride {
    pub name: String,

    /// Single `key=value` query parameter override
    pub params_data: Option<String>,

    /// Replacement body, normalized like the primary body
    pub post_body_data: Option<String>,
}

impl TestCaseOverride {
    /// Both fields empty means the test case produces no variant.
    pub fn is_empty(&self) -> bool {
        self.params_data.is_none() && self.post_body_data.is_none()
    }
}

pub(crate) fn is_form_encoded(headers: &[String]) -> bool {
    headers
        .iter()
        .any(|h| h.contains("x-www-form-urlencoded"))
}

/// Catalog load failures. Any of them aborts the run before execution starts.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to walk input directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse \"{}\": {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to normalize body of request \"{id}\": {source}")]
    Body {
        id: String,
        source: serde_json::Error,
    },

    #[error(
        "duplicate request id \"{id}\" in \"{}\" and \"{}\"",
        first.display(),
        second.display()
    )]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

// === On-disk representation ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDefinition {
    pub id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_auth_request: bool,
    #[serde(default)]
    pub pre_request_id: String,
    pub request: RawRequest,
    #[serde(default)]
    pub test_cases: Vec<RawTestCase>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "jq")]
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default, rename = "url")]
    pub base_url: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub basic_auth: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub post_body: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTestCase {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub params_data: String,
    #[serde(default)]
    pub post_body_data: Value,
}

fn default_active() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}
