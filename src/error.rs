use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::http::ExecutionError;
use crate::report::NotifyError;
use crate::resolver::ResolveError;
use crate::secrets::SecretStoreError;

/// Errors that abort a whole run.
///
/// Everything that can go wrong while a single request executes is contained by the runner
/// and only shows up in the counters and the report.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("dependency resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("secret store error: {0}")]
    SecretStore(#[from] SecretStoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("execution setup error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("notification setup error: {0}")]
    Notify(#[from] NotifyError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for ProbeError {
    fn from(err: anyhow::Error) -> Self {
        ProbeError::Other(err.to_string())
    }
}

/// Result type for the apiprobe crate
pub type Result<T> = std::result::Result<T, ProbeError>;
