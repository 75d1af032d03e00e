pub mod auth;
pub mod catalog;
pub mod config;
pub mod diff;
pub mod error;
pub mod http;
pub mod logger;
pub mod query;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod secrets;
pub mod selection;
pub mod shutdown;
pub mod variant;

// Re-export commonly used types
pub use auth::TokenRelay;
pub use catalog::{CatalogLoader, RequestDefinition, TestCaseOverride, load_catalog};
pub use error::{ProbeError, Result};
pub use runner::{Executor, PlanOptions, RunOutcome, build_plan};
pub use variant::ResolvedRequest;
