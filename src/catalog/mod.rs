pub mod body;
pub mod loader;
pub mod template;
pub mod types;

// Re-export commonly used types
pub use loader::CatalogLoader;
pub use template::{TEMPLATE_FILE, definition_template};
pub use types::{
    CatalogError, CatalogResult, HttpRequestSpec, RequestDefinition, TestCaseOverride,
};

/// Load every definition file below `input_dir`
pub fn load_catalog<P: AsRef<std::path::Path>>(input_dir: P) -> CatalogResult<Vec<RequestDefinition>> {
    CatalogLoader::load_dir(input_dir)
}
