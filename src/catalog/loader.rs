use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error};
use walkdir::WalkDir;

use crate::catalog::body::normalize_body;
use crate::catalog::types::{
    CatalogError, CatalogResult, HttpRequestSpec, RawDefinition, RawTestCase, RequestDefinition,
    TestCaseOverride, is_form_encoded,
};

const DEFINITION_EXTENSION: &str = "json";

/// Request catalog loader
pub struct CatalogLoader;

impl CatalogLoader {
    /// Walk `input_dir` recursively and parse every definition file.
    ///
    /// Fail-fast: the first unreadable or malformed file aborts the load, there is no
    /// partial catalog. Files are visited in file-name order so runs are reproducible.
    pub fn load_dir<P: AsRef<Path>>(input_dir: P) -> CatalogResult<Vec<RequestDefinition>> {
        let input_dir = input_dir.as_ref();
        let mut requests = Vec::new();

        for entry in WalkDir::new(input_dir).follow_links(false).sort_by_file_name() {
            let entry = entry.inspect_err(|e| error!("Failed to walk path. Error: {}", e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DEFINITION_EXTENSION) {
                continue;
            }

            let relative = path.strip_prefix(input_dir).unwrap_or(path);
            requests.extend(Self::load_file(path, relative)?);
        }

        ensure_unique_ids(&requests)?;

        debug!(
            "Loaded {} request definitions from \"{}\"",
            requests.len(),
            input_dir.display()
        );
        Ok(requests)
    }

    /// Parse a single definition file; `relative` is stamped as the source path.
    pub fn load_file(path: &Path, relative: &Path) -> CatalogResult<Vec<RequestDefinition>> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            error!("Failed to read file \"{}\". Error: {}", path.display(), source);
            CatalogError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::parse_content(&content, relative)
    }

    /// Parse definition file content (a JSON array of definitions).
    pub fn parse_content(content: &str, source_file: &Path) -> CatalogResult<Vec<RequestDefinition>> {
        let raw: Vec<RawDefinition> = serde_json::from_str(content).map_err(|source| {
            error!(
                "Failed to unmarshal JSON \"{}\". Error: {}",
                source_file.display(),
                source
            );
            CatalogError::Parse {
                path: source_file.to_path_buf(),
                source,
            }
        })?;

        let shares_source_file = raw.len() > 1;
        raw.into_iter()
            .map(|r| convert(r, source_file.to_path_buf(), shares_source_file))
            .collect()
    }
}

/// Turn the wire shape into a definition, normalizing every body on the way.
fn convert(
    raw: RawDefinition,
    source_file: PathBuf,
    shares_source_file: bool,
) -> CatalogResult<RequestDefinition> {
    let form_encoded = is_form_encoded(&raw.request.headers);
    let id = raw.id;

    let post_body = normalize_body(&raw.request.post_body, form_encoded).map_err(|source| {
        CatalogError::Body {
            id: id.clone(),
            source,
        }
    })?;

    let test_cases = raw
        .test_cases
        .into_iter()
        .map(|tc| convert_test_case(tc, form_encoded))
        .collect::<serde_json::Result<Vec<_>>>()
        .map_err(|source| CatalogError::Body {
            id: id.clone(),
            source,
        })?;

    Ok(RequestDefinition {
        id,
        is_active: raw.is_active,
        is_auth_request: raw.is_auth_request,
        pre_request_id: non_empty(raw.pre_request_id),
        tags: raw.tags,
        request: HttpRequestSpec {
            description: raw.request.description,
            method: raw.request.method.to_uppercase(),
            base_url: raw.request.base_url,
            endpoint: raw.request.endpoint,
            basic_auth: raw.request.basic_auth,
            headers: raw.request.headers,
            params: raw.request.params,
            post_body,
        },
        test_cases,
        query: raw.query,
        source_file,
        shares_source_file,
    })
}

fn convert_test_case(raw: RawTestCase, form_encoded: bool) -> serde_json::Result<TestCaseOverride> {
    let body = normalize_body(&raw.post_body_data, form_encoded)?;
    Ok(TestCaseOverride {
        name: raw.name,
        params_data: non_empty(raw.params_data),
        post_body_data: non_empty(body),
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn ensure_unique_ids(requests: &[RequestDefinition]) -> CatalogResult<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for req in requests {
        if let Some(first) = seen.insert(req.id.as_str(), req.source_file.as_path()) {
            return Err(CatalogError::DuplicateId {
                id: req.id.clone(),
                first: first.to_path_buf(),
                second: req.source_file.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS: &str = r#"[
        {
            "id": "ff00fceb61",
            "isAuthRequest": false,
            "preRequestId": "",
            "request": {
                "description": "List users",
                "method": "get",
                "url": "https://reqres.in",
                "endpoint": "/api/users",
                "headers": ["Accept: application/json"],
                "params": ["page=1", "per_page=6"],
                "postBody": {}
            },
            "testCases": [
                { "name": "page two", "paramsData": "page=2", "postBodyData": {} },
                { "name": "skip me", "paramsData": "", "postBodyData": {} }
            ],
            "tags": ["reqres", "env-prod"],
            "jq": ".data"
        }
    ]"#;

    #[test]
    fn test_parse_content() {
        let requests = CatalogLoader::parse_content(USERS, Path::new("reqres/users.json")).unwrap();
        assert_eq!(requests.len(), 1);

        let req = &requests[0];
        assert_eq!(req.id, "ff00fceb61");
        assert!(req.is_active);
        assert_eq!(req.pre_request_id, None);
        assert_eq!(req.request.method, "GET");
        assert_eq!(req.request.post_body, "");
        assert_eq!(req.query, ".data");
        assert_eq!(req.source_file, PathBuf::from("reqres/users.json"));
        assert!(!req.shares_source_file);

        assert_eq!(req.test_cases.len(), 2);
        assert_eq!(req.test_cases[0].params_data.as_deref(), Some("page=2"));
        assert!(req.test_cases[1].is_empty());
    }

    #[test]
    fn test_form_encoded_body_and_test_cases() {
        let content = r#"[{
            "id": "0a1b2c3d4e",
            "isAuthRequest": true,
            "request": {
                "method": "POST",
                "url": "https://auth.example.com",
                "endpoint": "/token",
                "headers": ["Content-Type: application/x-www-form-urlencoded"],
                "postBody": "grant_type=password&username=admin"
            },
            "testCases": [
                { "name": "other user", "postBodyData": "grant_type=password&username=guest" }
            ]
        }]"#;

        let requests = CatalogLoader::parse_content(content, Path::new("auth.json")).unwrap();
        let req = &requests[0];
        assert_eq!(req.request.post_body, "grant_type=password&username=admin");
        assert_eq!(
            req.test_cases[0].post_body_data.as_deref(),
            Some("grant_type=password&username=guest")
        );
    }

    #[test]
    fn test_definitions_sharing_a_file_are_marked() {
        let content = r#"[
            { "id": "aaaaaaaaaa", "request": { "endpoint": "/a" } },
            { "id": "bbbbbbbbbb", "request": { "endpoint": "/b" } }
        ]"#;

        let requests = CatalogLoader::parse_content(content, Path::new("pair.json")).unwrap();
        assert!(requests.iter().all(|r| r.shares_source_file));
    }

    #[test]
    fn test_malformed_content_is_an_error() {
        let result = CatalogLoader::parse_content("[{ \"id\": ", Path::new("broken.json"));
        assert!(matches!(result, Err(CatalogError::Parse { .. })));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let a = RequestDefinition::new("ff00fceb61", "a.json");
        let b = RequestDefinition::new("ff00fceb61", "b.json");

        let result = ensure_unique_ids(&[a, b]);
        assert!(matches!(result, Err(CatalogError::DuplicateId { .. })));
    }
}
