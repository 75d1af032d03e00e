use apiprobe::catalog::{CatalogError, CatalogLoader};
use apiprobe::resolver::ResolveError;
use apiprobe::secrets::SecretStoreError;
use apiprobe::{ProbeError, Result};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_resolve_error() {
    let err: ProbeError = ResolveError::SelfReference {
        id: "aaaaaaaaaa".to_string(),
    }
    .into();
    assert_eq!(
        err.to_string(),
        "dependency resolution error: request \"aaaaaaaaaa\" references itself as pre-request"
    );
}

#[test]
fn test_secret_store_error() {
    let err: ProbeError = SecretStoreError::Duplicate("b29ff12b50".to_string()).into();
    assert_eq!(
        err.to_string(),
        "secret store error: secret hash \"b29ff12b50\" already exists"
    );
}

#[test]
fn test_duplicate_id_catalog_error() {
    let temp_dir = TempDir::new().unwrap();
    let definition = r#"[{ "id": "aaaaaaaaaa", "request": { "endpoint": "/a" } }]"#;
    std::fs::write(temp_dir.path().join("a.json"), definition).unwrap();
    std::fs::write(temp_dir.path().join("b.json"), definition).unwrap();

    let err = CatalogLoader::load_dir(temp_dir.path()).unwrap_err();
    match &err {
        CatalogError::DuplicateId { id, first, second } => {
            assert_eq!(id, "aaaaaaaaaa");
            assert_eq!(first, &PathBuf::from("a.json"));
            assert_eq!(second, &PathBuf::from("b.json"));
        }
        other => panic!("Expected DuplicateId, got {other:?}"),
    }

    let err: ProbeError = err.into();
    assert!(err.to_string().starts_with("catalog error: duplicate request id"));
}

#[test]
fn test_error_conversion_from_anyhow() {
    let anyhow_err = anyhow::anyhow!("test anyhow error");
    let probe_err: ProbeError = anyhow_err.into();
    assert!(probe_err.to_string().contains("test anyhow error"));
}

#[test]
fn test_result_type() {
    fn returns_error() -> Result<()> {
        Err(ProbeError::Other("test".to_string()))
    }

    match returns_error() {
        Err(ProbeError::Other(msg)) => assert_eq!(msg, "test"),
        _ => panic!("Expected Other"),
    }
}
