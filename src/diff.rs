use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

/// Compare `content` with the file at `output_path` and overwrite it when they differ.
///
/// The file and its parent directories are created empty when missing, so the first call for
/// any non-empty content reports a change. Equality is decided on SHA-256 digests.
pub fn has_changed(content: &[u8], output_path: &Path) -> io::Result<bool> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_path)?;

    let existing = fs::read(output_path)?;
    if Sha256::digest(content) == Sha256::digest(&existing) {
        debug!("No change in \"{}\"", output_path.display());
        return Ok(false);
    }

    fs::write(output_path, content)?;
    debug!("Updated \"{}\"", output_path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_first_call_reports_change() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("users-test-case-00.json");

        assert!(has_changed(b"{\"page\":1}", &path).unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"{\"page\":1}");
    }

    #[test]
    fn test_identical_content_is_not_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users-test-case-00.json");

        assert!(has_changed(b"same", &path).unwrap());
        let modified = fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert!(!has_changed(b"same", &path).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_changed_content_is_written() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users-test-case-00.json");

        has_changed(b"v1", &path).unwrap();
        assert!(has_changed(b"v2", &path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
    }

    #[test]
    fn test_empty_content_on_first_call() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.json");

        assert!(!has_changed(b"", &path).unwrap());
        assert!(path.exists());
    }
}
