use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret store IO error on \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt secret store entry at line {line}: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },

    #[error("secret hash \"{0}\" already exists")]
    Duplicate(String),

    #[error("invalid seed row {line}: expected \"hash,secret\"")]
    InvalidSeedRow { line: usize },

    #[error("secret store lock poisoned")]
    Poisoned,
}

/// Hash to obfuscated-secret lookup.
///
/// A miss is `Ok(None)`. `Err` means the store itself could not be read, which is fatal for
/// secret resolution.
pub trait SecretStore {
    fn lookup(&self, hash: &str) -> Result<Option<String>, SecretStoreError>;

    fn insert(&self, hash: &str, obfuscated: &str) -> Result<(), SecretStoreError>;

    fn count(&self) -> Result<usize, SecretStoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SecretEntry {
    hash: String,
    secret: String,
}

/// Append-only JSON-lines store.
///
/// # Concurrency Strategy
/// Writers take an exclusive `fs2` lock for the duration of the append, readers a shared one,
/// so several probe processes can share one store file.
pub struct FileSecretStore {
    file_path: PathBuf,
}

impl FileSecretStore {
    pub fn new<P: Into<PathBuf>>(file_path: P) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn io_error(&self, source: std::io::Error) -> SecretStoreError {
        error!(
            "Secret store failure on \"{}\". Error: {}",
            self.file_path.display(),
            source
        );
        SecretStoreError::Io {
            path: self.file_path.clone(),
            source,
        }
    }

    fn ensure_dir(&self) -> Result<(), SecretStoreError> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<SecretEntry>, SecretStoreError> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.file_path).map_err(|e| self.io_error(e))?;
        file.lock_shared().map_err(|e| self.io_error(e))?;

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str::<SecretEntry>(&line).map_err(|source| {
                SecretStoreError::Corrupt {
                    line: index + 1,
                    source,
                }
            })?;
            entries.push(entry);
        }
        // Unlock on drop
        Ok(entries)
    }
}

impl SecretStore for FileSecretStore {
    fn lookup(&self, hash: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|entry| entry.hash == hash)
            .map(|entry| entry.secret))
    }

    fn insert(&self, hash: &str, obfuscated: &str) -> Result<(), SecretStoreError> {
        if self.lookup(hash)?.is_some() {
            return Err(SecretStoreError::Duplicate(hash.to_string()));
        }

        self.ensure_dir()?;
        let json = serde_json::to_string(&SecretEntry {
            hash: hash.to_string(),
            secret: obfuscated.to_string(),
        })
        .map_err(|source| SecretStoreError::Corrupt { line: 0, source })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|e| self.io_error(e))?;

        file.lock_exclusive().map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", json).map_err(|e| self.io_error(e))?;
        drop(file);

        Ok(())
    }

    fn count(&self) -> Result<usize, SecretStoreError> {
        Ok(self.read_all()?.len())
    }
}

/// In-process store, handy for tests and dry runs.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn lookup(&self, hash: &str) -> Result<Option<String>, SecretStoreError> {
        let entries = self.entries.lock().map_err(|_| SecretStoreError::Poisoned)?;
        Ok(entries.get(hash).cloned())
    }

    fn insert(&self, hash: &str, obfuscated: &str) -> Result<(), SecretStoreError> {
        let mut entries = self.entries.lock().map_err(|_| SecretStoreError::Poisoned)?;
        if entries.contains_key(hash) {
            return Err(SecretStoreError::Duplicate(hash.to_string()));
        }
        entries.insert(hash.to_string(), obfuscated.to_string());
        Ok(())
    }

    fn count(&self) -> Result<usize, SecretStoreError> {
        let entries = self.entries.lock().map_err(|_| SecretStoreError::Poisoned)?;
        Ok(entries.len())
    }
}

/// Bulk-load `hash,secret` rows into an empty store.
///
/// Returns the number of inserted rows; a store that already has entries is left alone.
pub fn seed_from_csv<P: AsRef<Path>>(
    store: &dyn SecretStore,
    seed_file: P,
) -> Result<usize, SecretStoreError> {
    let seed_file = seed_file.as_ref();
    if store.count()? > 0 {
        return Ok(0);
    }

    if !seed_file.exists() {
        debug!("No seed file at \"{}\"", seed_file.display());
        return Ok(0);
    }

    let content = fs::read_to_string(seed_file).map_err(|source| SecretStoreError::Io {
        path: seed_file.to_path_buf(),
        source,
    })?;

    let mut inserted = 0;
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (hash, secret) = line
            .split_once(',')
            .ok_or(SecretStoreError::InvalidSeedRow { line: index + 1 })?;
        store.insert(hash.trim(), secret.trim())?;
        inserted += 1;
    }

    info!("Seeded secret store with {} entries", inserted);
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_insert_and_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSecretStore::new(temp_dir.path().join("db").join("secrets.jsonl"));

        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.lookup("b29ff12b50").unwrap(), None);

        store.insert("b29ff12b50", "eyXXX.obfuscated.YYY").unwrap();
        store.insert("0a1b2c3d4e", "eyAAA.other.BBB").unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(
            store.lookup("b29ff12b50").unwrap().as_deref(),
            Some("eyXXX.obfuscated.YYY")
        );
    }

    #[test]
    fn test_file_store_rejects_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSecretStore::new(temp_dir.path().join("secrets.jsonl"));

        store.insert("b29ff12b50", "first").unwrap();
        let err = store.insert("b29ff12b50", "second").unwrap_err();
        assert!(matches!(err, SecretStoreError::Duplicate(_)));
        assert_eq!(store.lookup("b29ff12b50").unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.jsonl");
        fs::write(&path, "{\"hash\":\"a\",\"secret\":\"b\"}\nnot json\n").unwrap();

        let store = FileSecretStore::new(path);
        let err = store.lookup("a").unwrap_err();
        assert!(matches!(err, SecretStoreError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn test_seed_only_fills_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let seed = temp_dir.path().join("seed.csv");
        fs::write(&seed, "b29ff12b50,eyXXX.one.YYY\n\n0a1b2c3d4e,eyXXX.two.YYY\n").unwrap();

        let store = MemorySecretStore::new();
        assert_eq!(seed_from_csv(&store, &seed).unwrap(), 2);
        assert_eq!(seed_from_csv(&store, &seed).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_seed_missing_file() {
        let store = MemorySecretStore::new();
        assert_eq!(seed_from_csv(&store, "/nonexistent/seed.csv").unwrap(), 0);
    }
}
