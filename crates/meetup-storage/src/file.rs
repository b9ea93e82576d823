//! JSON-file storage backend.
//!
//! The whole store is a single JSON object. Every operation goes to disk so
//! that separate client processes observe each other's writes; a mutex
//! serialises access within one process.

use crate::{DurableStorage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type Entries = BTreeMap<String, String>;

/// File-backed durable storage.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or lazily create) storage at `path`. The file is created on the
    /// first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> StorageResult<Entries> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Encoding(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Entries to start a write from, and whether the file had to be
    /// discarded. A file that can't be parsed is replaced by the write.
    fn entries_for_write(&self) -> StorageResult<(Entries, bool)> {
        match self.read_entries() {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::Encoding(e)) => {
                warn!(error = %e, "Discarding unreadable storage file");
                Ok((Entries::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_entries(&self, entries: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

impl DurableStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock();
        debug!(path = %self.path.display(), key = %key, "Setting stored value");

        let (mut entries, _) = self.entries_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_entries()?.remove(key))
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock();

        let (mut entries, discarded) = self.entries_for_write()?;
        if entries.remove(key).is_none() && !discarded {
            return Ok(false);
        }
        debug!(path = %self.path.display(), key = %key, "Deleted stored value");
        self.write_entries(&entries)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("tokens.json"));

        assert_eq!(storage.get("access_token").unwrap(), None);
        assert!(!storage.delete("access_token").unwrap());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("tokens.json");

        FileStorage::new(&path).set("access_token", "abc").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("access_token").unwrap(), Some("abc".to_string()));
    }

    #[test]
    fn test_delete_removes_only_target_key() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("tokens.json"));

        storage.set("access_token", "a").unwrap();
        storage.set("refresh_token", "r").unwrap();

        assert!(storage.delete("access_token").unwrap());
        assert_eq!(storage.get("access_token").unwrap(), None);
        assert_eq!(storage.get("refresh_token").unwrap(), Some("r".to_string()));
    }

    #[test]
    fn test_corrupt_file_is_an_encoding_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get("access_token"), Err(StorageError::Encoding(_))));
    }

    #[test]
    fn test_corrupt_file_is_replaced_on_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{ not json").unwrap();
        let storage = FileStorage::new(&path);

        assert!(storage.delete("access_token").unwrap());
        assert_eq!(storage.get("access_token").unwrap(), None);

        std::fs::write(&path, "[1, 2").unwrap();
        storage.set("access_token", "fresh").unwrap();
        assert_eq!(storage.get("access_token").unwrap(), Some("fresh".to_string()));
        assert_eq!(storage.get("refresh_token").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("tokens.json"));
        storage.set("refresh_token", "r").unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
