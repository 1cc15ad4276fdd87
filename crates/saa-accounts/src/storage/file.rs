//! File-backed storage: one JSON file per key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::KeyValueStorage;
use crate::{Error, Result};

/// Application directory name under the platform data directory.
const APP_DIR: &str = "saa";

/// Storage that keeps each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `dir`.
    ///
    /// The directory is created on the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a storage in the platform data directory.
    #[must_use]
    pub fn in_data_dir() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::new(dir)
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key is empty or could escape the directory.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.contains(['/', '\\', '\0'])
            || key.contains("..")
        {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored value at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, value)?;
        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());
        assert!(storage.get("saa_accounts_v1").unwrap().is_none());
    }

    #[test]
    fn set_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(tmp.path().join("nested").join("dir"));
        storage.set("slot", "[]").unwrap();

        assert_eq!(storage.get("slot").unwrap().as_deref(), Some("[]"));
        assert!(storage.dir().join("slot.json").exists());
    }

    #[test]
    fn set_overwrites() {
        let tmp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(tmp.path());
        storage.set("slot", "[1]").unwrap();
        storage.set("slot", "[]").unwrap();
        assert_eq!(storage.get("slot").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn rejects_escaping_keys() {
        let tmp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(tmp.path());
        for key in ["", "../x", "a/b", "a\\b", ".."] {
            assert!(
                matches!(storage.set(key, "[]"), Err(Error::InvalidKey(_))),
                "key {key:?}"
            );
            assert!(matches!(storage.get(key), Err(Error::InvalidKey(_))));
        }
    }

    #[test]
    fn read_error_propagates() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("slot.json")).unwrap();
        let storage = FileStorage::new(tmp.path());
        assert!(matches!(storage.get("slot"), Err(Error::Io(_))));
    }

    #[test]
    fn data_dir_location() {
        let storage = FileStorage::in_data_dir();
        assert!(storage.dir().ends_with(APP_DIR));
    }
}
