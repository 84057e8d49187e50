//! File-backed store persisting every key in a single JSON document.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{KeyValueStore, StorageError};

/// Store whose document is re-read on every access.
///
/// Writes replace the whole document through a temporary sibling file so a
/// crash never leaves a half-written store behind. Concurrent processes see
/// each other's writes on their next read; writes are not coordinated.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by the document at `path`. The file is created
    /// lazily on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        // Undecodable bytes, including invalid UTF-8, surface as `Decode`.
        serde_json::from_slice(&contents).map_err(|source| StorageError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn load_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.load() {
            Err(StorageError::Decode { path, source }) => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "discarding unreadable store document"
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let encoded = serde_json::to_string_pretty(values).map_err(|source| {
            StorageError::Encode {
                key: String::from("*"),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }

        let staging = self.path.with_extension("json.tmp");
        let mut file = File::create(&staging).map_err(|source| self.io_error(source))?;
        file.write_all(encoded.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|source| self.io_error(source))?;
        drop(file);
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut values = self.load()?;
        Ok(values.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let mut values = self.load_for_write()?;
        let _ = values.insert(key.to_owned(), value);
        self.persist(&values)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut values = self.load_for_write()?;
        if values.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&values)
    }
}
