/// Save sinks. The engine hands a sink an opaque text blob and asks for it
/// back; what the blob contains is the session's business.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("save data is corrupted: {0}")]
    Deserialize(#[from] ron::error::SpannedError),
}

/// Where saves go. A single slot: saving overwrites.
pub trait SaveSink {
    fn save(&mut self, blob: &str) -> Result<(), PersistenceError>;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<String>, PersistenceError>;
}

/// Keeps the blob in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    blob: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl SaveSink for MemorySink {
    fn save(&mut self, blob: &str) -> Result<(), PersistenceError> {
        self.blob = Some(blob.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self.blob.clone())
    }
}

/// Stores the blob in a single file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveSink for FileSink {
    fn save(&mut self, blob: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("ron.tmp");
        fs::write(&temp_path, blob)?;
        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), bytes = blob.len(), "wrote save");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let blob = fs::read_to_string(&self.path)?;
        debug!(path = %self.path.display(), bytes = blob.len(), "read save");
        Ok(Some(blob))
    }
}

pub fn encode<T: Serialize>(value: &T) -> Result<String, PersistenceError> {
    Ok(ron::to_string(value)?)
}

pub fn decode<T: DeserializeOwned>(blob: &str) -> Result<T, PersistenceError> {
    Ok(ron::from_str(blob)?)
}
