//! Object storage seam for uploaded files.
//!
//! Paths are relative, `/`-separated, and may not escape the store root.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object path: {0}")]
    InvalidPath(String),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal lock error")]
    LockPoisoned,
}

pub trait ObjectStore: Send + Sync {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
    fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;
}

/// Reject empty, absolute, or parent-traversing paths.
fn validate_path(path: &str) -> Result<&Path, StorageError> {
    let p = Path::new(path);
    let ok = !path.is_empty()
        && p.components().all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(p)
    } else {
        Err(StorageError::InvalidPath(path.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════
// Filesystem store
// ═══════════════════════════════════════════════════════════

pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

}

impl ObjectStore for FsObjectStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.root.join(validate_path(path)?);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.root.join(validate_path(path)?);
        match std::fs::read(&target) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════════════════════

/// Volatile store used by `CoreState::in_memory`.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        validate_path(path)?;
        let mut objects = self.objects.lock().map_err(|_| StorageError::LockPoisoned)?;
        objects.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_path(path)?;
        let objects = self.objects.lock().map_err(|_| StorageError::LockPoisoned)?;
        objects
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}
