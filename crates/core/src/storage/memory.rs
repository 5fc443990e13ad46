use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::CoreError;

use super::traits::{LocalMirror, MirrorKey};

/// In-process mirror. Nothing survives a restart; used for tests and for
/// sessions without a mirror directory.
#[derive(Debug, Default)]
pub struct MemoryMirror {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> CoreError {
    CoreError::FileIO("memory mirror lock poisoned".into())
}

impl LocalMirror for MemoryMirror {
    fn read(&self, key: &MirrorKey) -> Result<Option<String>, CoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(&key.storage_key()).cloned())
    }

    fn write(&self, key: &MirrorKey, json: &str) -> Result<(), CoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.storage_key(), json.to_string());
        Ok(())
    }

    fn remove(&self, key: &MirrorKey) -> Result<(), CoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(&key.storage_key());
        Ok(())
    }
}
