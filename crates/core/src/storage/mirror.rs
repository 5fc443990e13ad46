use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::ledger::EntityKind;

use super::traits::{LocalMirror, MirrorKey};

/// Typed view of a `LocalMirror` bound to one user.
///
/// Each entity kind is stored as a JSON array of domain records (not wire
/// rows) under its own key.
#[derive(Clone)]
pub struct UserMirror {
    backend: Arc<dyn LocalMirror>,
    namespace: String,
    user_id: String,
}

impl UserMirror {
    pub fn new(
        backend: Arc<dyn LocalMirror>,
        namespace: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn key(&self, kind: EntityKind) -> MirrorKey {
        MirrorKey::new(self.namespace.clone(), self.user_id.clone(), kind)
    }

    /// Stored records of `kind`; a key that was never written reads as empty.
    pub fn load<T: DeserializeOwned>(&self, kind: EntityKind) -> Result<Vec<T>, CoreError> {
        match self.backend.read(&self.key(kind))? {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                CoreError::Deserialization(format!("Corrupt mirror entry for {kind}: {e}"))
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Replace every stored record of `kind`.
    pub fn save<T: Serialize>(&self, kind: EntityKind, items: &[T]) -> Result<(), CoreError> {
        let json = serde_json::to_string(items)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize {kind}: {e}")))?;
        self.backend.write(&self.key(kind), &json)
    }

    pub fn clear(&self, kind: EntityKind) -> Result<(), CoreError> {
        self.backend.remove(&self.key(kind))
    }
}
