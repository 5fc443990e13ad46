use crate::errors::CoreError;
use crate::models::ledger::EntityKind;

/// Identifies one mirrored collection: a (user, entity kind) pair under a
/// namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MirrorKey {
    pub namespace: String,
    pub user_id: String,
    pub kind: EntityKind,
}

impl MirrorKey {
    pub fn new(namespace: impl Into<String>, user_id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            namespace: namespace.into(),
            user_id: user_id.into(),
            kind,
        }
    }

    /// `<namespace>:<user_id>:<kind>`, the key used by key/value backends.
    pub fn storage_key(&self) -> String {
        format!("{}:{}:{}", self.namespace, self.user_id, self.kind.table())
    }

    /// Filesystem-safe form of the key (no extension).
    ///
    /// Each component is percent-encoded and the parts are joined with `=`,
    /// which the encoding always escapes, so distinct keys never share a file.
    pub fn file_name(&self) -> String {
        format!(
            "{}={}={}",
            urlencoding::encode(&self.namespace),
            urlencoding::encode(&self.user_id),
            self.kind.table()
        )
    }
}

/// On-device key/value persistence holding one JSON document per key.
///
/// Implementations must be cheap and local; the ledger treats them as always
/// available. An `Err` here means the device store itself is broken.
pub trait LocalMirror: Send + Sync {
    /// Stored document for `key`, or `None` if nothing was ever written.
    fn read(&self, key: &MirrorKey) -> Result<Option<String>, CoreError>;

    /// Replace the document stored under `key`.
    fn write(&self, key: &MirrorKey, json: &str) -> Result<(), CoreError>;

    /// Drop `key`. Removing a missing key is not an error.
    fn remove(&self, key: &MirrorKey) -> Result<(), CoreError>;
}
