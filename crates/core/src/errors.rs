use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for the entire finance-ledger-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Local mirror / File ─────────────────────────────────────────
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed — wrong passphrase or corrupted mirror file")]
    Decryption,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Remote store ────────────────────────────────────────────────
    #[error("Remote store error ({store}): {message}")]
    Remote { store: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote store is offline")]
    Offline,

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("No accounts available")]
    NoAccounts,

    #[error("Insufficient balance: {required} required, best account holds {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },
}

impl CoreError {
    /// Errors raised by the remote store. These trigger the local-mirror
    /// fallback instead of reaching the caller.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            CoreError::Remote { .. } | CoreError::Network(_) | CoreError::Offline
        )
    }

    /// Errors the UI shows to the user as-is.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::ValidationError(_)
                | CoreError::NotFound { .. }
                | CoreError::NoAccounts
                | CoreError::InsufficientBalance { .. }
        )
    }

    pub(crate) fn not_found(kind: &str, id: &str) -> Self {
        CoreError::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; the query holds user filters and
        // must not end up in logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl From<aes_gcm::Error> for CoreError {
    fn from(_: aes_gcm::Error) -> Self {
        CoreError::Decryption
    }
}
