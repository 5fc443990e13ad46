use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::errors::CoreError;

/// Argon2id parameters for deriving the mirror key from a passphrase.
/// Stored in the mirror's key file so they can be raised later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Number of iterations (default: 3)
    pub time_cost: u32,
    /// Degree of parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65_536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Derive a 256-bit key from a passphrase using Argon2id.
pub fn derive_key(
    passphrase: &str,
    salt: &[u8; 16],
    params: &KdfParams,
) -> Result<[u8; 32], CoreError> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| CoreError::Encryption(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| CoreError::Encryption(format!("Argon2 key derivation failed: {e}")))?;

    Ok(key)
}

/// AES-256-GCM cipher bound to one derived key.
///
/// The key is derived once per mirror; every sealed payload gets a fresh
/// random nonce. The GCM tag covers integrity, so a wrong passphrase or a
/// tampered file both surface as `CoreError::Decryption`.
pub struct MirrorCipher {
    cipher: Aes256Gcm,
}

impl MirrorCipher {
    pub fn new(key: &[u8; 32]) -> Result<Self, CoreError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CoreError::Encryption(format!("Failed to create cipher: {e}")))?;
        Ok(Self { cipher })
    }

    pub fn from_passphrase(
        passphrase: &str,
        salt: &[u8; 16],
        params: &KdfParams,
    ) -> Result<Self, CoreError> {
        let key = derive_key(passphrase, salt, params)?;
        Self::new(&key)
    }

    /// Encrypt `plaintext`; returns the nonce used and the ciphertext
    /// (16-byte tag appended).
    pub fn seal(&self, plaintext: &[u8]) -> Result<([u8; 12], Vec<u8>), CoreError> {
        let nonce = generate_nonce()?;
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CoreError::Encryption(format!("Encryption failed: {e}")))?;
        Ok((nonce, ciphertext))
    }

    pub fn open(&self, nonce: &[u8; 12], ciphertext: &[u8]) -> Result<Vec<u8>, CoreError> {
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::Decryption)
    }
}

/// Cryptographically secure random salt.
pub fn generate_salt() -> Result<[u8; 16], CoreError> {
    let mut salt = [0u8; 16];
    getrandom::getrandom(&mut salt)
        .map_err(|e| CoreError::Encryption(format!("Failed to generate random salt: {e}")))?;
    Ok(salt)
}

/// Cryptographically secure random nonce.
pub fn generate_nonce() -> Result<[u8; 12], CoreError> {
    let mut nonce = [0u8; 12];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| CoreError::Encryption(format!("Failed to generate random nonce: {e}")))?;
    Ok(nonce)
}
