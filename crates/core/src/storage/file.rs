use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::errors::CoreError;

use super::encryption::{self, KdfParams, MirrorCipher};
use super::format;
use super::traits::{LocalMirror, MirrorKey};

const KEY_FILE_NAME: &str = "mirror.key";

/// Mirror persisted as one file per key inside a directory.
///
/// Plain mirrors store the JSON document as-is (`<key>.json`). Encrypted
/// mirrors derive an AES-256-GCM key once from a passphrase and the salt in
/// `mirror.key`, and store each document as a sealed entry (`<key>.flm`).
///
/// Writes go through a temporary file and a rename so a crash never leaves a
/// half-written document behind.
pub struct FileMirror {
    dir: PathBuf,
    cipher: Option<MirrorCipher>,
}

impl std::fmt::Debug for FileMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMirror")
            .field("dir", &self.dir)
            .field("encrypted", &self.cipher.is_some())
            .finish()
    }
}

impl FileMirror {
    /// Open (creating if needed) a plain JSON mirror directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, cipher: None })
    }

    /// Open (creating if needed) an encrypted mirror directory with default
    /// key-derivation cost.
    pub fn encrypted(dir: impl AsRef<Path>, passphrase: &str) -> Result<Self, CoreError> {
        Self::encrypted_with_params(dir, passphrase, KdfParams::default())
    }

    /// Open an encrypted mirror. `params` only apply when the directory is new;
    /// an existing `mirror.key` keeps the parameters it was created with.
    pub fn encrypted_with_params(
        dir: impl AsRef<Path>,
        passphrase: &str,
        params: KdfParams,
    ) -> Result<Self, CoreError> {
        if passphrase.is_empty() {
            return Err(CoreError::ValidationError(
                "Mirror passphrase must not be empty".into(),
            ));
        }

        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let key_path = dir.join(KEY_FILE_NAME);
        let key_file = if key_path.exists() {
            format::read_key_file(&std::fs::read(&key_path)?)?
        } else {
            let salt = encryption::generate_salt()?;
            write_atomic(&key_path, &format::write_key_file(&params, &salt))?;
            info!("Created encrypted mirror key file in {}", dir.display());
            format::KeyFile {
                kdf_params: params,
                salt,
            }
        };

        let cipher = MirrorCipher::from_passphrase(passphrase, &key_file.salt, &key_file.kdf_params)?;
        Ok(Self {
            dir,
            cipher: Some(cipher),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    fn path_for(&self, key: &MirrorKey) -> PathBuf {
        let ext = if self.cipher.is_some() { "flm" } else { "json" };
        self.dir.join(format!("{}.{ext}", key.file_name()))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

impl LocalMirror for FileMirror {
    fn read(&self, key: &MirrorKey) -> Result<Option<String>, CoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;

        let plaintext = match &self.cipher {
            Some(cipher) => {
                let (nonce, ciphertext) = format::read_entry(&bytes)?;
                cipher.open(&nonce, ciphertext)?
            }
            None => bytes,
        };

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|e| CoreError::Deserialization(format!("Mirror entry is not UTF-8: {e}")))
    }

    fn write(&self, key: &MirrorKey, json: &str) -> Result<(), CoreError> {
        let path = self.path_for(key);
        let bytes = match &self.cipher {
            Some(cipher) => {
                let (nonce, ciphertext) = cipher.seal(json.as_bytes())?;
                format::write_entry(&nonce, &ciphertext)
            }
            None => json.as_bytes().to_vec(),
        };
        write_atomic(&path, &bytes)?;
        debug!("Mirror wrote {} ({} bytes)", key.storage_key(), bytes.len());
        Ok(())
    }

    fn remove(&self, key: &MirrorKey) -> Result<(), CoreError> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
