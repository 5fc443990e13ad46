//! Binary layouts of the encrypted file mirror.
//!
//! Two file types live in an encrypted mirror directory:
//!
//! ```text
//! key file (mirror.key):
//! [FLMK: 4B] [version: 2B LE] [memory_cost: 4B LE] [time_cost: 4B LE]
//! [parallelism: 4B LE] [salt: 16B]
//!
//! entry file (<key>.flm):
//! [FLMR: 4B] [version: 2B LE] [nonce: 12B] [ciphertext_len: 8B LE]
//! [ciphertext: variable]
//! ```

use crate::errors::CoreError;

use super::encryption::KdfParams;

pub const KEY_MAGIC: &[u8; 4] = b"FLMK";
pub const ENTRY_MAGIC: &[u8; 4] = b"FLMR";

/// Current layout version of both file types.
pub const CURRENT_VERSION: u16 = 1;

/// magic(4) + version(2) + kdf_params(12) + salt(16)
pub const KEY_FILE_SIZE: usize = 34;

/// magic(4) + version(2) + nonce(12) + ciphertext_len(8)
pub const ENTRY_HEADER_SIZE: usize = 26;

/// Parsed key file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFile {
    pub kdf_params: KdfParams,
    pub salt: [u8; 16],
}

pub fn write_key_file(kdf_params: &KdfParams, salt: &[u8; 16]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(KEY_FILE_SIZE);
    buf.extend_from_slice(KEY_MAGIC);
    buf.extend_from_slice(&CURRENT_VERSION.to_le_bytes());
    buf.extend_from_slice(&kdf_params.memory_cost.to_le_bytes());
    buf.extend_from_slice(&kdf_params.time_cost.to_le_bytes());
    buf.extend_from_slice(&kdf_params.parallelism.to_le_bytes());
    buf.extend_from_slice(salt);
    buf
}

pub fn read_key_file(data: &[u8]) -> Result<KeyFile, CoreError> {
    if data.len() < KEY_FILE_SIZE {
        return Err(CoreError::InvalidFileFormat(
            "Mirror key file too small".into(),
        ));
    }
    if &data[0..4] != KEY_MAGIC {
        return Err(CoreError::InvalidFileFormat(
            "Invalid magic bytes — not a mirror key file".into(),
        ));
    }
    check_version(read_u16(data, 4))?;

    let memory_cost = read_u32(data, 6);
    let time_cost = read_u32(data, 10);
    let parallelism = read_u32(data, 14);

    // A crafted key file must not be able to make key derivation eat the machine.
    if !(8..=1_048_576).contains(&memory_cost) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF memory_cost out of safe range: {memory_cost} KiB (expected 8..1048576)"
        )));
    }
    if !(1..=20).contains(&time_cost) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF time_cost out of safe range: {time_cost} (expected 1..20)"
        )));
    }
    if !(1..=16).contains(&parallelism) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF parallelism out of safe range: {parallelism} (expected 1..16)"
        )));
    }

    let mut salt = [0u8; 16];
    salt.copy_from_slice(&data[18..34]);

    Ok(KeyFile {
        kdf_params: KdfParams {
            memory_cost,
            time_cost,
            parallelism,
        },
        salt,
    })
}

pub fn write_entry(nonce: &[u8; 12], ciphertext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ENTRY_HEADER_SIZE + ciphertext.len());
    buf.extend_from_slice(ENTRY_MAGIC);
    buf.extend_from_slice(&CURRENT_VERSION.to_le_bytes());
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
    buf.extend_from_slice(ciphertext);
    buf
}

/// Parse an entry file; returns the nonce and the ciphertext slice.
pub fn read_entry(data: &[u8]) -> Result<([u8; 12], &[u8]), CoreError> {
    if data.len() < ENTRY_HEADER_SIZE {
        return Err(CoreError::InvalidFileFormat(
            "Mirror entry too small".into(),
        ));
    }
    if &data[0..4] != ENTRY_MAGIC {
        return Err(CoreError::InvalidFileFormat(
            "Invalid magic bytes — not a mirror entry".into(),
        ));
    }
    check_version(read_u16(data, 4))?;

    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&data[6..18]);

    let len = u64::from_le_bytes(copy_array(data, 18));
    let start = ENTRY_HEADER_SIZE;
    let available = (data.len() - start) as u64;
    if len > available {
        return Err(CoreError::InvalidFileFormat(format!(
            "Mirror entry truncated: expected {len} bytes of ciphertext, got {available}"
        )));
    }

    Ok((nonce, &data[start..start + len as usize]))
}

fn check_version(version: u16) -> Result<(), CoreError> {
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }
    Ok(())
}

// Callers check lengths first, so these slices are always in bounds.
fn copy_array<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[offset..offset + N]);
    out
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(copy_array(data, offset))
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(copy_array(data, offset))
}
