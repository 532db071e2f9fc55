//! AES-256-GCM authenticated encryption for individual payloads.
//!
//! Each call to `seal` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `open` splits the nonce back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use super::kdf::DerivedKey;
use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `seal`.
///
/// Fails with `WrongPasswordOrCorrupt` when the key is wrong, the data
/// was modified, or the buffer is too short to hold a nonce and tag.
pub fn open(key: &DerivedKey, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::WrongPasswordOrCorrupt);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| VaultError::WrongPasswordOrCorrupt)?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::WrongPasswordOrCorrupt)?;

    Ok(Zeroizing::new(plaintext))
}

/// Encrypt a UTF-8 string field.
pub fn seal_str(key: &DerivedKey, plaintext: &str) -> Result<Vec<u8>> {
    seal(key, plaintext.as_bytes())
}

/// Decrypt a field back into a string that is wiped on drop.
///
/// Invalid UTF-8 is treated as corruption; the bad bytes are wiped
/// before the error is returned.
pub fn open_str(key: &DerivedKey, sealed: &[u8]) -> Result<Zeroizing<String>> {
    let mut bytes = open(key, sealed)?;
    let owned = std::mem::take(&mut *bytes);
    String::from_utf8(owned).map(Zeroizing::new).map_err(|e| {
        let _wiped = Zeroizing::new(e.into_bytes());
        VaultError::WrongPasswordOrCorrupt
    })
}
