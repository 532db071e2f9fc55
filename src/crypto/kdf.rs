//! Master-password key derivation.
//!
//! The key is a single SHA-256 digest of the UTF-8 password: no salt and
//! no iteration count.  This keeps existing vaults readable but is weak
//! against offline guessing.  Any hardening (a persisted per-vault salt
//! plus an iterated KDF) belongs here and nowhere else.
//!
//! Two logical keyspaces come out of the same password: the envelope key
//! that seals the whole store, and the field key used for individual
//! secret columns.  Today both are the same digest.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// A 32-byte symmetric key that wipes its memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derive a key from a password.  Deterministic and infallible.
pub fn derive_key(password: &str) -> DerivedKey {
    let mut digest: [u8; KEY_LEN] = Sha256::digest(password.as_bytes()).into();
    let key = DerivedKey::new(digest);
    digest.zeroize();
    key
}

/// Key used to seal the whole relational store into the vault file.
pub fn derive_envelope_key(password: &str) -> DerivedKey {
    derive_key(password)
}

/// Key used by the field cipher for secret columns.
pub fn derive_field_key(password: &str) -> DerivedKey {
    derive_key(password)
}
