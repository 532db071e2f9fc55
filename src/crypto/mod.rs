//! Cryptographic primitives for SecurePass.
//!
//! This module provides:
//! - Password-to-key derivation (`kdf`)
//! - AES-256-GCM field encryption and decryption (`cipher`)

pub mod cipher;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_key, ...};
pub use cipher::{open, open_str, seal, seal_str};
pub use kdf::{derive_envelope_key, derive_field_key, derive_key, DerivedKey, KEY_LEN};
