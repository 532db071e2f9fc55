//! Vault module: the encrypted vault file and everything inside it.
//!
//! - Envelope file format (`format`)
//! - Decrypted relational store, held in memory (`store`)
//! - Category and entry records (`models`)
//! - CRUD over the store (`repository`)
//! - Argon2id master-password credential (`credential`)
//! - Unlock / lock / save lifecycle (`session`)

pub mod credential;
pub mod format;
pub mod models;
pub mod repository;
pub mod session;
pub mod store;

// Re-export the most commonly used items.
pub use credential::{CredentialStore, HashPolicy, MIN_PASSWORD_LEN};
pub use models::{Category, EntryDraft, PasswordEntry};
pub use repository::VaultRepository;
pub use session::{create_vault, Session};
