use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in SecurePass.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Envelope / crypto errors ---
    #[error("Invalid vault format: {0}")]
    InvalidFormat(String),

    /// Authentication failed while opening the envelope or a field.
    ///
    /// A wrong key and a tampered ciphertext look identical to the AEAD,
    /// so both causes are reported as one.
    #[error("Wrong master password or corrupted vault data")]
    WrongPasswordOrCorrupt,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // --- Credential errors ---
    #[error("Invalid credential record: {0}")]
    InvalidCredentialRecord(String),

    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    // --- Vault file errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Vault is locked")]
    Locked,

    // --- Record errors ---
    #[error("Category {0} not found")]
    CategoryNotFound(i64),

    #[error("Category '{0}' already exists")]
    CategoryExists(String),

    #[error("Entry {0} not found")]
    EntryNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- TOTP errors ---
    #[error("TOTP secret is not valid base32")]
    InvalidTotpSecret,

    // --- Store errors ---
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for SecurePass results.
pub type Result<T> = std::result::Result<T, VaultError>;
