//! Category and password-entry records stored inside a vault.
//!
//! Secret columns (`secret_password`, `secret_notes`, `secret_totp`) hold
//! field-cipher output (nonce + ciphertext) and are never plaintext at
//! rest.  Use `Session::decrypt_field` to read one transiently.

use chrono::{DateTime, Utc};

/// Color given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#808080";

/// Categories inserted into every new vault.
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("General", "#6366f1"),
    ("Finance", "#10b981"),
    ("Social Media", "#8b5cf6"),
    ("Email", "#f59e0b"),
];

/// A user-defined grouping for entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Hex color such as `#10b981`.
    pub color: String,
}

/// A stored credential record.  Secret fields are ciphertext.
#[derive(Debug, Clone)]
pub struct PasswordEntry {
    pub id: i64,
    /// `None` when the entry is uncategorized or its category was deleted.
    pub category_id: Option<i64>,
    pub name: String,
    pub username: Option<String>,
    pub secret_password: Vec<u8>,
    pub secret_notes: Option<Vec<u8>>,
    pub website_url: Option<String>,
    pub secret_totp: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PasswordEntry {
    /// Whether a TOTP secret is attached to this entry.
    pub fn has_totp(&self) -> bool {
        self.secret_totp.is_some()
    }
}

/// Plaintext input for creating or replacing an entry.
///
/// The repository encrypts `password`, `notes` and `totp_secret` before
/// anything touches the store.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub category_id: Option<i64>,
    pub name: String,
    pub username: Option<String>,
    pub password: String,
    pub notes: Option<String>,
    pub website_url: Option<String>,
    pub totp_secret: Option<String>,
}

impl EntryDraft {
    /// Start a draft with the two required fields.
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            category_id: None,
            name: name.into(),
            username: None,
            password: password.into(),
            notes: None,
            website_url: None,
            totp_secret: None,
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_website(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    pub fn with_totp(mut self, secret: impl Into<String>) -> Self {
        self.totp_secret = Some(secret.into());
        self
    }
}

impl Drop for EntryDraft {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.password.zeroize();
        self.notes.zeroize();
        self.totp_secret.zeroize();
    }
}
