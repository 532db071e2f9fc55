//! The decrypted relational store behind an unlocked vault.
//!
//! While a vault is unlocked its SQLite database lives only in process
//! memory.  It is loaded from and written back to the sealed envelope as
//! one serialized image, so no plaintext database file ever touches the
//! disk, even when the process is killed.

use chrono::Utc;
use rusqlite::{Connection, DatabaseName};
use zeroize::Zeroizing;

use super::models::DEFAULT_CATEGORIES;
use super::repository::timestamp;
use crate::errors::{Result, VaultError};

/// Schema version stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
CREATE TABLE credential (
    id            INTEGER PRIMARY KEY CHECK (id = 1),
    password_hash TEXT NOT NULL,
    totp_secret   BLOB,
    created_at    TEXT NOT NULL
);

CREATE TABLE categories (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL UNIQUE,
    color      TEXT NOT NULL DEFAULT '#808080',
    created_at TEXT NOT NULL
);

CREATE TABLE password_entries (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id     INTEGER REFERENCES categories (id) ON DELETE SET NULL,
    name            TEXT NOT NULL,
    username        TEXT,
    secret_password BLOB NOT NULL,
    secret_notes    BLOB,
    website_url     TEXT,
    secret_totp     BLOB,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX idx_entries_category ON password_entries (category_id);
";

/// Handle to the in-memory plaintext store of an unlocked vault.
pub struct RelationalStore {
    conn: Connection,
}

impl RelationalStore {
    /// Build a fresh store with the schema and the default categories.
    pub fn create_empty() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;

        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        let now = timestamp(Utc::now());
        for (name, color) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, color, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, color, now],
            )?;
        }

        tracing::debug!("created empty relational store");
        Ok(Self { conn })
    }

    /// Load decrypted store bytes into a fresh in-memory database.
    ///
    /// Bytes that are not a SQLite database of the expected schema
    /// version are reported as `InvalidFormat`.
    pub fn materialize(plaintext: &[u8]) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.deserialize_read_exact(DatabaseName::Main, plaintext, plaintext.len(), false)
            .map_err(|e| VaultError::InvalidFormat(format!("store is not a database: {e}")))?;

        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|e| VaultError::InvalidFormat(format!("store is not a database: {e}")))?;
        if version != SCHEMA_VERSION {
            return Err(VaultError::InvalidFormat(format!(
                "unsupported store schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }
        configure(&conn)?;

        tracing::debug!(bytes = plaintext.len(), "materialized relational store");
        Ok(Self { conn })
    }

    /// Snapshot the database as one byte buffer.
    ///
    /// Refuses while a transaction is open, since the image would then
    /// carry uncommitted pages.
    pub fn serialize(&self) -> Result<Zeroizing<Vec<u8>>> {
        if !self.conn.is_autocommit() {
            return Err(VaultError::InvalidInput(
                "cannot serialize store with an open transaction".into(),
            ));
        }
        let image = self.conn.serialize(DatabaseName::Main)?;
        Ok(Zeroizing::new(image.to_vec()))
    }

    /// The live connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, reporting a failure instead of ignoring it
    /// as `Drop` would.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_conn, e)| {
            tracing::warn!(error = %e, "closing relational store connection failed");
            VaultError::Database(e)
        })
    }
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    // Deleted secrets must not survive in free pages of the sealed blob.
    conn.pragma_update(None, "secure_delete", true)?;
    Ok(())
}
