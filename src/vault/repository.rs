//! CRUD for categories and password entries.
//!
//! `VaultRepository` borrows the unlocked store's connection and the
//! session's field key.  Secret fields are sealed on the way in and only
//! opened on explicit request; listing and searching never decrypt.
//! Sealing the envelope after a mutation is the session's job.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use zeroize::Zeroizing;

use super::models::{Category, EntryDraft, PasswordEntry, DEFAULT_CATEGORY_COLOR};
use crate::crypto::cipher;
use crate::crypto::kdf::DerivedKey;
use crate::errors::{Result, VaultError};

const ENTRY_COLUMNS: &str = "id, category_id, name, username, secret_password, secret_notes, \
     website_url, secret_totp, created_at, updated_at";

/// Format a timestamp for storage.  Fixed width, so text order is time order.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    let color: Option<String> = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        color: color.unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
    })
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<PasswordEntry> {
    Ok(PasswordEntry {
        id: row.get(0)?,
        category_id: row.get(1)?,
        name: row.get(2)?,
        username: row.get(3)?,
        secret_password: row.get(4)?,
        secret_notes: row.get(5)?,
        website_url: row.get(6)?,
        secret_totp: row.get(7)?,
        created_at: parse_timestamp(row, 8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}

/// Repository over one unlocked store.
pub struct VaultRepository<'a> {
    conn: &'a Connection,
    key: &'a DerivedKey,
}

impl<'a> VaultRepository<'a> {
    pub fn new(conn: &'a Connection, key: &'a DerivedKey) -> Self {
        Self { conn, key }
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// All categories, sorted by name.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], row_to_category)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, color FROM categories WHERE id = ?1",
                [id],
                row_to_category,
            )
            .optional()?)
    }

    /// Insert a category and return its id.  `None` color means gray.
    pub fn add_category(&self, name: &str, color: Option<&str>) -> Result<i64> {
        let name = validate_name(name, "category")?;
        let color = validate_color(color.unwrap_or(DEFAULT_CATEGORY_COLOR))?;

        self.conn
            .execute(
                "INSERT INTO categories (name, color, created_at) VALUES (?1, ?2, ?3)",
                params![name, color, timestamp(Utc::now())],
            )
            .map_err(|e| map_unique(e, name))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_category(&self, id: i64, name: &str, color: &str) -> Result<()> {
        let name = validate_name(name, "category")?;
        let color = validate_color(color)?;

        let changed = self
            .conn
            .execute(
                "UPDATE categories SET name = ?1, color = ?2 WHERE id = ?3",
                params![name, color, id],
            )
            .map_err(|e| map_unique(e, name))?;
        if changed == 0 {
            return Err(VaultError::CategoryNotFound(id));
        }
        Ok(())
    }

    /// Delete a category.  Entries that referenced it become
    /// uncategorized; none are deleted.  Returns how many were detached.
    pub fn delete_category(&self, id: i64) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let now = timestamp(Utc::now());
        let detached = tx.execute(
            "UPDATE password_entries
             SET category_id = NULL, updated_at = MAX(updated_at, ?2)
             WHERE category_id = ?1",
            params![id, now],
        )?;
        let removed = tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
        tx.commit()?;

        if removed == 0 {
            tracing::debug!(category_id = id, "delete of unknown category ignored");
        }
        Ok(detached)
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    /// All entries, most recently updated first.
    pub fn list_entries(&self) -> Result<Vec<PasswordEntry>> {
        self.query_entries("", [])
    }

    pub fn entries_by_category(&self, category_id: i64) -> Result<Vec<PasswordEntry>> {
        self.query_entries("WHERE category_id = ?1", [category_id])
    }

    /// Case-insensitive substring match over `name`, `username` and
    /// `website_url`.  Encrypted columns are not searched.
    pub fn search(&self, query: &str) -> Result<Vec<PasswordEntry>> {
        let needle = query.to_lowercase();
        let entries = self.list_entries()?;
        if needle.is_empty() {
            return Ok(entries);
        }

        let hit = |field: Option<&str>| {
            field.is_some_and(|value| value.to_lowercase().contains(&needle))
        };
        Ok(entries
            .into_iter()
            .filter(|e| {
                hit(Some(e.name.as_str()))
                    || hit(e.username.as_deref())
                    || hit(e.website_url.as_deref())
            })
            .collect())
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<PasswordEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM password_entries WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], row_to_entry).optional()?)
    }

    /// Encrypt the draft's secrets and insert it.  Returns the new id.
    pub fn add_entry(&self, draft: &EntryDraft) -> Result<i64> {
        let name = validate_name(&draft.name, "entry")?;
        self.check_category(draft.category_id)?;
        let sealed = self.seal_draft(draft)?;
        let now = timestamp(Utc::now());

        self.conn.execute(
            "INSERT INTO password_entries
             (category_id, name, username, secret_password, secret_notes,
              website_url, secret_totp, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                draft.category_id,
                name,
                non_empty(draft.username.as_deref()),
                sealed.password,
                sealed.notes,
                non_empty(draft.website_url.as_deref()),
                sealed.totp,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Replace every field of an existing entry.  `created_at` is kept;
    /// `updated_at` never moves backwards even if the clock does.
    pub fn update_entry(&self, id: i64, draft: &EntryDraft) -> Result<()> {
        let name = validate_name(&draft.name, "entry")?;
        let existing = self.get_entry(id)?.ok_or(VaultError::EntryNotFound(id))?;
        self.check_category(draft.category_id)?;
        let sealed = self.seal_draft(draft)?;
        let updated_at = Utc::now().max(existing.updated_at);

        self.conn.execute(
            "UPDATE password_entries
             SET category_id = ?1, name = ?2, username = ?3, secret_password = ?4,
                 secret_notes = ?5, website_url = ?6, secret_totp = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                draft.category_id,
                name,
                non_empty(draft.username.as_deref()),
                sealed.password,
                sealed.notes,
                non_empty(draft.website_url.as_deref()),
                sealed.totp,
                timestamp(updated_at),
                id,
            ],
        )?;
        Ok(())
    }

    /// Delete an entry.  Deleting an unknown id is not an error.
    pub fn delete_entry(&self, id: i64) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM password_entries WHERE id = ?1", [id])?;
        if removed == 0 {
            tracing::debug!(entry_id = id, "delete of unknown entry ignored");
        }
        Ok(())
    }

    /// Decrypt one secret column value with the field key.
    pub fn decrypt_field(&self, sealed: &[u8]) -> Result<Zeroizing<String>> {
        cipher::open_str(self.key, sealed)
    }

    /// Re-encrypt every secret column and the unlock-TOTP secret under
    /// `new_key`.  Returns the number of entries.
    ///
    /// Runs no transaction of its own; callers that must not leave the
    /// store half re-keyed wrap it in one.
    pub fn reencrypt_all(&self, new_key: &DerivedKey) -> Result<usize> {
        let rows: Vec<(i64, Vec<u8>, Option<Vec<u8>>, Option<Vec<u8>>)> = {
            let mut stmt = self.conn.prepare(
                "SELECT id, secret_password, secret_notes, secret_totp FROM password_entries",
            )?;
            let mapped = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?;
            mapped.collect::<rusqlite::Result<_>>()?
        };

        for (id, password, notes, totp) in &rows {
            let password = self.rekey(password, new_key)?;
            let notes = notes.as_deref().map(|n| self.rekey(n, new_key)).transpose()?;
            let totp = totp.as_deref().map(|t| self.rekey(t, new_key)).transpose()?;
            self.conn.execute(
                "UPDATE password_entries
                 SET secret_password = ?1, secret_notes = ?2, secret_totp = ?3
                 WHERE id = ?4",
                params![password, notes, totp, id],
            )?;
        }

        let unlock_totp: Option<Option<Vec<u8>>> = self
            .conn
            .query_row("SELECT totp_secret FROM credential WHERE id = 1", [], |r| r.get(0))
            .optional()?;
        if let Some(Some(sealed)) = unlock_totp {
            let resealed = self.rekey(&sealed, new_key)?;
            self.conn.execute(
                "UPDATE credential SET totp_secret = ?1 WHERE id = 1",
                [resealed],
            )?;
        }

        Ok(rows.len())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn query_entries<P: rusqlite::Params>(
        &self,
        filter: &str,
        params: P,
    ) -> Result<Vec<PasswordEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM password_entries {filter} ORDER BY updated_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, row_to_entry)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn check_category(&self, category_id: Option<i64>) -> Result<()> {
        match category_id {
            Some(id) if self.get_category(id)?.is_none() => Err(VaultError::CategoryNotFound(id)),
            _ => Ok(()),
        }
    }

    fn seal_draft(&self, draft: &EntryDraft) -> Result<SealedFields> {
        let seal_opt = |value: Option<&str>| -> Result<Option<Vec<u8>>> {
            non_empty(value).map(|v| cipher::seal_str(self.key, v)).transpose()
        };

        let totp = match non_empty(draft.totp_secret.as_deref()) {
            Some(secret) => {
                let normalized = crate::totp::normalize_secret(secret)?;
                Some(cipher::seal_str(self.key, &normalized)?)
            }
            None => None,
        };

        Ok(SealedFields {
            password: cipher::seal_str(self.key, &draft.password)?,
            notes: seal_opt(draft.notes.as_deref())?,
            totp,
        })
    }

    fn rekey(&self, sealed: &[u8], new_key: &DerivedKey) -> Result<Vec<u8>> {
        let plain = cipher::open(self.key, sealed)?;
        cipher::seal(new_key, &plain)
    }
}

struct SealedFields {
    password: Vec<u8>,
    notes: Option<Vec<u8>>,
    totp: Option<Vec<u8>>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_name<'s>(name: &'s str, what: &str) -> Result<&'s str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(VaultError::InvalidInput(format!("{what} name cannot be empty")));
    }
    Ok(trimmed)
}

/// Accept `#rgb` or `#rrggbb`, returned lowercase.
fn validate_color(color: &str) -> Result<String> {
    let hex = color.trim().strip_prefix('#').unwrap_or("");
    if (hex.len() == 3 || hex.len() == 6) && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(format!("#{}", hex.to_ascii_lowercase()))
    } else {
        Err(VaultError::InvalidInput(format!(
            "color '{color}' is not a hex color like #10b981"
        )))
    }
}

fn map_unique(err: rusqlite::Error, name: &str) -> VaultError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            VaultError::CategoryExists(name.to_string())
        }
        other => VaultError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::derive_key;
    use crate::vault::store::RelationalStore;

    fn fixture() -> (RelationalStore, DerivedKey) {
        (RelationalStore::create_empty().unwrap(), derive_key("repo-test"))
    }

    #[test]
    fn categories_sorted_by_name() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        repo.add_category("Aardvark", None).unwrap();

        let names: Vec<_> = repo.list_categories().unwrap().into_iter().map(|c| c.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "Aardvark");
    }

    #[test]
    fn add_category_defaults_to_gray() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        let id = repo.add_category("Work", None).unwrap();
        assert_eq!(repo.get_category(id).unwrap().unwrap().color, "#808080");
    }

    #[test]
    fn duplicate_category_name_rejected() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        repo.add_category("Work", Some("#123456")).unwrap();
        assert!(matches!(
            repo.add_category("Work", None),
            Err(VaultError::CategoryExists(_))
        ));
    }

    #[test]
    fn bad_color_rejected() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        assert!(matches!(
            repo.add_category("Work", Some("blue")),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(repo.add_category("Work", Some("#ABC")).is_ok());
    }

    #[test]
    fn update_missing_category_is_not_found() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        assert!(matches!(
            repo.update_category(9999, "X", "#000000"),
            Err(VaultError::CategoryNotFound(9999))
        ));
    }

    #[test]
    fn secrets_are_ciphertext_at_rest() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        let id = repo
            .add_entry(&EntryDraft::new("Mail", "hunter2-secret").with_notes("pin 1234"))
            .unwrap();

        let entry = repo.get_entry(id).unwrap().unwrap();
        assert!(!entry
            .secret_password
            .windows(b"hunter2-secret".len())
            .any(|w| w == b"hunter2-secret"));
        assert_eq!(&*repo.decrypt_field(&entry.secret_password).unwrap(), "hunter2-secret");
        assert_eq!(
            &*repo.decrypt_field(entry.secret_notes.as_ref().unwrap()).unwrap(),
            "pin 1234"
        );
    }

    #[test]
    fn empty_optional_fields_stored_as_null() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        let id = repo
            .add_entry(&EntryDraft::new("Bare", "pw").with_username("  ").with_notes(""))
            .unwrap();
        let entry = repo.get_entry(id).unwrap().unwrap();
        assert!(entry.username.is_none());
        assert!(entry.secret_notes.is_none());
        assert!(entry.secret_totp.is_none());
    }

    #[test]
    fn add_entry_with_unknown_category_fails() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        assert!(matches!(
            repo.add_entry(&EntryDraft::new("X", "pw").with_category(4242)),
            Err(VaultError::CategoryNotFound(4242))
        ));
    }

    #[test]
    fn update_keeps_created_at_and_advances_updated_at() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        let id = repo.add_entry(&EntryDraft::new("Site", "one")).unwrap();
        let before = repo.get_entry(id).unwrap().unwrap();

        repo.update_entry(id, &EntryDraft::new("Site", "two")).unwrap();
        let after = repo.get_entry(id).unwrap().unwrap();

        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(&*repo.decrypt_field(&after.secret_password).unwrap(), "two");
    }

    #[test]
    fn update_missing_entry_is_not_found() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        assert!(matches!(
            repo.update_entry(77, &EntryDraft::new("X", "pw")),
            Err(VaultError::EntryNotFound(77))
        ));
    }

    #[test]
    fn delete_category_detaches_entries() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        let cat = repo.add_category("Temp", None).unwrap();
        let a = repo.add_entry(&EntryDraft::new("A", "pw").with_category(cat)).unwrap();
        let b = repo.add_entry(&EntryDraft::new("B", "pw").with_category(cat)).unwrap();

        assert_eq!(repo.delete_category(cat).unwrap(), 2);
        assert!(repo.get_category(cat).unwrap().is_none());
        for id in [a, b] {
            assert_eq!(repo.get_entry(id).unwrap().unwrap().category_id, None);
        }
        assert_eq!(repo.list_entries().unwrap().len(), 2);
    }

    #[test]
    fn delete_unknown_entry_is_ok() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        assert!(repo.delete_entry(12345).is_ok());
    }

    #[test]
    fn search_is_case_insensitive_over_plain_columns() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        repo.add_entry(&EntryDraft::new("GitHub", "pw").with_username("octo")).unwrap();
        repo.add_entry(&EntryDraft::new("Bank", "pw").with_website("https://MyBank.example"))
            .unwrap();
        repo.add_entry(&EntryDraft::new("Other", "github-in-password")).unwrap();

        assert_eq!(repo.search("github").unwrap().len(), 1);
        assert_eq!(repo.search("OCTO").unwrap().len(), 1);
        assert_eq!(repo.search("mybank").unwrap().len(), 1);
        assert_eq!(repo.search("").unwrap().len(), 3);
    }

    #[test]
    fn search_matches_surrounding_spaces_literally() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        repo.add_entry(&EntryDraft::new("My Bank", "pw")).unwrap();
        repo.add_entry(&EntryDraft::new("Bank", "pw")).unwrap();

        let found = repo.search(" bank").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "My Bank");
        assert!(repo.search("bank ").unwrap().is_empty());
    }

    #[test]
    fn entries_by_category_filters() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        let cat = repo.add_category("Work", None).unwrap();
        repo.add_entry(&EntryDraft::new("In", "pw").with_category(cat)).unwrap();
        repo.add_entry(&EntryDraft::new("Out", "pw")).unwrap();

        let found = repo.entries_by_category(cat).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "In");
    }

    #[test]
    fn reencrypt_all_switches_keys() {
        let (store, key) = fixture();
        let repo = VaultRepository::new(store.conn(), &key);
        let id = repo
            .add_entry(&EntryDraft::new("E", "old-secret").with_notes("n"))
            .unwrap();

        let new_key = derive_key("another password");
        assert_eq!(repo.reencrypt_all(&new_key).unwrap(), 1);

        let entry = repo.get_entry(id).unwrap().unwrap();
        assert!(repo.decrypt_field(&entry.secret_password).is_err());
        let rekeyed = VaultRepository::new(store.conn(), &new_key);
        assert_eq!(&*rekeyed.decrypt_field(&entry.secret_password).unwrap(), "old-secret");
    }
}
