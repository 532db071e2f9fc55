//! Lifecycle of an open vault.
//!
//! A `Session` owns the decrypted store and both keys while unlocked.
//! Every successful mutation re-seals the envelope immediately, so the
//! file on disk never lags behind an acknowledged change.  Locking drops
//! the in-memory store and zeroizes the keys.

use std::path::{Path, PathBuf};

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::cipher;
use crate::crypto::kdf::{derive_envelope_key, derive_field_key, DerivedKey};
use crate::errors::{Result, VaultError};
use crate::totp::{self, TotpCode};

use super::credential::{check_password_policy, CredentialStore, HashPolicy};
use super::format;
use super::models::{Category, EntryDraft, PasswordEntry};
use super::repository::VaultRepository;
use super::store::RelationalStore;

/// Create a new vault file at `path`, sealed under `password`.
///
/// The vault starts with the default categories and no credential; the
/// caller bootstraps the master-password hash after the first unlock.
pub fn create_vault(path: &Path, password: &str) -> Result<()> {
    if path.exists() {
        return Err(VaultError::VaultAlreadyExists(path.to_path_buf()));
    }
    check_password_policy(password)?;

    // 1. Build the empty store.
    let store = RelationalStore::create_empty()?;

    // 2. Seal it into the envelope.
    let key = derive_envelope_key(password);
    let bytes = store.serialize()?;
    format::write_envelope(path, &key, &bytes)?;

    // 3. The plaintext copy is no longer needed.
    store.close()?;

    tracing::info!(path = %path.display(), "vault created");
    Ok(())
}

/// Everything that only exists while the vault is unlocked.
struct Unlocked {
    store: RelationalStore,
    envelope_key: DerivedKey,
    field_key: DerivedKey,
    /// Set when a mutation succeeded in the store but sealing failed.
    dirty: bool,
}

/// An open vault file.
pub struct Session {
    path: PathBuf,
    credentials: CredentialStore,
    state: Option<Unlocked>,
}

impl Session {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Unlock the vault at `path` with the default hash policy.
    pub fn unlock(path: &Path, password: &str) -> Result<Self> {
        Self::unlock_with_policy(path, password, HashPolicy::default())
    }

    /// Unlock the vault at `path`.
    ///
    /// A wrong password and a tampered file are indistinguishable and
    /// both yield `WrongPasswordOrCorrupt`.
    pub fn unlock_with_policy(path: &Path, password: &str, policy: HashPolicy) -> Result<Self> {
        // 1. Open the envelope.
        let envelope_key = derive_envelope_key(password);
        let plaintext = format::read_envelope(path, &envelope_key)?;

        // 2. Materialize the store; the plaintext buffer is zeroized on drop.
        let store = RelationalStore::materialize(&plaintext)?;
        drop(plaintext);

        // 3. Field key for the secret columns.
        let field_key = derive_field_key(password);

        tracing::info!(path = %path.display(), "vault unlocked");
        Ok(Self {
            path: path.to_path_buf(),
            credentials: CredentialStore::new(policy),
            state: Some(Unlocked {
                store,
                envelope_key,
                field_key,
                dirty: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_none()
    }

    /// Whether a change is held in memory that did not reach the file.
    pub fn has_unsaved_changes(&self) -> bool {
        self.state.as_ref().is_some_and(|u| u.dirty)
    }

    fn unlocked(&self) -> Result<&Unlocked> {
        self.state.as_ref().ok_or(VaultError::Locked)
    }

    fn repo(&self) -> Result<VaultRepository<'_>> {
        let u = self.unlocked()?;
        Ok(VaultRepository::new(u.store.conn(), &u.field_key))
    }

    /// Write the current store to disk under the envelope key.
    fn seal(&mut self) -> Result<()> {
        let unlocked = self.state.as_mut().ok_or(VaultError::Locked)?;
        let bytes = unlocked.store.serialize()?;
        match format::write_envelope(&self.path, &unlocked.envelope_key, &bytes) {
            Ok(()) => {
                unlocked.dirty = false;
                Ok(())
            }
            Err(e) => {
                unlocked.dirty = true;
                tracing::warn!(path = %self.path.display(), error = %e, "sealing vault failed");
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Master-password credential
    // ------------------------------------------------------------------

    /// `false` until a master-password hash has been stored.
    pub fn has_credential(&self) -> Result<bool> {
        CredentialStore::has_credential(self.unlocked()?.store.conn())
    }

    /// Store the first master-password hash.
    ///
    /// `password` must be the password this vault was unlocked with.
    pub fn bootstrap_credential(&mut self, password: &str) -> Result<()> {
        let u = self.unlocked()?;
        if !key_matches(&u.field_key, password) {
            return Err(VaultError::PolicyViolation(
                "master password must match the vault password".into(),
            ));
        }
        self.credentials.bootstrap(u.store.conn(), password)?;
        self.seal()?;
        tracing::info!("master password hash stored");
        Ok(())
    }

    /// Verify `password` against the stored hash.
    ///
    /// On success a hash made with weaker parameters than the current
    /// policy is replaced and the vault re-sealed.
    pub fn verify_credential(&mut self, password: &str) -> Result<bool> {
        let conn = self.unlocked()?.store.conn();
        let Some(hash) = CredentialStore::stored_hash(conn)? else {
            return Ok(false);
        };
        if !CredentialStore::verify_hash(password, &hash)? {
            return Ok(false);
        }

        if self.credentials.needs_rehash(&hash)? {
            self.credentials.replace(conn, password)?;
            self.seal()?;
            tracing::info!("master password hash upgraded to current parameters");
        }
        Ok(true)
    }

    /// Re-key the vault to `new_password`.
    ///
    /// Every secret field is re-encrypted and the credential rehashed in
    /// one transaction, then the envelope is re-sealed under the new key.
    pub fn change_master_password(&mut self, old_password: &str, new_password: &str) -> Result<()> {
        check_password_policy(new_password)?;
        let u = self.unlocked()?;
        if !key_matches(&u.field_key, old_password) {
            return Err(VaultError::WrongPasswordOrCorrupt);
        }
        let conn = u.store.conn();
        if CredentialStore::has_credential(conn)? && !self.credentials.verify(conn, old_password)? {
            return Err(VaultError::WrongPasswordOrCorrupt);
        }

        // 1. Hash first; it is the slow step and touches nothing.
        let new_hash = self.credentials.hash_password(new_password)?;
        let new_field_key = derive_field_key(new_password);

        // 2. Re-encrypt and store the hash atomically.
        let tx = conn.unchecked_transaction()?;
        let count = VaultRepository::new(&tx, &u.field_key).reencrypt_all(&new_field_key)?;
        CredentialStore::store_hash(&tx, &new_hash)?;
        tx.commit()?;

        // 3. Swap keys and re-seal.
        let unlocked = self.state.as_mut().ok_or(VaultError::Locked)?;
        unlocked.field_key = new_field_key;
        unlocked.envelope_key = derive_envelope_key(new_password);
        self.seal()?;

        tracing::info!(entries = count, "master password changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Two-factor unlock
    // ------------------------------------------------------------------

    /// Attach a TOTP secret that must be confirmed on every unlock.
    pub fn enable_unlock_totp(&mut self, secret: &str) -> Result<()> {
        let normalized = totp::normalize_secret(secret)?;
        let u = self.unlocked()?;
        let sealed = cipher::seal_str(&u.field_key, &normalized)?;
        CredentialStore::set_unlock_totp(u.store.conn(), Some(&sealed))?;
        self.seal()?;
        tracing::info!("two-factor unlock enabled");
        Ok(())
    }

    pub fn disable_unlock_totp(&mut self) -> Result<()> {
        let conn = self.unlocked()?.store.conn();
        if CredentialStore::unlock_totp(conn)?.is_none() {
            return Ok(());
        }
        CredentialStore::set_unlock_totp(conn, None)?;
        self.seal()?;
        tracing::info!("two-factor unlock disabled");
        Ok(())
    }

    pub fn unlock_totp_enabled(&self) -> Result<bool> {
        Ok(CredentialStore::unlock_totp(self.unlocked()?.store.conn())?.is_some())
    }

    /// Decrypted unlock-TOTP secret, for showing an enrollment URI.
    pub fn unlock_totp_secret(&self) -> Result<Option<Zeroizing<String>>> {
        let u = self.unlocked()?;
        CredentialStore::unlock_totp(u.store.conn())?
            .map(|sealed| cipher::open_str(&u.field_key, &sealed))
            .transpose()
    }

    /// Check a code against the unlock factor.  `true` when none is set.
    pub fn verify_unlock_totp(&self, candidate: &str, now: u64) -> Result<bool> {
        match self.unlock_totp_secret()? {
            Some(secret) => totp::verify(&secret, candidate, now),
            None => Ok(true),
        }
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.repo()?.list_categories()
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        self.repo()?.get_category(id)
    }

    pub fn add_category(&mut self, name: &str, color: Option<&str>) -> Result<i64> {
        let id = self.repo()?.add_category(name, color)?;
        self.seal()?;
        tracing::debug!(category_id = id, "category added");
        Ok(id)
    }

    pub fn update_category(&mut self, id: i64, name: &str, color: &str) -> Result<()> {
        self.repo()?.update_category(id, name, color)?;
        self.seal()
    }

    /// Delete a category, detaching its entries.  Returns how many.
    pub fn delete_category(&mut self, id: i64) -> Result<usize> {
        let detached = self.repo()?.delete_category(id)?;
        self.seal()?;
        Ok(detached)
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    pub fn list_entries(&self) -> Result<Vec<PasswordEntry>> {
        self.repo()?.list_entries()
    }

    pub fn entries_by_category(&self, category_id: i64) -> Result<Vec<PasswordEntry>> {
        self.repo()?.entries_by_category(category_id)
    }

    pub fn search(&self, query: &str) -> Result<Vec<PasswordEntry>> {
        self.repo()?.search(query)
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<PasswordEntry>> {
        self.repo()?.get_entry(id)
    }

    pub fn add_entry(&mut self, draft: &EntryDraft) -> Result<i64> {
        let id = self.repo()?.add_entry(draft)?;
        self.seal()?;
        tracing::debug!(entry_id = id, "entry added");
        Ok(id)
    }

    pub fn update_entry(&mut self, id: i64, draft: &EntryDraft) -> Result<()> {
        self.repo()?.update_entry(id, draft)?;
        self.seal()
    }

    pub fn delete_entry(&mut self, id: i64) -> Result<()> {
        self.repo()?.delete_entry(id)?;
        self.seal()
    }

    /// Decrypt one secret column value.  The caller drops it promptly.
    pub fn decrypt_field(&self, sealed: &[u8]) -> Result<Zeroizing<String>> {
        self.repo()?.decrypt_field(sealed)
    }

    /// Current code for an entry's TOTP secret, if it has one.
    pub fn entry_totp(&self, id: i64, now: u64) -> Result<Option<TotpCode>> {
        let entry = self.get_entry(id)?.ok_or(VaultError::EntryNotFound(id))?;
        let Some(sealed) = entry.secret_totp else {
            return Ok(None);
        };
        let secret = self.decrypt_field(&sealed)?;
        totp::code(&secret, now).map(Some)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Seal the current store to disk.  Also retries a failed auto-seal.
    pub fn save(&mut self) -> Result<()> {
        self.seal()?;
        tracing::debug!(path = %self.path.display(), "vault saved");
        Ok(())
    }

    /// Drop the plaintext store and zeroize the keys.  Idempotent.
    pub fn lock(&mut self) -> Result<()> {
        let Some(unlocked) = self.state.take() else {
            return Ok(());
        };
        if unlocked.dirty {
            tracing::warn!(path = %self.path.display(), "locking with unsaved changes");
        }
        let Unlocked { store, .. } = unlocked;
        store.close()?;
        tracing::info!(path = %self.path.display(), "vault locked");
        Ok(())
    }

    /// Lock and consume the session.
    pub fn close(mut self) -> Result<()> {
        self.lock()
    }
}

/// Constant-time check that `password` derives the session's field key.
fn key_matches(field_key: &DerivedKey, password: &str) -> bool {
    let candidate = derive_field_key(password);
    candidate.as_bytes().ct_eq(field_key.as_bytes()).into()
}
