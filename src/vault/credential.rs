//! Master-password hashing with Argon2id.
//!
//! The hash is a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
//! kept in the single-row `credential` table of the decrypted store.  A
//! missing row is the first-use state, not an error.  The same row holds
//! the optional sealed secret of the vault-unlock second factor.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::Utc;
use rand::RngCore;
use rusqlite::{Connection, OptionalExtension};

use super::repository::timestamp;
use crate::errors::{Result, VaultError};

/// Minimum master-password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Salt length in bytes for each new hash.
const SALT_LEN: usize = 16;

/// Argon2id cost parameters for new hashes.
///
/// Stored hashes with any parameter below these are flagged by
/// [`CredentialStore::needs_rehash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashPolicy {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 2).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
    /// Hash output length in bytes (default: 32).
    pub output_len: usize,
}

impl Default for HashPolicy {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 2,
            parallelism: 4,
            output_len: 32,
        }
    }
}

/// Reject master passwords shorter than [`MIN_PASSWORD_LEN`] characters.
pub fn check_password_policy(password: &str) -> Result<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(VaultError::PolicyViolation(format!(
            "master password must be at least {MIN_PASSWORD_LEN} characters (got {len})"
        )));
    }
    Ok(())
}

/// Hashes, verifies and persists the master-password credential.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    policy: HashPolicy,
}

impl CredentialStore {
    pub fn new(policy: HashPolicy) -> Self {
        Self { policy }
    }

    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.policy.memory_kib,
            self.policy.iterations,
            self.policy.parallelism,
            Some(self.policy.output_len),
        )
        .map_err(|e| VaultError::ConfigError(format!("invalid Argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash `password` with a fresh random salt under the current policy.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| VaultError::EncryptionFailed(format!("salt encoding: {e}")))?;

        let hash = self
            .hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| VaultError::EncryptionFailed(format!("Argon2id hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    /// Check `password` against a PHC hash string.
    ///
    /// A mismatch is `Ok(false)`; only an unparsable hash is an error.
    pub fn verify_hash(password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| VaultError::InvalidCredentialRecord(e.to_string()))?;

        // Verification takes its parameters from the hash itself.
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(VaultError::InvalidCredentialRecord(e.to_string())),
        }
    }

    /// Whether `hash` was produced with weaker settings than the policy.
    pub fn needs_rehash(&self, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| VaultError::InvalidCredentialRecord(e.to_string()))?;

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return Ok(true);
        }
        if parsed.version.unwrap_or(0) < u32::from(Version::V0x13) {
            return Ok(true);
        }

        let param = |name: &str| {
            parsed.params.get_decimal(name).ok_or_else(|| {
                VaultError::InvalidCredentialRecord(format!("hash is missing parameter '{name}'"))
            })
        };
        let output_len = parsed.hash.map_or(0, |h| h.len());

        Ok(param("m")? < self.policy.memory_kib
            || param("t")? < self.policy.iterations
            || param("p")? < self.policy.parallelism
            || output_len < self.policy.output_len)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// `true` once a master password has been set for this vault.
    pub fn has_credential(conn: &Connection) -> Result<bool> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM credential", [], |r| r.get(0))?;
        Ok(count > 0)
    }

    pub fn stored_hash(conn: &Connection) -> Result<Option<String>> {
        Ok(conn
            .query_row("SELECT password_hash FROM credential WHERE id = 1", [], |r| {
                r.get(0)
            })
            .optional()?)
    }

    /// Set the first master password.  Refused once a credential exists.
    pub fn bootstrap(&self, conn: &Connection, password: &str) -> Result<()> {
        check_password_policy(password)?;
        if Self::has_credential(conn)? {
            return Err(VaultError::PolicyViolation(
                "vault already has a master password".into(),
            ));
        }
        let hash = self.hash_password(password)?;
        Self::store_hash(conn, &hash)
    }

    /// Verify `password` against the stored hash.
    ///
    /// Without a stored credential there is nothing to match: `Ok(false)`.
    pub fn verify(&self, conn: &Connection, password: &str) -> Result<bool> {
        match Self::stored_hash(conn)? {
            Some(hash) => Self::verify_hash(password, &hash),
            None => Ok(false),
        }
    }

    /// Hash `password` under the current policy and replace the row.
    pub fn replace(&self, conn: &Connection, password: &str) -> Result<()> {
        let hash = self.hash_password(password)?;
        Self::store_hash(conn, &hash)
    }

    /// Upsert the singleton row, keeping any unlock-TOTP secret.
    pub fn store_hash(conn: &Connection, hash: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO credential (id, password_hash, created_at) VALUES (1, ?1, ?2)
             ON CONFLICT (id) DO UPDATE SET password_hash = excluded.password_hash",
            rusqlite::params![hash, timestamp(Utc::now())],
        )?;
        Ok(())
    }

    /// Sealed secret of the vault-unlock second factor, if enabled.
    pub fn unlock_totp(conn: &Connection) -> Result<Option<Vec<u8>>> {
        let row: Option<Option<Vec<u8>>> = conn
            .query_row("SELECT totp_secret FROM credential WHERE id = 1", [], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(row.flatten())
    }

    /// Store or clear the sealed unlock-TOTP secret.
    ///
    /// Requires a credential row: a second factor without a master
    /// password makes no sense.
    pub fn set_unlock_totp(conn: &Connection, sealed: Option<&[u8]>) -> Result<()> {
        let changed = conn.execute(
            "UPDATE credential SET totp_secret = ?1 WHERE id = 1",
            [sealed],
        )?;
        if changed == 0 {
            return Err(VaultError::PolicyViolation(
                "set a master password before enabling two-factor unlock".into(),
            ));
        }
        Ok(())
    }
}
