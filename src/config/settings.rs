use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};
use crate::vault::credential::HashPolicy;

/// User-level configuration, loaded from `.securepass.toml`.
///
/// Every field has a sensible default so SecurePass works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file used when `--vault` is not given.
    #[serde(default = "default_vault")]
    pub default_vault: String,

    /// Argon2id memory cost in KiB for the master-password hash (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2id iteration count (default: 2).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2id parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Issuer shown by authenticator apps for the unlock factor.
    #[serde(default = "default_totp_issuer")]
    pub totp_issuer: String,

    /// Length used by `generate` when `--length` is not given.
    #[serde(default = "default_generator_length")]
    pub generator_length: usize,

    /// Seconds before `copy` clears the clipboard again (0 = never).
    #[serde(default = "default_clipboard_clear_seconds")]
    pub clipboard_clear_seconds: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault() -> String {
    "vault.spdb".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_totp_issuer() -> String {
    "SecurePass".to_string()
}

fn default_generator_length() -> usize {
    16
}

fn default_clipboard_clear_seconds() -> u64 {
    30
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_vault: default_vault(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            totp_issuer: default_totp_issuer(),
            generator_length: default_generator_length(),
            clipboard_clear_seconds: default_clipboard_clear_seconds(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for.
    pub const FILE_NAME: &'static str = ".securepass.toml";

    /// Load settings from `<dir>/.securepass.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    /// Resolve the default vault file relative to `dir`.
    ///
    /// An absolute `default_vault` is returned unchanged.
    pub fn vault_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.default_vault)
    }

    /// Convert the Argon2 settings into the credential hash policy.
    pub fn hash_policy(&self) -> HashPolicy {
        HashPolicy {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
            ..HashPolicy::default()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
