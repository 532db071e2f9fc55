//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod clipboard;
pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::{Session, MIN_PASSWORD_LEN};

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "SECUREPASS_PASSWORD";

/// Environment variable holding the new master password for `passwd`.
pub const NEW_PASSWORD_ENV: &str = "SECUREPASS_NEW_PASSWORD";

/// Environment variable holding a two-factor unlock code.
pub const TOTP_CODE_ENV: &str = "SECUREPASS_TOTP";

/// SecurePass CLI: encrypted password vault.
#[derive(Parser)]
#[command(name = "securepass", about = "Encrypted local password vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: from .securepass.toml, else vault.spdb)
    #[arg(long, global = true, env = "SECUREPASS_VAULT")]
    pub vault: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init,

    /// List entries
    List {
        /// Only entries in this category
        #[arg(short, long)]
        category: Option<i64>,
    },

    /// Search entries by name, username or website
    Search {
        /// Case-insensitive substring
        query: String,
    },

    /// Show one entry
    Show {
        /// Entry id
        id: i64,
        /// Print the password and notes in clear text
        #[arg(long)]
        reveal: bool,
    },

    /// Copy a field of an entry to the clipboard
    Copy {
        /// Entry id
        id: i64,
        /// Which field to copy
        #[arg(short, long, value_enum, default_value_t = CopyField::Password)]
        field: CopyField,
    },

    /// Add an entry
    Add(EntryArgs),

    /// Edit an entry (only the given fields change)
    Edit {
        /// Entry id
        id: i64,
        #[command(flatten)]
        fields: EditArgs,
    },

    /// Delete an entry
    Delete {
        /// Entry id
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Print the current TOTP code of an entry
    Totp {
        /// Entry id
        id: i64,
    },

    /// Change the master password
    Passwd,

    /// Generate a random password
    Generate(GenerateArgs),

    /// Manage the two-factor unlock code
    TwoFactor {
        #[command(subcommand)]
        action: TwoFactorAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Entry field the `copy` command can place on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CopyField {
    Password,
    Username,
    Totp,
}

impl std::fmt::Display for CopyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Password => "password",
            Self::Username => "username",
            Self::Totp => "TOTP code",
        })
    }
}

/// Fields for `add`.
#[derive(clap::Args)]
pub struct EntryArgs {
    /// Entry name (e.g. "GitHub")
    pub name: String,
    /// Login name
    #[arg(short, long)]
    pub username: Option<String>,
    /// Password (omit for an interactive prompt)
    #[arg(short, long)]
    pub password: Option<String>,
    /// Generate a random password instead of prompting
    #[arg(short, long, conflicts_with = "password")]
    pub generate: bool,
    /// Website URL
    #[arg(long)]
    pub url: Option<String>,
    /// Category id
    #[arg(short, long)]
    pub category: Option<i64>,
    /// Free-form notes (stored encrypted)
    #[arg(short, long)]
    pub notes: Option<String>,
    /// Base32 TOTP secret (stored encrypted)
    #[arg(long)]
    pub totp: Option<String>,
}

/// Fields for `edit`.  Absent flags keep the current value.
#[derive(clap::Args)]
pub struct EditArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub username: Option<String>,
    /// New password
    #[arg(short, long)]
    pub password: Option<String>,
    /// Generate a new random password
    #[arg(short, long, conflicts_with = "password")]
    pub generate: bool,
    #[arg(long)]
    pub url: Option<String>,
    /// Move to this category
    #[arg(short, long, conflicts_with = "no_category")]
    pub category: Option<i64>,
    /// Remove the entry from its category
    #[arg(long)]
    pub no_category: bool,
    #[arg(short, long)]
    pub notes: Option<String>,
    /// New TOTP secret ("" removes it)
    #[arg(long)]
    pub totp: Option<String>,
}

/// Category subcommands.
#[derive(clap::Subcommand)]
pub enum CategoryAction {
    /// List categories with entry counts
    List,
    /// Add a category
    Add {
        name: String,
        /// Hex color such as #10b981 (default: gray)
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename or recolor a category
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category (its entries become uncategorized)
    Delete {
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Two-factor unlock subcommands.
#[derive(clap::Subcommand)]
pub enum TwoFactorAction {
    /// Generate a secret and require a code on every unlock
    Enable,
    /// Stop requiring a code
    Disable,
}

/// Options for `generate`.
#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Password length (8-64, default from settings)
    #[arg(short, long)]
    pub length: Option<usize>,
    #[arg(long)]
    pub no_upper: bool,
    #[arg(long)]
    pub no_lower: bool,
    #[arg(long)]
    pub no_digits: bool,
    #[arg(long)]
    pub no_special: bool,
}

impl GenerateArgs {
    pub fn options(&self, settings: &Settings) -> crate::password::GeneratorOptions {
        crate::password::GeneratorOptions {
            length: self.length.unwrap_or(settings.generator_length),
            uppercase: !self.no_upper,
            lowercase: !self.no_lower,
            digits: !self.no_digits,
            special: !self.no_special,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Settings from `.securepass.toml` in the current directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Resolve the vault file: `--vault`, else the configured default.
pub fn vault_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    match &cli.vault {
        Some(path) => Ok(path.clone()),
        None => Ok(settings.vault_path(&std::env::current_dir()?)),
    }
}

/// Read a non-empty environment variable.
fn env_secret(name: &str) -> Option<Zeroizing<String>> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .map(Zeroizing::new)
}

/// Get the master password, trying in order:
/// 1. `SECUREPASS_PASSWORD` env var
/// 2. Interactive prompt
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = env_secret(PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation.
///
/// Respects `env_var` for scripted use and enforces the minimum length.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = env_secret(env_var) {
        crate::vault::credential::check_password_policy(&pw)?;
        return Ok(pw);
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master password")
                .with_confirmation("Confirm master password", "Passwords do not match, try again")
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

/// Ask for a yes/no confirmation, defaulting to "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Unlock the vault and authenticate the user.
///
/// 1. Decrypt the envelope with `password`.
/// 2. First use: store the master-password hash.  Otherwise verify it
///    (upgrading a hash made with weaker parameters).
/// 3. If two-factor unlock is on, require a valid code.
pub fn open_session(cli: &Cli, settings: &Settings, password: &str) -> Result<Session> {
    let path = vault_path(cli, settings)?;
    let mut session = Session::unlock_with_policy(&path, password, settings.hash_policy())?;

    if !session.has_credential()? {
        session.bootstrap_credential(password)?;
        output::info("Master password registered for this vault.");
    } else if !session.verify_credential(password)? {
        session.lock()?;
        return Err(VaultError::WrongPasswordOrCorrupt);
    }

    if session.unlock_totp_enabled()? {
        let code = match env_secret(TOTP_CODE_ENV) {
            Some(code) => code,
            None => Zeroizing::new(
                dialoguer::Input::<String>::new()
                    .with_prompt("Two-factor code")
                    .interact_text()
                    .map_err(|e| VaultError::CommandFailed(format!("code prompt: {e}")))?,
            ),
        };
        if !session.verify_unlock_totp(&code, crate::totp::now())? {
            session.lock()?;
            return Err(VaultError::CommandFailed("invalid two-factor code".into()));
        }
    }

    Ok(session)
}

/// Prompt for the password and open the vault named by the CLI args.
pub fn unlock(cli: &Cli) -> Result<(Settings, Session)> {
    let settings = load_settings()?;
    let password = prompt_password()?;
    let session = open_session(cli, &settings, &password)?;
    Ok((settings, session))
}
