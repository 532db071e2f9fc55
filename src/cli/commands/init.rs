//! `securepass init`: create a new vault and register the master password.

use crate::cli::output;
use crate::cli::{load_settings, open_session, prompt_new_password, vault_path, Cli, PASSWORD_ENV};
use crate::errors::{Result, VaultError};
use crate::vault::create_vault;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;

    // 1. Refuse to overwrite an existing vault.
    if path.exists() {
        output::tip("Use `securepass add <NAME>` to add entries to the existing vault.");
        return Err(VaultError::VaultAlreadyExists(path));
    }

    // 2. Prompt for a new password (with confirmation).
    let password = prompt_new_password(PASSWORD_ENV)?;

    // 3. Create the file, then unlock once to store the credential hash.
    create_vault(&path, &password)?;
    let session = open_session(cli, &settings, &password)?;
    let categories = session.list_categories()?.len();
    session.close()?;

    output::success(&format!(
        "Vault created at {} ({categories} default categories)",
        path.display()
    ));
    output::tip("Run `securepass add <NAME>` to add an entry.");
    output::tip("Run `securepass list` to see all entries.");

    Ok(())
}
