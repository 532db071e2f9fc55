//! `securepass delete`: remove an entry from the vault.

use crate::cli::output;
use crate::cli::{confirm, unlock, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: i64, force: bool) -> Result<()> {
    let (_settings, mut session) = unlock(cli)?;

    let entry = session.get_entry(id)?.ok_or(VaultError::EntryNotFound(id))?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete entry '{}'?", entry.name))? {
        output::info("Cancelled.");
        return session.close();
    }

    session.delete_entry(id)?;
    session.close()?;

    output::success(&format!("Deleted entry '{}'", entry.name));
    Ok(())
}
