//! `securepass list`: show entries, optionally filtered by category.

use crate::cli::{output, unlock, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `list` command.
pub fn execute(cli: &Cli, category: Option<i64>) -> Result<()> {
    let (_settings, session) = unlock(cli)?;

    let entries = match category {
        Some(id) => {
            session.get_category(id)?.ok_or(VaultError::CategoryNotFound(id))?;
            session.entries_by_category(id)?
        }
        None => session.list_entries()?,
    };
    let categories = session.list_categories()?;
    output::print_entries_table(&entries, &categories);

    session.close()
}
