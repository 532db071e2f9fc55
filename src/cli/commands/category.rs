//! `securepass category ...`: manage categories.

use std::collections::HashMap;

use crate::cli::output;
use crate::cli::{confirm, unlock, CategoryAction, Cli};
use crate::errors::{Result, VaultError};

/// Execute a `category` subcommand.
pub fn execute(cli: &Cli, action: &CategoryAction) -> Result<()> {
    let (_settings, mut session) = unlock(cli)?;

    match action {
        CategoryAction::List => {
            let categories = session.list_categories()?;
            let mut counts: HashMap<i64, usize> = HashMap::new();
            for entry in session.list_entries()? {
                if let Some(id) = entry.category_id {
                    *counts.entry(id).or_default() += 1;
                }
            }
            output::print_categories_table(&categories, &counts);
        }
        CategoryAction::Add { name, color } => {
            let id = session.add_category(name, color.as_deref())?;
            output::success(&format!("Category '{name}' added with id {id}"));
        }
        CategoryAction::Edit { id, name, color } => {
            let current = session
                .get_category(*id)?
                .ok_or(VaultError::CategoryNotFound(*id))?;
            let name = name.as_deref().unwrap_or(current.name.as_str());
            let color = color.as_deref().unwrap_or(current.color.as_str());
            session.update_category(*id, name, color)?;
            output::success(&format!("Category {id} updated"));
        }
        CategoryAction::Delete { id, force } => {
            let current = session
                .get_category(*id)?
                .ok_or(VaultError::CategoryNotFound(*id))?;
            if !force && !confirm(&format!("Delete category '{}'?", current.name))? {
                output::info("Cancelled.");
                return session.close();
            }
            let detached = session.delete_category(*id)?;
            output::success(&format!("Deleted category '{}'", current.name));
            if detached > 0 {
                output::info(&format!("{detached} entries are now uncategorized."));
            }
        }
    }

    session.close()
}
