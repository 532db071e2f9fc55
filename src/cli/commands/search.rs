//! `securepass search`: find entries by name, username or website.

use crate::cli::{output, unlock, Cli};
use crate::errors::Result;

/// Execute the `search` command.
pub fn execute(cli: &Cli, query: &str) -> Result<()> {
    let (_settings, session) = unlock(cli)?;

    let hits = session.search(query)?;
    let categories = session.list_categories()?;
    output::print_entries_table(&hits, &categories);
    if !hits.is_empty() {
        output::info(&format!("{} match(es) for '{query}'", hits.len()));
    }

    session.close()
}
