//! `securepass show`: print one entry, secrets masked unless `--reveal`.

use crate::cli::{output, unlock, Cli};
use crate::errors::{Result, VaultError};
use crate::password;

const MASK: &str = "********";

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: i64, reveal: bool) -> Result<()> {
    let (_settings, session) = unlock(cli)?;

    let entry = session.get_entry(id)?.ok_or(VaultError::EntryNotFound(id))?;
    let category = match entry.category_id {
        Some(cid) => session.get_category(cid)?,
        None => None,
    };

    // Decrypted values live only inside this block.
    {
        let secret = session.decrypt_field(&entry.secret_password)?;
        let strength = output::strength_label(&password::assess(&secret));

        if reveal {
            let notes = entry
                .secret_notes
                .as_deref()
                .map(|sealed| session.decrypt_field(sealed))
                .transpose()?;
            output::print_entry(&entry, category.as_ref(), &secret, notes.as_deref().map(|n| n.as_str()));
        } else {
            let notes = entry.secret_notes.as_ref().map(|_| MASK);
            output::print_entry(&entry, category.as_ref(), MASK, notes);
        }
        println!("{:>10}  {}", console::style("Strength").bold(), strength);
    }

    if !reveal {
        output::tip(&format!("Run `securepass show {id} --reveal` to print secrets."));
    }

    session.close()
}
