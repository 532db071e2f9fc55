//! `securepass totp`: print the current one-time code of an entry.

use crate::cli::{output, unlock, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `totp` command.
pub fn execute(cli: &Cli, id: i64) -> Result<()> {
    let (_settings, session) = unlock(cli)?;

    let code = session.entry_totp(id, crate::totp::now())?;
    session.close()?;

    match code {
        Some(code) => {
            println!("{}", code.digits);
            output::tip(&format!("valid for {}s", code.remaining_secs));
            Ok(())
        }
        None => Err(VaultError::CommandFailed(format!(
            "entry {id} has no TOTP secret (set one with `securepass edit {id} --totp <SECRET>`)"
        ))),
    }
}
