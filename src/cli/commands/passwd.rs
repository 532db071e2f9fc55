//! `securepass passwd`: change the master password.
//!
//! Every encrypted field is re-keyed and the vault re-sealed under the
//! new password in one step; a failure leaves the old file in place.

use crate::cli::output;
use crate::cli::{load_settings, open_session, prompt_new_password, prompt_password, Cli};
use crate::cli::NEW_PASSWORD_ENV;
use crate::errors::Result;

/// Execute the `passwd` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;

    // 1. Open the vault with the current password.
    output::info("Enter your current master password.");
    let old_password = prompt_password()?;
    let mut session = open_session(cli, &settings, &old_password)?;

    // 2. Prompt for the new password.
    output::info("Choose your new master password.");
    let new_password = prompt_new_password(NEW_PASSWORD_ENV)?;

    // 3. Re-key and re-seal.
    session.change_master_password(&old_password, &new_password)?;
    let entries = session.list_entries()?.len();
    session.close()?;

    output::success(&format!("Master password changed ({entries} entries re-encrypted)"));
    Ok(())
}
