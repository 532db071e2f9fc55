//! `securepass copy`: put an entry's password, username or TOTP code on
//! the clipboard, cleared again after `clipboard_clear_seconds`.

use zeroize::Zeroizing;

use crate::cli::clipboard::copy_with_auto_clear;
use crate::cli::{output, unlock, Cli, CopyField};
use crate::errors::{Result, VaultError};

/// Execute the `copy` command.
pub fn execute(cli: &Cli, id: i64, field: CopyField) -> Result<()> {
    let (settings, session) = unlock(cli)?;
    let entry = session.get_entry(id)?.ok_or(VaultError::EntryNotFound(id))?;

    let value: Zeroizing<String> = match field {
        CopyField::Password => session.decrypt_field(&entry.secret_password)?,
        CopyField::Username => Zeroizing::new(entry.username.clone().ok_or_else(|| {
            VaultError::CommandFailed(format!("entry {id} has no username"))
        })?),
        CopyField::Totp => {
            let code = session
                .entry_totp(id, crate::totp::now())?
                .ok_or_else(|| VaultError::CommandFailed(format!("entry {id} has no TOTP secret")))?;
            Zeroizing::new(code.digits)
        }
    };

    // The vault is not needed while we wait on the clipboard.
    session.close()?;

    let secs = settings.clipboard_clear_seconds;
    if secs > 0 {
        output::success(&format!("Copied {field} of '{}'; clearing in {secs}s", entry.name));
    } else {
        output::success(&format!("Copied {field} of '{}'", entry.name));
    }
    copy_with_auto_clear(&value, secs)?;
    if secs > 0 {
        output::info("Clipboard cleared.");
    }
    Ok(())
}
