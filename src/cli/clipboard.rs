//! Clipboard copy with delayed clear.
//!
//! On X11 and Wayland the clipboard contents belong to the process that
//! set them, so the command stays alive until the clear delay expires.

use std::thread;
use std::time::Duration;

use arboard::Clipboard;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

fn clipboard_err(e: arboard::Error) -> VaultError {
    VaultError::CommandFailed(format!("clipboard: {e}"))
}

/// Put `text` on the clipboard, wait `clear_after_secs`, then clear it
/// unless something else was copied meanwhile.  Zero disables clearing.
pub fn copy_with_auto_clear(text: &str, clear_after_secs: u64) -> Result<()> {
    let mut clipboard = Clipboard::new().map_err(clipboard_err)?;
    clipboard.set_text(text).map_err(clipboard_err)?;

    if clear_after_secs == 0 {
        return Ok(());
    }

    thread::sleep(Duration::from_secs(clear_after_secs));

    let current = clipboard.get_text().map(Zeroizing::new);
    match current {
        Ok(current) if current.as_str() != text => {
            tracing::debug!("clipboard changed since copy, leaving it alone");
        }
        _ => clipboard.clear().map_err(clipboard_err)?,
    }
    Ok(())
}
