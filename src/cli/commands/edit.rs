//! `securepass edit`: change selected fields of an entry.
//!
//! The current secrets are decrypted into the draft so untouched fields
//! survive the full-row update.

use crate::cli::output;
use crate::cli::{unlock, Cli, EditArgs};
use crate::errors::{Result, VaultError};
use crate::password::{self, GeneratorOptions};
use crate::vault::{EntryDraft, PasswordEntry, Session};

/// Execute the `edit` command.
pub fn execute(cli: &Cli, id: i64, fields: &EditArgs) -> Result<()> {
    let (settings, mut session) = unlock(cli)?;

    let entry = session.get_entry(id)?.ok_or(VaultError::EntryNotFound(id))?;
    let mut draft = current_draft(&session, &entry)?;

    if let Some(name) = &fields.name {
        draft.name = name.clone();
    }
    if let Some(username) = &fields.username {
        draft.username = Some(username.clone());
    }
    if let Some(p) = &fields.password {
        output::warning("Password provided on command line; it may appear in shell history.");
        draft.password = p.clone();
    } else if fields.generate {
        let options = GeneratorOptions {
            length: settings.generator_length,
            ..GeneratorOptions::default()
        };
        draft.password = password::generate(&options)?;
    }
    if let Some(url) = &fields.url {
        draft.website_url = Some(url.clone());
    }
    if fields.no_category {
        draft.category_id = None;
    } else if let Some(category) = fields.category {
        draft.category_id = Some(category);
    }
    if let Some(notes) = &fields.notes {
        draft.notes = Some(notes.clone());
    }
    if let Some(totp) = &fields.totp {
        draft.totp_secret = Some(totp.clone());
    }

    session.update_entry(id, &draft)?;
    session.close()?;

    output::success(&format!("Entry {id} updated"));
    Ok(())
}

/// Rebuild a plaintext draft from a stored entry.
fn current_draft(session: &Session, entry: &PasswordEntry) -> Result<EntryDraft> {
    let open = |sealed: Option<&[u8]>| -> Result<Option<String>> {
        sealed
            .map(|s| session.decrypt_field(s).map(|plain| plain.as_str().to_owned()))
            .transpose()
    };

    let secret = session.decrypt_field(&entry.secret_password)?;
    let mut draft = EntryDraft::new(entry.name.as_str(), secret.as_str());
    draft.category_id = entry.category_id;
    draft.username = entry.username.clone();
    draft.website_url = entry.website_url.clone();
    draft.notes = open(entry.secret_notes.as_deref())?;
    draft.totp_secret = open(entry.secret_totp.as_deref())?;
    Ok(draft)
}
