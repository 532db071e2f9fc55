//! `securepass add`: create an entry.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{unlock, Cli, EntryArgs};
use crate::errors::{Result, VaultError};
use crate::password::{self, GeneratorOptions};
use crate::vault::EntryDraft;

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: &EntryArgs) -> Result<()> {
    let (settings, mut session) = unlock(cli)?;

    // Determine the entry password from one of three sources.
    let secret = if let Some(p) = &args.password {
        output::warning("Password provided on command line; it may appear in shell history.");
        Zeroizing::new(p.clone())
    } else if args.generate {
        let options = GeneratorOptions {
            length: settings.generator_length,
            ..GeneratorOptions::default()
        };
        Zeroizing::new(password::generate(&options)?)
    } else {
        Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Password for {}", args.name))
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?,
        )
    };

    let mut draft = EntryDraft::new(args.name.as_str(), secret.as_str());
    draft.username = args.username.clone();
    draft.website_url = args.url.clone();
    draft.category_id = args.category;
    draft.notes = args.notes.clone();
    draft.totp_secret = args.totp.clone();

    let id = session.add_entry(&draft)?;
    let strength = output::strength_label(&password::assess(&secret));
    session.close()?;

    output::success(&format!("Entry '{}' added with id {id}", args.name));
    output::info(&format!("Password strength: {strength}"));
    if args.generate {
        output::tip(&format!("Run `securepass show {id} --reveal` to see the generated password."));
    }

    Ok(())
}
