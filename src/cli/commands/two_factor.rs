//! `securepass two-factor enable|disable`: TOTP code on every unlock.

use crate::cli::output;
use crate::cli::{unlock, Cli, TwoFactorAction};
use crate::errors::{Result, VaultError};
use crate::totp;

/// Execute a `two-factor` subcommand.
pub fn execute(cli: &Cli, action: &TwoFactorAction) -> Result<()> {
    let (settings, mut session) = unlock(cli)?;

    match action {
        TwoFactorAction::Enable => {
            if session.unlock_totp_enabled()? {
                output::info("Two-factor unlock is already enabled.");
                return session.close();
            }

            // 1. New secret; show it for enrollment.
            let secret = zeroize::Zeroizing::new(totp::generate_secret());
            let label = session
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "vault".to_string());
            output::info("Add this account to your authenticator app:");
            println!("  {}", totp::provisioning_uri(&secret, &label, &settings.totp_issuer));
            println!("  secret: {}", secret.as_str());

            // 2. Prove the app is set up before locking anyone out.
            let code: String = dialoguer::Input::new()
                .with_prompt("Code shown by the app")
                .interact_text()
                .map_err(|e| VaultError::CommandFailed(format!("code prompt: {e}")))?;
            if !totp::verify(&secret, &code, totp::now())? {
                session.close()?;
                return Err(VaultError::CommandFailed(
                    "code did not match; two-factor unlock not enabled".into(),
                ));
            }

            // 3. Persist.
            session.enable_unlock_totp(&secret)?;
            output::success("Two-factor unlock enabled.");
        }
        TwoFactorAction::Disable => {
            session.disable_unlock_totp()?;
            output::success("Two-factor unlock disabled.");
        }
    }

    session.close()
}
