//! `securepass generate`: print a random password.  No vault needed.

use crate::cli::{load_settings, output, GenerateArgs};
use crate::errors::Result;
use crate::password;

/// Execute the `generate` command.
pub fn execute(args: &GenerateArgs) -> Result<()> {
    let settings = load_settings()?;
    let generated = zeroize::Zeroizing::new(password::generate(&args.options(&settings))?);

    println!("{}", generated.as_str());
    let report = password::assess(&generated);
    eprintln!("{}", output::strength_label(&report));
    Ok(())
}
