//! `securepass completions`: print a shell completion script.
//!
//!   securepass completions bash > ~/.local/share/bash-completion/completions/securepass

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut out = io::stdout().lock();
    generate(shell, &mut cmd, name, &mut out);
    out.flush()?;
    Ok(())
}
