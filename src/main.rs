use clap::Parser;
use securepass::cli::commands;
use securepass::cli::{Cli, Commands};

fn main() {
    // Diagnostics go to stderr; secrets are never logged.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SECUREPASS_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::List { category } => commands::list::execute(&cli, category),
        Commands::Search { ref query } => commands::search::execute(&cli, query),
        Commands::Show { id, reveal } => commands::show::execute(&cli, id, reveal),
        Commands::Copy { id, field } => commands::copy::execute(&cli, id, field),
        Commands::Add(ref args) => commands::add::execute(&cli, args),
        Commands::Edit { id, ref fields } => commands::edit::execute(&cli, id, fields),
        Commands::Delete { id, force } => commands::delete::execute(&cli, id, force),
        Commands::Category { ref action } => commands::category::execute(&cli, action),
        Commands::Totp { id } => commands::totp::execute(&cli, id),
        Commands::Passwd => commands::passwd::execute(&cli),
        Commands::Generate(ref args) => commands::generate::execute(args),
        Commands::TwoFactor { ref action } => commands::two_factor::execute(&cli, action),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        securepass::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
