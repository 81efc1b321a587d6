use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, DeckCommand, UserCommand};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so that --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("flashdeck=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from_flag(cli.json);

    match cli.command {
        Commands::Info(ref args) => commands::info::run(args, format).await,
        Commands::User(UserCommand::Add(ref args)) => commands::user::add(args, format).await,
        Commands::User(UserCommand::List(ref args)) => commands::user::list(args, format).await,
        Commands::Deck(DeckCommand::List(ref args)) => commands::deck::list(args, format).await,
        Commands::Deck(DeckCommand::Show(ref args)) => commands::deck::show(args, format).await,
        Commands::Deck(DeckCommand::PurgeOrphans(ref args)) => {
            commands::deck::purge_orphans(args, format).await
        }
    }
}
