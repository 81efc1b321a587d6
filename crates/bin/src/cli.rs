//! CLI argument definitions for the Flashdeck binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// In-memory with JSON persistence (for development and small deployments)
    Inmemory,
}

/// Flashdeck administrative tool
#[derive(Parser, Debug)]
#[command(name = "flashdeck")]
#[command(about = "Flashdeck: flashcard decks with shared access control")]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show backend and storage statistics
    Info(InfoArgs),
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Inspect and maintain decks
    #[command(subcommand)]
    Deck(DeckCommand),
}

/// Storage options shared by every command
#[derive(Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "FLASHDECK_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores flashdeck.db
    /// For InMemory: stores flashdeck.json
    #[arg(short = 'D', long, env = "FLASHDECK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "FLASHDECK_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a new user
    Add(UserAddArgs),
    /// List registered users
    List(UserListArgs),
}

#[derive(Args, Debug)]
pub struct UserAddArgs {
    /// Username (case-insensitive, 3-32 of a-z 0-9 _ . -)
    pub username: String,

    /// Name shown to other users; defaults to the username
    #[arg(long)]
    pub display_name: Option<String>,

    #[command(flatten)]
    pub backend_config: BackendConfig,
}

#[derive(Args, Debug)]
pub struct UserListArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,
}

#[derive(Subcommand, Debug)]
pub enum DeckCommand {
    /// List the decks a user owns or has been shared
    List(DeckListArgs),
    /// Show a deck and its cards as seen by a user
    Show(DeckShowArgs),
    /// Delete cards whose deck no longer exists
    PurgeOrphans(PurgeOrphansArgs),
}

#[derive(Args, Debug)]
pub struct DeckListArgs {
    /// User id or username to list decks for
    #[arg(long = "as", value_name = "USER")]
    pub as_user: String,

    #[command(flatten)]
    pub backend_config: BackendConfig,
}

#[derive(Args, Debug)]
pub struct DeckShowArgs {
    /// Deck id
    pub deck_id: String,

    /// User id or username to view the deck as; anonymous if omitted
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<String>,

    #[command(flatten)]
    pub backend_config: BackendConfig,
}

#[derive(Args, Debug)]
pub struct PurgeOrphansArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,
}
