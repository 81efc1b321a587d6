//! Backend creation and utility functions.

use std::path::PathBuf;

use flashdeck::{
    Library,
    backend::{
        BackendImpl,
        database::{InMemory, Postgres, Sqlite},
    },
};

use crate::cli::{Backend, BackendConfig};

const SQLITE_FILE: &str = "flashdeck.db";
const JSON_FILE: &str = "flashdeck.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

fn data_dir(config: &BackendConfig) -> PathBuf {
    config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Human-readable description of the configured backend
pub fn backend_label(config: &BackendConfig) -> String {
    let dir = data_dir(config);
    match config.backend {
        Backend::Sqlite => format!("sqlite ({})", dir.join(SQLITE_FILE).display()),
        Backend::Postgres => match config.postgres_url {
            Some(ref url) => format!("postgres ({})", redact_postgres_url(url)),
            None => "postgres".to_string(),
        },
        Backend::Inmemory => format!("inmemory ({})", dir.join(JSON_FILE).display()),
    }
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    config: &BackendConfig,
) -> Result<Box<dyn BackendImpl>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(config);

    match config.backend {
        Backend::Sqlite => {
            tokio::fs::create_dir_all(&data_dir).await?;
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!(path = %db_path.display(), "Using SQLite backend");
            Ok(Box::new(Sqlite::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = config
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or FLASHDECK_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!(url = %display_url, "Connecting to PostgreSQL backend");

            match Postgres::connect_postgres(url).await {
                Ok(backend) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Box::new(backend))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
                }
            }
        }
        Backend::Inmemory => {
            tokio::fs::create_dir_all(&data_dir).await?;
            let json_path = data_dir.join(JSON_FILE);
            tracing::info!(path = %json_path.display(), "Using in-memory backend with persistence");
            Ok(Box::new(InMemory::load_from_file(&json_path).await?))
        }
    }
}

/// Open a library over the configured backend
pub async fn open_library(config: &BackendConfig) -> Result<Library, Box<dyn std::error::Error>> {
    let backend = create_backend(config).await?;
    Ok(Library::open(backend))
}

/// Write the in-memory snapshot back to disk after a mutating command.
///
/// SQL backends persist on every write, so this is a no-op for them.
pub async fn persist(
    library: &Library,
    config: &BackendConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(in_memory) = library.backend().as_any().downcast_ref::<InMemory>() {
        let json_path = data_dir(config).join(JSON_FILE);
        in_memory.save_to_file(&json_path).await?;
        tracing::info!(path = %json_path.display(), "Saved in-memory snapshot");
    }
    Ok(())
}
