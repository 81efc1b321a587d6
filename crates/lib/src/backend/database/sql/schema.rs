//! SQL schema definitions and migrations.
//!
//! This module contains the database schema used by SQL backends.
//! The schema is designed to be portable between SQLite and Postgres.
//!
//! # Migration System
//!
//! The migration system uses code-based migrations rather than SQL files to handle
//! dialect differences between SQLite and PostgreSQL. Each migration is a function
//! that receives the backend and can execute database-specific SQL as needed.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`
//! 4. Document what the migration does

use crate::Result;
use crate::backend::errors::BackendError;

use super::{SqlxBackend, SqlxResultExt};

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
///
/// Each statement uses portable SQL that works on both SQLite and PostgreSQL.
/// Booleans are stored as BIGINT 0/1 and timestamps as BIGINT milliseconds.
pub const CREATE_TABLES: &[&str] = &[
    // Schema version tracking
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // Usernames are stored normalized, so the UNIQUE constraint is case-insensitive
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        username TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        created_at BIGINT NOT NULL
    )",
    // kind is 'normal' or 'uncategorized'
    "CREATE TABLE IF NOT EXISTS decks (
        id TEXT PRIMARY KEY NOT NULL,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        kind TEXT NOT NULL DEFAULT 'normal',
        is_private BIGINT NOT NULL DEFAULT 1,
        date_created BIGINT NOT NULL,
        date_updated BIGINT NOT NULL
    )",
    // At most one sharing entry per (deck, user)
    "CREATE TABLE IF NOT EXISTS deck_shares (
        deck_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        editable BIGINT NOT NULL DEFAULT 0,
        PRIMARY KEY (deck_id, user_id)
    )",
    // At most one like per (deck, user)
    "CREATE TABLE IF NOT EXISTS deck_likes (
        deck_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        PRIMARY KEY (deck_id, user_id)
    )",
    // No foreign key on deck_id: orphaned cards are tolerated and purged separately.
    // An empty hint means no hint.
    "CREATE TABLE IF NOT EXISTS cards (
        id TEXT PRIMARY KEY NOT NULL,
        deck_id TEXT NOT NULL,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        hint TEXT NOT NULL DEFAULT '',
        date_created BIGINT NOT NULL,
        date_updated BIGINT NOT NULL
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    // One Uncategorized deck per owner, enforced under concurrency
    "CREATE UNIQUE INDEX IF NOT EXISTS decks_one_uncategorized_per_owner
        ON decks(owner_id) WHERE kind = 'uncategorized'",
    // Deck listings
    "CREATE INDEX IF NOT EXISTS idx_decks_owner ON decks(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_deck_shares_user ON deck_shares(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_deck_likes_user ON deck_likes(user_id)",
    // Card listings and cascade deletes
    "CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id, date_created)",
];

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and handles migrations
/// if the schema version has changed.
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();

    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Schema creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((current_version,)) if current_version < SCHEMA_VERSION => {
            migrate(backend, current_version, SCHEMA_VERSION).await?;
        }
        Some((current_version,)) if current_version > SCHEMA_VERSION => {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "Database schema v{current_version} is newer than supported v{SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Index creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    tracing::debug!(version = SCHEMA_VERSION, kind = ?backend.kind(), "SQL schema ready");
    Ok(())
}

/// Run migrations sequentially from one schema version to another.
///
/// Migrations are run one at a time, incrementing the version after each.
async fn migrate(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(backend, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(backend.pool())
            .await
            .sql_context(&format!("Failed to update schema version to {next}"))?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }

    tracing::info!(from, to, "All migrations completed successfully");
    Ok(())
}

/// Execute a single migration step.
///
/// Add new migrations here as match arms, e.g. `1 => migrate_v1_to_v2(backend).await`.
async fn run_migration(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    let _ = backend;

    Err(BackendError::SqlxError {
        reason: format!(
            "Unknown migration path: v{from} to v{to}. \
             This likely means SCHEMA_VERSION was incremented without adding a migration."
        ),
        source: None,
    }
    .into())
}
