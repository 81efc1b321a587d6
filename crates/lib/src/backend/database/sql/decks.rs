//! Deck, sharing and like storage operations for SQL backends.

use std::collections::BTreeSet;

use sqlx::AnyConnection;

use crate::{
    DeckId, Result, UserId,
    backend::{BackendError, DeckGuard, UNCATEGORIZED_CONSTRAINT},
    clock::Timestamp,
    store::{Deck, DeckKind, DeckRecord, DeckUpdate, Share},
};

use super::{SqlxBackend, SqlxResultExt, is_unique_violation};

type DeckRow = (String, String, String, String, String, i64, i64, i64);

const DECK_COLUMNS: &str =
    "id, owner_id, name, description, kind, is_private, date_created, date_updated";

fn record_from_row(row: DeckRow) -> Result<DeckRecord> {
    let (id, owner, name, description, kind, is_private, date_created, date_updated) = row;
    let kind = DeckKind::parse(&kind).ok_or_else(|| BackendError::CorruptValue {
        table: "decks".to_string(),
        reason: format!("unknown deck kind '{kind}' for deck {id}"),
    })?;
    Ok(DeckRecord {
        id: DeckId::from(id),
        owner: UserId::from(owner),
        name,
        description,
        kind,
        is_private: is_private != 0,
        date_created,
        date_updated,
    })
}

fn records_from_rows(rows: Vec<DeckRow>) -> Result<Vec<DeckRecord>> {
    rows.into_iter().map(record_from_row).collect()
}

/// Load the sharing list and likes of a deck record.
async fn assemble(conn: &mut AnyConnection, record: DeckRecord) -> Result<Deck> {
    let shares: Vec<(String, i64)> = sqlx::query_as(
        "SELECT user_id, editable FROM deck_shares WHERE deck_id = $1 ORDER BY user_id",
    )
    .bind(record.id.as_str())
    .fetch_all(&mut *conn)
    .await
    .sql_context("Failed to load deck shares")?;

    let likes: Vec<(String,)> = sqlx::query_as("SELECT user_id FROM deck_likes WHERE deck_id = $1")
        .bind(record.id.as_str())
        .fetch_all(&mut *conn)
        .await
        .sql_context("Failed to load deck likes")?;

    Ok(Deck {
        record,
        shared_to: shares
            .into_iter()
            .map(|(user, editable)| Share {
                user: UserId::from(user),
                editable: editable != 0,
            })
            .collect(),
        liked_by: likes
            .into_iter()
            .map(|(user,)| UserId::from(user))
            .collect::<BTreeSet<_>>(),
    })
}

async fn fetch_deck(conn: &mut AnyConnection, id: &DeckId) -> Result<Option<Deck>> {
    let row: Option<DeckRow> =
        sqlx::query_as(&format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&mut *conn)
            .await
            .sql_context("Failed to get deck")?;

    match row {
        Some(row) => Ok(Some(assemble(conn, record_from_row(row)?).await?)),
        None => Ok(None),
    }
}

pub(crate) async fn touch(conn: &mut AnyConnection, id: &DeckId, at: Timestamp) -> Result<()> {
    sqlx::query("UPDATE decks SET date_updated = $1 WHERE id = $2")
        .bind(at)
        .bind(id.as_str())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to touch deck")?;
    Ok(())
}

/// Lock a deck row until the end of the transaction, then check `guard`
/// against the deck as stored.
///
/// The no-op update takes the row lock on PostgreSQL and the database write
/// lock on SQLite, so the deck cannot change between the check and the write.
pub(crate) async fn lock_guarded(
    conn: &mut AnyConnection,
    id: &DeckId,
    guard: DeckGuard<'_>,
) -> Result<Deck> {
    let locked = sqlx::query("UPDATE decks SET date_updated = date_updated WHERE id = $1")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to lock deck")?
        .rows_affected();
    let deck = match locked {
        0 => None,
        _ => fetch_deck(conn, id).await?,
    };
    let deck = deck.ok_or_else(|| BackendError::DeckMissing {
        deck_id: id.clone(),
    })?;
    guard.check(&deck)?;
    Ok(deck)
}

/// Lock a user row until the end of the transaction. Fails with `UserMissing` if absent.
pub(crate) async fn lock_user(conn: &mut AnyConnection, id: &UserId) -> Result<()> {
    let locked = sqlx::query("UPDATE users SET created_at = created_at WHERE id = $1")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to lock user")?
        .rows_affected();
    if locked == 0 {
        return Err(BackendError::UserMissing {
            user_id: id.clone(),
        }
        .into());
    }
    Ok(())
}

/// Insert a deck. A second Uncategorized deck for the same owner is a `UniqueViolation`.
pub(crate) async fn insert_deck(backend: &SqlxBackend, deck: &DeckRecord) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_user(&mut tx, &deck.owner).await?;

    let result = sqlx::query(&format!(
        "INSERT INTO decks ({DECK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
    ))
    .bind(deck.id.as_str())
    .bind(deck.owner.as_str())
    .bind(&deck.name)
    .bind(&deck.description)
    .bind(deck.kind.as_str())
    .bind(i64::from(deck.is_private))
    .bind(deck.date_created)
    .bind(deck.date_updated)
    .execute(&mut *tx)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            let constraint = if deck.is_uncategorized() {
                UNCATEGORIZED_CONSTRAINT.to_string()
            } else {
                "decks_pkey".to_string()
            };
            return Err(BackendError::UniqueViolation { constraint }.into());
        }
        Err(e) => return Err(e).sql_context("Failed to insert deck"),
    }

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(())
}

pub(crate) async fn get_deck(backend: &SqlxBackend, id: &DeckId) -> Result<Option<Deck>> {
    let mut conn = backend
        .pool()
        .acquire()
        .await
        .sql_context("Failed to acquire connection")?;
    fetch_deck(&mut conn, id).await
}

pub(crate) async fn find_uncategorized_deck(
    backend: &SqlxBackend,
    owner: &UserId,
) -> Result<Option<Deck>> {
    let mut conn = backend
        .pool()
        .acquire()
        .await
        .sql_context("Failed to acquire connection")?;

    let row: Option<DeckRow> = sqlx::query_as(&format!(
        "SELECT {DECK_COLUMNS} FROM decks WHERE owner_id = $1 AND kind = $2"
    ))
    .bind(owner.as_str())
    .bind(DeckKind::Uncategorized.as_str())
    .fetch_optional(&mut *conn)
    .await
    .sql_context("Failed to find uncategorized deck")?;

    match row {
        Some(row) => Ok(Some(assemble(&mut conn, record_from_row(row)?).await?)),
        None => Ok(None),
    }
}

/// Write the provided columns of `changes`. Owner and kind are never written.
pub(crate) async fn update_deck(
    backend: &SqlxBackend,
    id: &DeckId,
    changes: &DeckUpdate,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<Deck> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_guarded(&mut tx, id, guard).await?;

    let mut columns = Vec::new();
    if changes.name.is_some() {
        columns.push("name");
    }
    if changes.description.is_some() {
        columns.push("description");
    }
    if changes.is_private.is_some() {
        columns.push("is_private");
    }
    columns.push("date_updated");
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ${}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE decks SET {} WHERE id = ${}",
        assignments.join(", "),
        columns.len() + 1
    );

    let mut query = sqlx::query(&sql);
    if let Some(name) = &changes.name {
        query = query.bind(name);
    }
    if let Some(description) = &changes.description {
        query = query.bind(description);
    }
    if let Some(is_private) = changes.is_private {
        query = query.bind(i64::from(is_private));
    }
    query
        .bind(at)
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to update deck")?;

    let deck = fetch_deck(&mut tx, id)
        .await?
        .ok_or_else(|| BackendError::DeckMissing {
            deck_id: id.clone(),
        })?;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(deck)
}

/// Delete a deck with its cards, sharing entries and likes. Returns the number of cards removed.
pub(crate) async fn delete_deck(
    backend: &SqlxBackend,
    id: &DeckId,
    guard: DeckGuard<'_>,
) -> Result<usize> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_guarded(&mut tx, id, guard).await?;

    let cards = sqlx::query("DELETE FROM cards WHERE deck_id = $1")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete deck cards")?
        .rows_affected();

    for statement in [
        "DELETE FROM deck_shares WHERE deck_id = $1",
        "DELETE FROM deck_likes WHERE deck_id = $1",
        "DELETE FROM decks WHERE id = $1",
    ] {
        sqlx::query(statement)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete deck")?;
    }

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(cards as usize)
}

/// Decks owned by `user` or shared with them, in no particular order.
pub(crate) async fn list_decks_for(
    backend: &SqlxBackend,
    user: &UserId,
) -> Result<Vec<DeckRecord>> {
    let rows: Vec<DeckRow> = sqlx::query_as(&format!(
        "SELECT {DECK_COLUMNS} FROM decks
         WHERE owner_id = $1
            OR id IN (SELECT deck_id FROM deck_shares WHERE user_id = $2)"
    ))
    .bind(user.as_str())
    .bind(user.as_str())
    .fetch_all(backend.pool())
    .await
    .sql_context("Failed to list decks")?;
    records_from_rows(rows)
}

pub(crate) async fn list_decks_owned_by(
    backend: &SqlxBackend,
    user: &UserId,
) -> Result<Vec<DeckRecord>> {
    let rows: Vec<DeckRow> =
        sqlx::query_as(&format!("SELECT {DECK_COLUMNS} FROM decks WHERE owner_id = $1"))
            .bind(user.as_str())
            .fetch_all(backend.pool())
            .await
            .sql_context("Failed to list owned decks")?;
    records_from_rows(rows)
}

pub(crate) async fn count_decks(backend: &SqlxBackend) -> Result<usize> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM decks")
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to count decks")?;
    Ok(count as usize)
}

/// Reassign a deck's owner and drop the new owner's sharing entry in one transaction.
pub(crate) async fn transfer_deck(
    backend: &SqlxBackend,
    id: &DeckId,
    new_owner: &UserId,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_guarded(&mut tx, id, guard).await?;
    lock_user(&mut tx, new_owner).await?;

    sqlx::query("UPDATE decks SET owner_id = $1, date_updated = $2 WHERE id = $3")
        .bind(new_owner.as_str())
        .bind(at)
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to transfer deck")?;

    sqlx::query("DELETE FROM deck_shares WHERE deck_id = $1 AND user_id = $2")
        .bind(id.as_str())
        .bind(new_owner.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to drop new owner's share")?;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(())
}

/// Insert or replace the sharing entry for `(deck, share.user)`.
pub(crate) async fn upsert_share(
    backend: &SqlxBackend,
    deck: &DeckId,
    share: &Share,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_guarded(&mut tx, deck, guard).await?;
    lock_user(&mut tx, &share.user).await?;

    sqlx::query(
        "INSERT INTO deck_shares (deck_id, user_id, editable) VALUES ($1, $2, $3)
         ON CONFLICT (deck_id, user_id) DO UPDATE SET editable = EXCLUDED.editable",
    )
    .bind(deck.as_str())
    .bind(share.user.as_str())
    .bind(i64::from(share.editable))
    .execute(&mut *tx)
    .await
    .sql_context("Failed to upsert share")?;

    touch(&mut tx, deck, at).await?;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(())
}

pub(crate) async fn remove_share(
    backend: &SqlxBackend,
    deck: &DeckId,
    user: &UserId,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<bool> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_guarded(&mut tx, deck, guard).await?;

    let removed = sqlx::query("DELETE FROM deck_shares WHERE deck_id = $1 AND user_id = $2")
        .bind(deck.as_str())
        .bind(user.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to remove share")?
        .rows_affected()
        > 0;

    if removed {
        touch(&mut tx, deck, at).await?;
    }

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(removed)
}

/// Record the guarded user's like. Returns false if it was already recorded.
///
/// The user row is locked before the deck, in the same order `delete_user` takes them.
pub(crate) async fn add_like(
    backend: &SqlxBackend,
    deck: &DeckId,
    guard: DeckGuard<'_>,
) -> Result<bool> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_user(&mut tx, guard.user).await?;
    lock_guarded(&mut tx, deck, guard).await?;

    let added = sqlx::query(
        "INSERT INTO deck_likes (deck_id, user_id) VALUES ($1, $2)
         ON CONFLICT (deck_id, user_id) DO NOTHING",
    )
    .bind(deck.as_str())
    .bind(guard.user.as_str())
    .execute(&mut *tx)
    .await
    .sql_context("Failed to add like")?
    .rows_affected()
        > 0;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(added)
}

pub(crate) async fn remove_like(
    backend: &SqlxBackend,
    deck: &DeckId,
    guard: DeckGuard<'_>,
) -> Result<bool> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_guarded(&mut tx, deck, guard).await?;

    let removed = sqlx::query("DELETE FROM deck_likes WHERE deck_id = $1 AND user_id = $2")
        .bind(deck.as_str())
        .bind(guard.user.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to remove like")?
        .rows_affected()
        > 0;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(removed)
}
