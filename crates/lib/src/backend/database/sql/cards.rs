//! Card storage operations for SQL backends.
//!
//! Every card write locks and checks the affected decks, then touches them,
//! inside the same transaction.

use sqlx::AnyConnection;

use crate::{
    CardId, DeckId, Result,
    backend::DeckGuard,
    clock::Timestamp,
    store::{Card, CardUpdate},
};

use super::{
    SqlxBackend, SqlxResultExt,
    decks::{lock_guarded, touch},
};

type CardRow = (String, String, String, String, String, i64, i64);

const CARD_COLUMNS: &str = "id, deck_id, question, answer, hint, date_created, date_updated";

fn card_from_row(row: CardRow) -> Card {
    let (id, deck, question, answer, hint, date_created, date_updated) = row;
    Card {
        id: CardId::from(id),
        deck: DeckId::from(deck),
        question,
        answer,
        hint: (!hint.is_empty()).then_some(hint),
        date_created,
        date_updated,
    }
}

fn stored_hint(hint: Option<&str>) -> &str {
    hint.unwrap_or_default()
}

pub(crate) async fn insert_card(
    backend: &SqlxBackend,
    card: &Card,
    guard: DeckGuard<'_>,
) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    lock_guarded(&mut tx, &card.deck, guard).await?;

    sqlx::query(&format!(
        "INSERT INTO cards ({CARD_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
    ))
    .bind(card.id.as_str())
    .bind(card.deck.as_str())
    .bind(&card.question)
    .bind(&card.answer)
    .bind(stored_hint(card.hint.as_deref()))
    .bind(card.date_created)
    .bind(card.date_updated)
    .execute(&mut *tx)
    .await
    .sql_context("Failed to insert card")?;

    touch(&mut tx, &card.deck, card.date_created).await?;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(())
}

pub(crate) async fn get_card(backend: &SqlxBackend, id: &CardId) -> Result<Option<Card>> {
    let row: Option<CardRow> =
        sqlx::query_as(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(backend.pool())
            .await
            .sql_context("Failed to get card")?;
    Ok(row.map(card_from_row))
}

async fn fetch_card(conn: &mut AnyConnection, id: &CardId) -> Result<Option<Card>> {
    let row: Option<CardRow> =
        sqlx::query_as(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&mut *conn)
            .await
            .sql_context("Failed to get card")?;
    Ok(row.map(card_from_row))
}

/// Load a card and lock the deck it is stored in, checking `guard` on it.
///
/// A card moved away before its deck was locked is re-read; once the deck it
/// names is locked the card cannot leave it until the transaction ends.
async fn lock_card(
    conn: &mut AnyConnection,
    id: &CardId,
    guard: DeckGuard<'_>,
) -> Result<Option<Card>> {
    let mut locked: Vec<DeckId> = Vec::new();
    loop {
        let Some(card) = fetch_card(conn, id).await? else {
            return Ok(None);
        };
        if locked.contains(&card.deck) {
            return Ok(Some(card));
        }
        lock_guarded(conn, &card.deck, guard).await?;
        locked.push(card.deck);
    }
}

/// Write the provided columns of `changes` and touch both the card's previous
/// and current deck.
pub(crate) async fn update_card(
    backend: &SqlxBackend,
    id: &CardId,
    changes: &CardUpdate,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<Option<Card>> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let Some(current) = lock_card(&mut tx, id, guard).await? else {
        return Ok(None);
    };
    if let Some(destination) = &changes.deck
        && destination != &current.deck
    {
        lock_guarded(&mut tx, destination, guard).await?;
    }

    let mut columns = Vec::new();
    if changes.question.is_some() {
        columns.push("question");
    }
    if changes.answer.is_some() {
        columns.push("answer");
    }
    if changes.hint.is_some() {
        columns.push("hint");
    }
    if changes.deck.is_some() {
        columns.push("deck_id");
    }
    columns.push("date_updated");
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ${}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE cards SET {} WHERE id = ${}",
        assignments.join(", "),
        columns.len() + 1
    );

    let mut query = sqlx::query(&sql);
    if let Some(question) = &changes.question {
        query = query.bind(question);
    }
    if let Some(answer) = &changes.answer {
        query = query.bind(answer);
    }
    if let Some(hint) = &changes.hint {
        query = query.bind(stored_hint(hint.as_deref()));
    }
    if let Some(destination) = &changes.deck {
        query = query.bind(destination.as_str());
    }
    let updated = query
        .bind(at)
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to update card")?
        .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    touch(&mut tx, &current.deck, at).await?;
    if let Some(destination) = &changes.deck {
        touch(&mut tx, destination, at).await?;
    }
    let card = fetch_card(&mut tx, id).await?;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(card)
}

pub(crate) async fn delete_card(
    backend: &SqlxBackend,
    id: &CardId,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<bool> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let Some(card) = lock_card(&mut tx, id, guard).await? else {
        return Ok(false);
    };

    let removed = sqlx::query("DELETE FROM cards WHERE id = $1")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete card")?
        .rows_affected();
    if removed == 0 {
        return Ok(false);
    }

    touch(&mut tx, &card.deck, at).await?;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(true)
}

pub(crate) async fn list_cards(backend: &SqlxBackend, deck: &DeckId) -> Result<Vec<Card>> {
    let rows: Vec<CardRow> = sqlx::query_as(&format!(
        "SELECT {CARD_COLUMNS} FROM cards WHERE deck_id = $1 ORDER BY date_created, id"
    ))
    .bind(deck.as_str())
    .fetch_all(backend.pool())
    .await
    .sql_context("Failed to list cards")?;
    Ok(rows.into_iter().map(card_from_row).collect())
}

/// Delete cards whose deck no longer exists. Returns how many were removed.
pub(crate) async fn delete_orphaned_cards(backend: &SqlxBackend) -> Result<usize> {
    let done = sqlx::query("DELETE FROM cards WHERE deck_id NOT IN (SELECT id FROM decks)")
        .execute(backend.pool())
        .await
        .sql_context("Failed to delete orphaned cards")?;
    Ok(done.rows_affected() as usize)
}
