//! User, deck and sharing operations for the InMemory backend
//!
//! Guarded writes look the deck up and check the guard under the same write
//! lock that applies the change.

use super::{InMemory, Tables};
use crate::{
    DeckId, Result, UserId,
    backend::{BackendError, DeckGuard, UNCATEGORIZED_CONSTRAINT},
    clock::Timestamp,
    store::{Deck, DeckRecord, DeckUpdate, Share},
    user::{User, UserDeletion, UserError},
};

/// Builds the read model of a deck from its record and the relation tables.
pub(crate) fn assemble_deck(tables: &Tables, record: &DeckRecord) -> Deck {
    let shared_to = tables
        .shares
        .get(&record.id)
        .map(|shares| {
            shares
                .iter()
                .map(|(user, editable)| Share {
                    user: user.clone(),
                    editable: *editable,
                })
                .collect()
        })
        .unwrap_or_default();
    let liked_by = tables.likes.get(&record.id).cloned().unwrap_or_default();

    Deck {
        record: record.clone(),
        shared_to,
        liked_by,
    }
}

/// Fails with `DeckMissing` or `AccessRevoked` unless `guard` holds on the stored deck.
pub(crate) fn check_guard(tables: &Tables, id: &DeckId, guard: DeckGuard<'_>) -> Result<()> {
    let record = tables.decks.get(id).ok_or_else(|| BackendError::DeckMissing {
        deck_id: id.clone(),
    })?;
    guard.check(&assemble_deck(tables, record))
}

fn require_user(tables: &Tables, id: &UserId) -> Result<()> {
    if tables.users.contains_key(id) {
        return Ok(());
    }
    Err(BackendError::UserMissing {
        user_id: id.clone(),
    }
    .into())
}

pub(crate) fn touch(tables: &mut Tables, id: &DeckId, at: Timestamp) {
    if let Some(record) = tables.decks.get_mut(id) {
        record.date_updated = at;
    }
}

/// Removes a deck with its cards and relations. Returns the number of cards removed.
fn remove_deck(tables: &mut Tables, id: &DeckId) -> usize {
    let before = tables.cards.len();
    tables.cards.retain(|_, card| &card.deck != id);
    tables.shares.remove(id);
    tables.likes.remove(id);
    tables.decks.remove(id);
    before - tables.cards.len()
}

pub(crate) async fn insert_user(backend: &InMemory, user: &User) -> Result<()> {
    let mut tables = backend.tables.write().await;
    if tables.users.values().any(|u| u.username == user.username) {
        return Err(UserError::UsernameAlreadyExists {
            username: user.username.clone(),
        }
        .into());
    }
    tables.users.insert(user.id.clone(), user.clone());
    Ok(())
}

pub(crate) async fn update_user(backend: &InMemory, user: &User) -> Result<()> {
    let mut tables = backend.tables.write().await;
    let taken = tables
        .users
        .values()
        .any(|u| u.username == user.username && u.id != user.id);
    if taken {
        return Err(UserError::UsernameAlreadyExists {
            username: user.username.clone(),
        }
        .into());
    }
    match tables.users.get_mut(&user.id) {
        Some(existing) => {
            *existing = user.clone();
            Ok(())
        }
        None => Err(UserError::UserNotFound {
            identifier: user.id.to_string(),
        }
        .into()),
    }
}

pub(crate) async fn delete_user(backend: &InMemory, id: &UserId) -> Result<Option<UserDeletion>> {
    let mut tables = backend.tables.write().await;
    if tables.users.remove(id).is_none() {
        return Ok(None);
    }

    let owned: Vec<DeckId> = tables
        .decks
        .values()
        .filter(|record| &record.owner == id)
        .map(|record| record.id.clone())
        .collect();
    let mut deletion = UserDeletion::default();
    for deck in &owned {
        deletion.cards += remove_deck(&mut tables, deck);
        deletion.decks += 1;
    }

    for shares in tables.shares.values_mut() {
        shares.remove(id);
    }
    for likes in tables.likes.values_mut() {
        likes.remove(id);
    }
    Ok(Some(deletion))
}

pub(crate) async fn insert_deck(backend: &InMemory, deck: &DeckRecord) -> Result<()> {
    let mut tables = backend.tables.write().await;
    require_user(&tables, &deck.owner)?;
    if deck.is_uncategorized()
        && tables
            .decks
            .values()
            .any(|existing| existing.owner == deck.owner && existing.is_uncategorized())
    {
        return Err(BackendError::UniqueViolation {
            constraint: UNCATEGORIZED_CONSTRAINT.to_string(),
        }
        .into());
    }
    tables.decks.insert(deck.id.clone(), deck.clone());
    Ok(())
}

pub(crate) async fn update_deck(
    backend: &InMemory,
    id: &DeckId,
    changes: &DeckUpdate,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<Deck> {
    let mut tables = backend.tables.write().await;
    check_guard(&tables, id, guard)?;
    let Some(record) = tables.decks.get_mut(id) else {
        return Err(BackendError::DeckMissing {
            deck_id: id.clone(),
        }
        .into());
    };
    if let Some(name) = &changes.name {
        record.name = name.clone();
    }
    if let Some(description) = &changes.description {
        record.description = description.clone();
    }
    if let Some(is_private) = changes.is_private {
        record.is_private = is_private;
    }
    record.date_updated = at;
    let record = record.clone();
    Ok(assemble_deck(&tables, &record))
}

pub(crate) async fn delete_deck(
    backend: &InMemory,
    id: &DeckId,
    guard: DeckGuard<'_>,
) -> Result<usize> {
    let mut tables = backend.tables.write().await;
    check_guard(&tables, id, guard)?;
    Ok(remove_deck(&mut tables, id))
}

pub(crate) async fn transfer_deck(
    backend: &InMemory,
    id: &DeckId,
    new_owner: &UserId,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<()> {
    let mut tables = backend.tables.write().await;
    check_guard(&tables, id, guard)?;
    require_user(&tables, new_owner)?;
    if let Some(record) = tables.decks.get_mut(id) {
        record.owner = new_owner.clone();
        record.date_updated = at;
    }
    if let Some(shares) = tables.shares.get_mut(id) {
        shares.remove(new_owner);
    }
    Ok(())
}

pub(crate) async fn upsert_share(
    backend: &InMemory,
    deck: &DeckId,
    share: &Share,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<()> {
    let mut tables = backend.tables.write().await;
    check_guard(&tables, deck, guard)?;
    require_user(&tables, &share.user)?;
    tables
        .shares
        .entry(deck.clone())
        .or_default()
        .insert(share.user.clone(), share.editable);
    touch(&mut tables, deck, at);
    Ok(())
}

pub(crate) async fn remove_share(
    backend: &InMemory,
    deck: &DeckId,
    user: &UserId,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<bool> {
    let mut tables = backend.tables.write().await;
    check_guard(&tables, deck, guard)?;
    let removed = tables
        .shares
        .get_mut(deck)
        .is_some_and(|shares| shares.remove(user).is_some());
    if removed {
        touch(&mut tables, deck, at);
    }
    Ok(removed)
}

pub(crate) async fn add_like(
    backend: &InMemory,
    deck: &DeckId,
    guard: DeckGuard<'_>,
) -> Result<bool> {
    let mut tables = backend.tables.write().await;
    require_user(&tables, guard.user)?;
    check_guard(&tables, deck, guard)?;
    Ok(tables
        .likes
        .entry(deck.clone())
        .or_default()
        .insert(guard.user.clone()))
}

pub(crate) async fn remove_like(
    backend: &InMemory,
    deck: &DeckId,
    guard: DeckGuard<'_>,
) -> Result<bool> {
    let mut tables = backend.tables.write().await;
    check_guard(&tables, deck, guard)?;
    Ok(tables
        .likes
        .get_mut(deck)
        .is_some_and(|likes| likes.remove(guard.user)))
}
