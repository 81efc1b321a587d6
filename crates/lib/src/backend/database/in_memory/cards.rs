//! Card operations for the InMemory backend
//!
//! Every card write touches the affected decks under the same lock.

use super::{
    InMemory,
    storage::{check_guard, touch},
};
use crate::{
    CardId, DeckId, Result,
    backend::DeckGuard,
    clock::Timestamp,
    store::{Card, CardUpdate},
};

pub(crate) async fn insert_card(backend: &InMemory, card: &Card, guard: DeckGuard<'_>) -> Result<()> {
    let mut tables = backend.tables.write().await;
    check_guard(&tables, &card.deck, guard)?;
    tables.cards.insert(card.id.clone(), card.clone());
    touch(&mut tables, &card.deck, card.date_created);
    Ok(())
}

pub(crate) async fn update_card(
    backend: &InMemory,
    id: &CardId,
    changes: &CardUpdate,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<Option<Card>> {
    let mut tables = backend.tables.write().await;
    let Some(current) = tables.cards.get(id) else {
        return Ok(None);
    };
    let previous_deck = current.deck.clone();
    check_guard(&tables, &previous_deck, guard)?;
    if let Some(destination) = &changes.deck
        && destination != &previous_deck
    {
        check_guard(&tables, destination, guard)?;
    }

    let Some(card) = tables.cards.get_mut(id) else {
        return Ok(None);
    };
    if let Some(question) = &changes.question {
        card.question = question.clone();
    }
    if let Some(answer) = &changes.answer {
        card.answer = answer.clone();
    }
    if let Some(hint) = &changes.hint {
        card.hint = hint.clone();
    }
    if let Some(destination) = &changes.deck {
        card.deck = destination.clone();
    }
    card.date_updated = at;
    let card = card.clone();

    touch(&mut tables, &previous_deck, at);
    touch(&mut tables, &card.deck, at);
    Ok(Some(card))
}

pub(crate) async fn delete_card(
    backend: &InMemory,
    id: &CardId,
    at: Timestamp,
    guard: DeckGuard<'_>,
) -> Result<bool> {
    let mut tables = backend.tables.write().await;
    let Some(deck) = tables.cards.get(id).map(|card| card.deck.clone()) else {
        return Ok(false);
    };
    check_guard(&tables, &deck, guard)?;
    tables.cards.remove(id);
    touch(&mut tables, &deck, at);
    Ok(true)
}

pub(crate) async fn list_cards(backend: &InMemory, deck: &DeckId) -> Result<Vec<Card>> {
    let tables = backend.tables.read().await;
    let mut cards: Vec<Card> = tables
        .cards
        .values()
        .filter(|card| &card.deck == deck)
        .cloned()
        .collect();
    cards.sort_by(|a, b| {
        a.date_created
            .cmp(&b.date_created)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(cards)
}

pub(crate) async fn delete_orphaned_cards(backend: &InMemory) -> Result<usize> {
    let mut tables = backend.tables.write().await;
    let tables = &mut *tables;
    let before = tables.cards.len();
    let decks = &tables.decks;
    tables.cards.retain(|_, card| decks.contains_key(&card.deck));
    Ok(before - tables.cards.len())
}
