//! Card store. Cards are authorized through their owning deck.

use std::sync::Arc;

use super::{
    Card, CardUpdate, Deck, DeckStore, NewCard, StoreError, deck::load_deck, errors::settle_write,
};
use crate::{
    CardId, Clock, DeckId, Error, Result, UserId, auth,
    backend::{BackendError, BackendImpl, DeckGuard},
};

/// Blank hints are stored as no hint.
fn normalize_hint(hint: Option<String>) -> Option<String> {
    hint.filter(|h| !h.trim().is_empty())
}

/// A card whose own deck vanished before the write is reported as
/// `CardNotFound`, like one whose deck was already gone at load time.
fn card_orphaned(card_id: &CardId, deck_id: &DeckId, err: Error) -> Error {
    match err {
        Error::Backend(BackendError::DeckMissing { deck_id: missing }) if &missing == deck_id => {
            StoreError::CardNotFound {
                card_id: card_id.clone(),
            }
            .into()
        }
        other => settle_write(other),
    }
}

/// Owner of all card state.
#[derive(Clone)]
pub struct CardStore {
    backend: Arc<dyn BackendImpl>,
    clock: Arc<dyn Clock>,
    decks: DeckStore,
}

impl CardStore {
    pub fn new(backend: Arc<dyn BackendImpl>, clock: Arc<dyn Clock>, decks: DeckStore) -> Self {
        Self {
            backend,
            clock,
            decks,
        }
    }

    /// Load a card and its owning deck.
    ///
    /// A card whose deck has disappeared is reported as `CardNotFound`.
    async fn load(&self, id: &CardId) -> Result<(Card, Deck)> {
        let not_found = || StoreError::CardNotFound {
            card_id: id.clone(),
        };
        let card = self.backend.get_card(id).await?.ok_or_else(not_found)?;
        let Some(deck) = self.backend.get_deck(&card.deck).await? else {
            tracing::debug!(card_id = %id, deck_id = %card.deck, "Card belongs to a missing deck");
            return Err(not_found().into());
        };
        Ok((card, deck))
    }

    /// Create a card.
    ///
    /// Without a deck the card goes to the requester's Uncategorized deck,
    /// which is created on first use.
    ///
    /// # Errors
    /// `DeckNotFound` for a missing target deck, `Forbidden` unless writable.
    pub async fn create_card(&self, requester: &UserId, new: NewCard) -> Result<CardId> {
        let deck = match new.deck {
            Some(ref id) => load_deck(self.backend.as_ref(), id).await?,
            None => self.decks.get_or_create_uncategorized(requester).await?,
        };
        auth::require_writable(&deck, Some(requester))?;

        let now = self.clock.now();
        let card = Card {
            id: CardId::generate(),
            deck: deck.id().clone(),
            question: new.question,
            answer: new.answer,
            hint: normalize_hint(new.hint),
            date_created: now,
            date_updated: now,
        };
        self.backend
            .insert_card(&card, DeckGuard::write(requester))
            .await
            .map_err(settle_write)?;

        tracing::info!(card_id = %card.id, deck_id = %card.deck, user_id = %requester, "Created card");
        Ok(card.id)
    }

    /// Fetch a card readable by `requester`.
    pub async fn get_card(&self, id: &CardId, requester: Option<&UserId>) -> Result<Card> {
        let (card, deck) = self.load(id).await?;
        auth::require_readable(&deck, requester)?;
        Ok(card)
    }

    /// Apply a partial update to a card.
    ///
    /// Moving the card to another deck needs write access on both decks and
    /// touches both.
    pub async fn update_card(
        &self,
        id: &CardId,
        requester: &UserId,
        update: CardUpdate,
    ) -> Result<Card> {
        let (card, deck) = self.load(id).await?;
        auth::require_writable(&deck, Some(requester))?;

        if let Some(ref destination) = update.deck
            && destination != deck.id()
        {
            let target = load_deck(self.backend.as_ref(), destination).await?;
            auth::require_writable(&target, Some(requester))?;
        }

        let changes = CardUpdate {
            hint: update.hint.map(normalize_hint),
            ..update
        };
        let updated = self
            .backend
            .update_card(id, &changes, self.clock.now(), DeckGuard::write(requester))
            .await
            .map_err(|err| card_orphaned(id, &card.deck, err))?
            .ok_or_else(|| StoreError::CardNotFound {
                card_id: id.clone(),
            })?;

        if updated.deck != card.deck {
            tracing::info!(card_id = %id, from = %card.deck, to = %updated.deck, "Moved card");
        } else {
            tracing::debug!(card_id = %id, "Updated card");
        }
        Ok(updated)
    }

    /// Delete a card, touching its deck.
    pub async fn delete_card(&self, id: &CardId, requester: &UserId) -> Result<()> {
        let (_, deck) = self.load(id).await?;
        auth::require_writable(&deck, Some(requester))?;

        let deleted = self
            .backend
            .delete_card(id, self.clock.now(), DeckGuard::write(requester))
            .await
            .map_err(|err| card_orphaned(id, deck.id(), err))?;
        if !deleted {
            return Err(StoreError::CardNotFound { card_id: id.clone() }.into());
        }
        tracing::info!(card_id = %id, deck_id = %deck.id(), "Deleted card");
        Ok(())
    }

    /// Cards of a readable deck, oldest first.
    pub async fn list_cards(&self, deck: &DeckId, requester: Option<&UserId>) -> Result<Vec<Card>> {
        let loaded = load_deck(self.backend.as_ref(), deck).await?;
        auth::require_readable(&loaded, requester)?;
        self.backend.list_cards(deck).await
    }

    /// Delete cards whose deck no longer exists. Returns how many were removed.
    ///
    /// Cleans up cards left behind by storage edited outside this library, such
    /// as a hand-edited snapshot file.
    pub async fn purge_orphans(&self) -> Result<usize> {
        let removed = self.backend.delete_orphaned_cards().await?;
        if removed > 0 {
            tracing::warn!(removed, "Purged orphaned cards");
        }
        Ok(removed)
    }
}
