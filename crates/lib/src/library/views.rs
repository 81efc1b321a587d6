//! Response projections returned by [`Library`](super::Library).
//!
//! These are what callers hand to the outside world. List views never expose
//! who a deck is shared with or who liked it; the sharing list appears only in
//! the owner's [`DeckDetail`].

use serde::Serialize;

use crate::{
    CardId, DeckId, UserId,
    clock::Timestamp,
    store::{Card, DeckRecord, DeckView},
};

/// A deck as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckSummary {
    pub id: DeckId,
    pub owner: UserId,
    pub name: String,
    pub description: String,
    pub is_private: bool,
    /// Whether the listing user owns the deck, as opposed to having it shared.
    pub is_owned: bool,
    pub date_created: Timestamp,
    pub date_updated: Timestamp,
}

impl DeckSummary {
    pub(crate) fn new(record: DeckRecord, viewer: &UserId) -> Self {
        Self {
            is_owned: &record.owner == viewer,
            id: record.id,
            owner: record.owner,
            name: record.name,
            description: record.description,
            is_private: record.is_private,
            date_created: record.date_created,
            date_updated: record.date_updated,
        }
    }
}

/// A sharing entry with the grantee's username resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareView {
    pub user: UserId,
    /// `None` if the user record no longer exists.
    pub username: Option<String>,
    pub editable: bool,
}

/// A single deck as seen by one requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckDetail {
    pub id: DeckId,
    pub owner: UserId,
    pub name: String,
    pub description: String,
    pub is_private: bool,
    pub is_uncategorized: bool,
    pub is_owner: bool,
    pub is_editable: bool,
    pub is_liked: bool,
    /// Likes excluding the requester's own.
    pub likes: usize,
    pub date_created: Timestamp,
    pub date_updated: Timestamp,
    /// Present only for the owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_to: Option<Vec<ShareView>>,
}

impl DeckDetail {
    pub(crate) fn new(view: DeckView, is_owner: bool, shared_to: Option<Vec<ShareView>>) -> Self {
        let likes = view.display_likes();
        let record = view.deck.record;
        Self {
            is_uncategorized: record.is_uncategorized(),
            id: record.id,
            owner: record.owner,
            name: record.name,
            description: record.description,
            is_private: record.is_private,
            is_owner,
            is_editable: view.access.writable,
            is_liked: view.is_liked,
            likes,
            date_created: record.date_created,
            date_updated: record.date_updated,
            shared_to,
        }
    }
}

/// A card as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: CardId,
    pub deck: DeckId,
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub date_created: Timestamp,
    pub date_updated: Timestamp,
}

impl From<Card> for CardView {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            deck: card.deck,
            question: card.question,
            answer: card.answer,
            hint: card.hint,
            date_created: card.date_created,
            date_updated: card.date_updated,
        }
    }
}
