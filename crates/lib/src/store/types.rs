//! Deck and card entity types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    CardId, DeckId, UserId,
    auth::Access,
    clock::Timestamp,
    constants::UNCATEGORIZED_DECK_NAME,
};

/// Distinguishes the per-user Uncategorized deck from ordinary decks.
///
/// Storage enforces at most one `Uncategorized` deck per owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckKind {
    #[default]
    Normal,
    Uncategorized,
}

impl DeckKind {
    /// Stable string form used by SQL backends.
    pub fn as_str(self) -> &'static str {
        match self {
            DeckKind::Normal => "normal",
            DeckKind::Uncategorized => "uncategorized",
        }
    }

    /// Parse the string form produced by [`DeckKind::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(DeckKind::Normal),
            "uncategorized" => Some(DeckKind::Uncategorized),
            _ => None,
        }
    }
}

/// The persisted columns of a deck, without its sharing list and likes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckRecord {
    pub id: DeckId,
    pub owner: UserId,
    pub name: String,
    pub description: String,
    pub kind: DeckKind,
    pub is_private: bool,
    pub date_created: Timestamp,
    pub date_updated: Timestamp,
}

impl DeckRecord {
    /// Whether this is its owner's Uncategorized deck.
    pub fn is_uncategorized(&self) -> bool {
        self.kind == DeckKind::Uncategorized
    }

    /// The Uncategorized deck for `owner`, created at `now`.
    pub(crate) fn uncategorized(owner: UserId, now: Timestamp) -> Self {
        Self {
            id: DeckId::generate(),
            owner,
            name: UNCATEGORIZED_DECK_NAME.to_string(),
            description: String::new(),
            kind: DeckKind::Uncategorized,
            is_private: true,
            date_created: now,
            date_updated: now,
        }
    }
}

/// A per-user grant on a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub user: UserId,
    pub editable: bool,
}

/// A deck with its sharing list and the set of users who liked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    #[serde(flatten)]
    pub record: DeckRecord,
    pub shared_to: Vec<Share>,
    pub liked_by: BTreeSet<UserId>,
}

impl Deck {
    pub fn id(&self) -> &DeckId {
        &self.record.id
    }

    pub fn owner(&self) -> &UserId {
        &self.record.owner
    }

    pub fn is_private(&self) -> bool {
        self.record.is_private
    }

    pub fn is_uncategorized(&self) -> bool {
        self.record.is_uncategorized()
    }

    /// Number of likes, always equal to the size of the liked-by set.
    pub fn likes(&self) -> usize {
        self.liked_by.len()
    }

    /// The explicit sharing entry for `user`, if any.
    pub fn share_for(&self, user: &UserId) -> Option<&Share> {
        self.shared_to.iter().find(|share| &share.user == user)
    }
}

/// A deck as seen by one requester.
#[derive(Debug, Clone)]
pub struct DeckView {
    pub deck: Deck,
    pub access: Access,
    pub is_liked: bool,
}

impl DeckView {
    /// Like count presented to the requester, excluding their own like.
    pub fn display_likes(&self) -> usize {
        self.deck.likes() - usize::from(self.is_liked)
    }
}

/// A single question/answer unit belonging to exactly one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub deck: DeckId,
    pub question: String,
    pub answer: String,
    pub hint: Option<String>,
    pub date_created: Timestamp,
    pub date_updated: Timestamp,
}

/// Input for creating a deck.
#[derive(Debug, Clone, Default)]
pub struct NewDeck {
    pub name: String,
    pub description: String,
    pub is_private: bool,
}

impl NewDeck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }
}

/// Partial update of a deck; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct DeckUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_private: Option<bool>,
}

/// Input for creating a card. Without a deck the card goes to the creator's
/// Uncategorized deck.
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub question: String,
    pub answer: String,
    pub hint: Option<String>,
    pub deck: Option<DeckId>,
}

impl NewCard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            ..Default::default()
        }
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn in_deck(mut self, deck: DeckId) -> Self {
        self.deck = Some(deck);
        self
    }
}

/// Partial update of a card; `None` fields are left unchanged.
///
/// `hint: Some(None)` clears the hint. Setting `deck` moves the card.
#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub hint: Option<Option<String>>,
    pub deck: Option<DeckId>,
}
