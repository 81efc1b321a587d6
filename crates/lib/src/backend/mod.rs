//! Backend implementations for Flashdeck storage
//!
//! This module provides the core `BackendImpl` trait and its implementations
//! (in-memory and SQL).
//!
//! Backends are deliberately thin: they persist users, decks, sharing entries,
//! likes and cards, and make each multi-row write atomic. All access decisions
//! and deck invariants live in the stores above them.
//!
//! ## Atomicity
//!
//! Every method is a single atomic unit. In particular:
//! - `delete_deck` removes the deck's cards, sharing entries, likes and the deck together;
//! - `transfer_deck` changes the owner and drops the new owner's sharing entry together;
//! - card writes update the card and touch the affected decks' `date_updated` together;
//! - `insert_deck` rejects a second Uncategorized deck for the same owner with
//!   [`BackendError::UniqueViolation`], and a deck whose owner is not registered;
//! - `delete_user` removes the user together with every deck they own;
//! - guarded writes check their [`DeckGuard`] against the deck as stored, in
//!   the same unit as the write;
//! - `add_like`/`remove_like` are insert-if-absent/delete-if-present on the
//!   `(deck, user)` pair.

use std::any::Any;

use async_trait::async_trait;

use crate::{
    CardId, DeckId, Result, UserId,
    auth::{self, Capability},
    clock::Timestamp,
    store::{Card, CardUpdate, Deck, DeckRecord, DeckUpdate, Share},
    user::{User, UserDeletion},
};

pub mod database;
pub mod errors;

pub use errors::BackendError;

/// Name of the constraint allowing one Uncategorized deck per owner.
pub const UNCATEGORIZED_CONSTRAINT: &str = "decks_one_uncategorized_per_owner";

/// The capability a deck write requires, re-checked by the backend against
/// the deck as stored at the moment of the write.
///
/// Stores check access on a snapshot first to report errors early. The guard
/// closes the window between that check and the write: if the deck changed
/// owner or the grant was revoked meanwhile, the write fails with
/// [`BackendError::AccessRevoked`] and nothing is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckGuard<'a> {
    pub user: &'a UserId,
    pub required: Capability,
}

impl<'a> DeckGuard<'a> {
    pub fn read(user: &'a UserId) -> Self {
        Self {
            user,
            required: Capability::Read,
        }
    }

    pub fn write(user: &'a UserId) -> Self {
        Self {
            user,
            required: Capability::Write,
        }
    }

    pub fn own(user: &'a UserId) -> Self {
        Self {
            user,
            required: Capability::Own,
        }
    }

    /// Whether `deck` grants the required capability to the guarded user.
    pub fn admits(&self, deck: &Deck) -> bool {
        match self.required {
            Capability::Read => auth::resolve_access(deck, Some(self.user)).readable,
            Capability::Write => auth::resolve_access(deck, Some(self.user)).writable,
            Capability::Own => auth::is_owner(deck, Some(self.user)),
        }
    }

    /// Fail with `AccessRevoked` unless `deck` admits the guarded user.
    pub(crate) fn check(&self, deck: &Deck) -> Result<()> {
        if self.admits(deck) {
            return Ok(());
        }
        Err(BackendError::AccessRevoked {
            deck_id: deck.id().clone(),
            user_id: self.user.clone(),
            required: self.required,
        }
        .into())
    }
}

/// Backend trait abstracting the underlying storage mechanism.
///
/// All backend implementations must be `Send` and `Sync` to allow sharing across
/// tasks, and implement `Any` to allow for downcasting if needed.
///
/// Guarded writes fail with [`BackendError::DeckMissing`] when the deck is gone
/// and [`BackendError::AccessRevoked`] when the guard no longer holds. Writes
/// that name another user fail with [`BackendError::UserMissing`] if that user
/// does not exist at the time of the write.
#[async_trait]
pub trait BackendImpl: Send + Sync + Any {
    // === Users ===

    /// Stores a new user. Fails with `UsernameAlreadyExists` if the username is taken.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Retrieves a user by id.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Retrieves a user by (already normalized) username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Overwrites an existing user's profile. Fails with `UserNotFound` if absent.
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Lists all users ordered by username.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Removes a user and everything that depends on them, in one atomic unit:
    /// every deck they own (Uncategorized included) with its cards, sharing
    /// entries and likes, their own sharing entries and likes on other decks,
    /// and the user record.
    ///
    /// Returns `None` if the user did not exist.
    async fn delete_user(&self, id: &UserId) -> Result<Option<UserDeletion>>;

    // === Decks ===

    /// Stores a new deck. Fails with `UserMissing` if the owner is not registered.
    async fn insert_deck(&self, deck: &DeckRecord) -> Result<()>;

    /// Retrieves a deck with its sharing list and likes.
    async fn get_deck(&self, id: &DeckId) -> Result<Option<Deck>>;

    /// Retrieves the Uncategorized deck of `owner`, if it exists.
    async fn find_uncategorized_deck(&self, owner: &UserId) -> Result<Option<Deck>>;

    /// Applies the provided fields of `changes` (already validated) and sets
    /// `date_updated` to `at`. Returns the deck as stored afterwards.
    async fn update_deck(
        &self,
        id: &DeckId,
        changes: &DeckUpdate,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<Deck>;

    /// Deletes a deck and everything attached to it.
    ///
    /// Returns the number of cards removed.
    async fn delete_deck(&self, id: &DeckId, guard: DeckGuard<'_>) -> Result<usize>;

    /// Lists decks owned by `user` or shared with them, of any kind, unordered.
    async fn list_decks_for(&self, user: &UserId) -> Result<Vec<DeckRecord>>;

    /// Lists decks owned by `user`, of any kind, unordered.
    async fn list_decks_owned_by(&self, user: &UserId) -> Result<Vec<DeckRecord>>;

    /// Counts all decks.
    async fn count_decks(&self) -> Result<usize>;

    /// Sets a new owner and removes that user's sharing entry, touching the deck.
    async fn transfer_deck(
        &self,
        id: &DeckId,
        new_owner: &UserId,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<()>;

    // === Sharing ===

    /// Inserts or replaces the sharing entry for `share.user`, touching the deck.
    async fn upsert_share(
        &self,
        deck: &DeckId,
        share: &Share,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<()>;

    /// Removes the sharing entry for `user`, touching the deck if one existed.
    ///
    /// Returns whether an entry was removed.
    async fn remove_share(
        &self,
        deck: &DeckId,
        user: &UserId,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<bool>;

    // === Likes ===

    /// Records that the guarded user likes `deck`. Returns false if it was already recorded.
    async fn add_like(&self, deck: &DeckId, guard: DeckGuard<'_>) -> Result<bool>;

    /// Removes the guarded user's like of `deck`. Returns false if there was none.
    async fn remove_like(&self, deck: &DeckId, guard: DeckGuard<'_>) -> Result<bool>;

    // === Cards ===

    /// Stores a new card and touches its deck at `card.date_created`.
    async fn insert_card(&self, card: &Card, guard: DeckGuard<'_>) -> Result<()>;

    /// Retrieves a card by id.
    async fn get_card(&self, id: &CardId) -> Result<Option<Card>>;

    /// Applies the provided fields of `changes` to a card and sets its
    /// `date_updated` to `at`. The guard must hold on the deck the card is
    /// stored in and, for a move, on the destination; both decks are touched.
    ///
    /// Returns the card as stored afterwards, or `None` if it does not exist.
    async fn update_card(
        &self,
        id: &CardId,
        changes: &CardUpdate,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<Option<Card>>;

    /// Deletes a card and touches its deck at `at`.
    ///
    /// Returns whether the card existed.
    async fn delete_card(&self, id: &CardId, at: Timestamp, guard: DeckGuard<'_>) -> Result<bool>;

    /// Lists the cards of a deck ordered by creation time, then id.
    async fn list_cards(&self, deck: &DeckId) -> Result<Vec<Card>>;

    /// Deletes cards whose deck no longer exists. Returns how many were removed.
    async fn delete_orphaned_cards(&self) -> Result<usize>;

    /// Returns a reference to the backend as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}
