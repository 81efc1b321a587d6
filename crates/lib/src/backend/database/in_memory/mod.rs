//! In-memory database backend implementation
//!
//! This module provides an in-memory implementation of the `BackendImpl` trait,
//! suitable for testing, development, or small deployments that snapshot their
//! state to a JSON file.

mod cards;
mod persistence;
mod storage;

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    CardId, DeckId, Result, UserId,
    backend::{BackendImpl, DeckGuard},
    clock::Timestamp,
    store::{Card, CardUpdate, Deck, DeckRecord, DeckUpdate, Share},
    user::{User, UserDeletion},
};

/// All tables of the in-memory backend.
///
/// Sharing entries and likes are keyed by deck, then by user, so each
/// `(deck, user)` pair can appear at most once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) decks: HashMap<DeckId, DeckRecord>,
    #[serde(default)]
    pub(crate) shares: HashMap<DeckId, BTreeMap<UserId, bool>>,
    #[serde(default)]
    pub(crate) likes: HashMap<DeckId, BTreeSet<UserId>>,
    #[serde(default)]
    pub(crate) cards: HashMap<CardId, Card>,
}

/// A simple in-memory backend.
///
/// Every table lives behind one lock, so each trait method observes and
/// mutates a consistent snapshot. Multi-row operations such as cascading deck
/// deletion or find-or-create of the Uncategorized deck cannot interleave.
///
/// It provides basic persistence via `save_to_file` and `load_from_file`,
/// serializing all tables to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) tables: RwLock<Tables>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves all tables to a specified file as JSON.
    ///
    /// # Arguments
    /// * `path` - The path to the file where the state should be saved.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads the backend state from a specified JSON file.
    ///
    /// If the file does not exist, a new, empty `InMemory` backend is returned.
    ///
    /// # Arguments
    /// * `path` - The path to the file from which to load the state.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl BackendImpl for InMemory {
    async fn insert_user(&self, user: &User) -> Result<()> {
        storage::insert_user(self, user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        storage::update_user(self, user).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn delete_user(&self, id: &UserId) -> Result<Option<UserDeletion>> {
        storage::delete_user(self, id).await
    }

    async fn insert_deck(&self, deck: &DeckRecord) -> Result<()> {
        storage::insert_deck(self, deck).await
    }

    async fn get_deck(&self, id: &DeckId) -> Result<Option<Deck>> {
        let tables = self.tables.read().await;
        Ok(tables
            .decks
            .get(id)
            .map(|record| storage::assemble_deck(&tables, record)))
    }

    async fn find_uncategorized_deck(&self, owner: &UserId) -> Result<Option<Deck>> {
        let tables = self.tables.read().await;
        Ok(tables
            .decks
            .values()
            .find(|record| &record.owner == owner && record.is_uncategorized())
            .map(|record| storage::assemble_deck(&tables, record)))
    }

    async fn update_deck(
        &self,
        id: &DeckId,
        changes: &DeckUpdate,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<Deck> {
        storage::update_deck(self, id, changes, at, guard).await
    }

    async fn delete_deck(&self, id: &DeckId, guard: DeckGuard<'_>) -> Result<usize> {
        storage::delete_deck(self, id, guard).await
    }

    async fn list_decks_for(&self, user: &UserId) -> Result<Vec<DeckRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .decks
            .values()
            .filter(|record| {
                &record.owner == user
                    || tables
                        .shares
                        .get(&record.id)
                        .is_some_and(|shares| shares.contains_key(user))
            })
            .cloned()
            .collect())
    }

    async fn list_decks_owned_by(&self, user: &UserId) -> Result<Vec<DeckRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .decks
            .values()
            .filter(|record| &record.owner == user)
            .cloned()
            .collect())
    }

    async fn count_decks(&self) -> Result<usize> {
        Ok(self.tables.read().await.decks.len())
    }

    async fn transfer_deck(
        &self,
        id: &DeckId,
        new_owner: &UserId,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<()> {
        storage::transfer_deck(self, id, new_owner, at, guard).await
    }

    async fn upsert_share(
        &self,
        deck: &DeckId,
        share: &Share,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<()> {
        storage::upsert_share(self, deck, share, at, guard).await
    }

    async fn remove_share(
        &self,
        deck: &DeckId,
        user: &UserId,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<bool> {
        storage::remove_share(self, deck, user, at, guard).await
    }

    async fn add_like(&self, deck: &DeckId, guard: DeckGuard<'_>) -> Result<bool> {
        storage::add_like(self, deck, guard).await
    }

    async fn remove_like(&self, deck: &DeckId, guard: DeckGuard<'_>) -> Result<bool> {
        storage::remove_like(self, deck, guard).await
    }

    async fn insert_card(&self, card: &Card, guard: DeckGuard<'_>) -> Result<()> {
        cards::insert_card(self, card, guard).await
    }

    async fn get_card(&self, id: &CardId) -> Result<Option<Card>> {
        Ok(self.tables.read().await.cards.get(id).cloned())
    }

    async fn update_card(
        &self,
        id: &CardId,
        changes: &CardUpdate,
        at: Timestamp,
        guard: DeckGuard<'_>,
    ) -> Result<Option<Card>> {
        cards::update_card(self, id, changes, at, guard).await
    }

    async fn delete_card(&self, id: &CardId, at: Timestamp, guard: DeckGuard<'_>) -> Result<bool> {
        cards::delete_card(self, id, at, guard).await
    }

    async fn list_cards(&self, deck: &DeckId) -> Result<Vec<Card>> {
        cards::list_cards(self, deck).await
    }

    async fn delete_orphaned_cards(&self) -> Result<usize> {
        cards::delete_orphaned_cards(self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
