//! Service layer composing the user directory and the deck and card stores.
//!
//! [`Library`] adds no authorization rules of its own. It resolves
//! human-facing user identifiers, delegates every decision to the stores, and
//! shapes the results into [`views`] projections.

use std::sync::Arc;

use handle_trait::Handle;

use crate::{
    CardId, Clock, DeckId, Result, SystemClock, UserId,
    auth,
    backend::BackendImpl,
    store::{CardStore, CardUpdate, Deck, DeckStore, DeckUpdate, DeckView, NewCard, NewDeck, StoreError},
    user::{User, UserDirectory, UserError},
};

pub mod views;

pub use crate::user::UserDeletion;
pub use views::{CardView, DeckDetail, DeckSummary, ShareView};

/// Internal state for Library
///
/// Library itself is just a cheap-to-clone handle wrapping `Arc<LibraryInternal>`.
pub(crate) struct LibraryInternal {
    backend: Arc<dyn BackendImpl>,
    clock: Arc<dyn Clock>,
    users: UserDirectory,
    decks: DeckStore,
    cards: CardStore,
}

impl std::fmt::Debug for LibraryInternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryInternal")
            .field("backend", &"<BackendImpl>")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Flashcard library on top of a storage backend.
///
/// Every operation takes the requesting user explicitly. Operations that only
/// read may be called anonymously (`None`), in which case only public decks
/// are visible.
///
/// Library is a cheap-to-clone handle around `Arc<LibraryInternal>`.
///
/// ## Example
///
/// ```
/// # use flashdeck::{backend::database::InMemory, Library, store::{NewCard, NewDeck}};
/// # #[tokio::main]
/// # async fn main() -> flashdeck::Result<()> {
/// let library = Library::open(Box::new(InMemory::new()));
///
/// let alice = library.register_user("alice", None).await?;
/// let bob = library.register_user("bob", Some("Bob")).await?;
///
/// let deck = library.create_deck(&alice.id, NewDeck::new("Biology").private(true)).await?;
/// library.create_card(&alice.id, NewCard::new("Powerhouse of the cell?", "Mitochondria").in_deck(deck.clone())).await?;
///
/// assert!(library.deck(Some(&bob.id), &deck).await.unwrap_err().is_forbidden());
/// library.share_deck(&alice.id, &deck, "bob", false).await?;
/// assert_eq!(library.cards_in_deck(Some(&bob.id), &deck).await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Handle)]
pub struct Library {
    inner: Arc<LibraryInternal>,
}

impl Library {
    /// Open a library over `backend` using the system clock.
    pub fn open(backend: Box<dyn BackendImpl>) -> Self {
        Self::open_impl(backend, Arc::new(SystemClock))
    }

    /// Open a library with a custom clock.
    ///
    /// Only available with the `testing` feature or in test builds.
    #[cfg(any(test, feature = "testing"))]
    pub fn open_with_clock(backend: Box<dyn BackendImpl>, clock: Arc<dyn Clock>) -> Self {
        Self::open_impl(backend, clock)
    }

    fn open_impl(backend: Box<dyn BackendImpl>, clock: Arc<dyn Clock>) -> Self {
        let backend: Arc<dyn BackendImpl> = Arc::from(backend);
        let users = UserDirectory::new(Arc::clone(&backend), Arc::clone(&clock));
        let decks = DeckStore::new(Arc::clone(&backend), Arc::clone(&clock));
        let cards = CardStore::new(Arc::clone(&backend), Arc::clone(&clock), decks.clone());
        Self {
            inner: Arc::new(LibraryInternal {
                backend,
                clock,
                users,
                decks,
                cards,
            }),
        }
    }

    /// The storage backend.
    pub fn backend(&self) -> &dyn BackendImpl {
        self.inner.backend.as_ref()
    }

    /// The clock used for timestamps.
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub fn users(&self) -> &UserDirectory {
        &self.inner.users
    }

    pub fn decks(&self) -> &DeckStore {
        &self.inner.decks
    }

    pub fn cards(&self) -> &CardStore {
        &self.inner.cards
    }

    // === Users ===

    /// Register a new user.
    pub async fn register_user(&self, username: &str, display_name: Option<&str>) -> Result<User> {
        self.inner.users.register(username, display_name).await
    }

    /// Look up a user by id or username.
    ///
    /// # Errors
    /// `UserNotFound` if the identifier matches nobody.
    pub async fn user(&self, identifier: &str) -> Result<User> {
        self.inner.users.resolve(identifier).await?.ok_or_else(|| {
            UserError::UserNotFound {
                identifier: identifier.to_string(),
            }
            .into()
        })
    }

    pub async fn update_display_name(&self, user: &UserId, display_name: &str) -> Result<User> {
        self.inner.users.update_display_name(user, display_name).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.inner.users.list().await
    }

    /// Delete a user and everything they own.
    ///
    /// Every deck the user owns, the Uncategorized deck included, is deleted
    /// with its cards. The user's sharing entries and likes on other decks are
    /// removed with the user record, all in one atomic backend write, so a
    /// concurrent card creation cannot leave a fresh Uncategorized deck behind.
    pub async fn delete_user(&self, user: &UserId) -> Result<UserDeletion> {
        self.inner.users.remove(user).await
    }

    /// Resolve a share or transfer target, failing with `InvalidTarget`.
    async fn resolve_target(&self, identifier: &str) -> Result<UserId> {
        match self.inner.users.resolve(identifier).await? {
            Some(user) => Ok(user.id),
            None => Err(StoreError::invalid_target(identifier, "user does not exist").into()),
        }
    }

    async fn ensure_user(&self, user: &UserId) -> Result<()> {
        self.inner.users.get(user).await.map(|_| ())
    }

    async fn detail(&self, view: DeckView, requester: Option<&UserId>) -> Result<DeckDetail> {
        let is_owner = auth::is_owner(&view.deck, requester);
        let shared_to = if is_owner {
            let mut shares = Vec::with_capacity(view.deck.shared_to.len());
            for share in &view.deck.shared_to {
                let username = self
                    .inner
                    .users
                    .find_by_id(&share.user)
                    .await?
                    .map(|user| user.username);
                shares.push(ShareView {
                    user: share.user.clone(),
                    username,
                    editable: share.editable,
                });
            }
            Some(shares)
        } else {
            None
        };
        Ok(DeckDetail::new(view, is_owner, shared_to))
    }

    fn view_of(deck: Deck, requester: &UserId) -> DeckView {
        let access = auth::resolve_access(&deck, Some(requester));
        let is_liked = deck.liked_by.contains(requester);
        DeckView {
            deck,
            access,
            is_liked,
        }
    }

    // === Decks ===

    pub async fn create_deck(&self, requester: &UserId, new: NewDeck) -> Result<DeckId> {
        self.ensure_user(requester).await?;
        self.inner.decks.create_deck(requester, new).await
    }

    /// Fetch one deck. Anonymous requesters see public decks only.
    pub async fn deck(&self, requester: Option<&UserId>, deck: &DeckId) -> Result<DeckDetail> {
        let view = self.inner.decks.get_deck(deck, requester).await?;
        self.detail(view, requester).await
    }

    /// Decks the requester owns or has been shared, most recently updated first.
    pub async fn decks_for(&self, requester: &UserId) -> Result<Vec<DeckSummary>> {
        Ok(self
            .inner
            .decks
            .list_decks_for(requester)
            .await?
            .into_iter()
            .map(|record| DeckSummary::new(record, requester))
            .collect())
    }

    /// The requester's Uncategorized deck, created on first use.
    pub async fn uncategorized_deck(&self, requester: &UserId) -> Result<DeckDetail> {
        self.ensure_user(requester).await?;
        let deck = self.inner.decks.get_or_create_uncategorized(requester).await?;
        self.detail(Self::view_of(deck, requester), Some(requester))
            .await
    }

    pub async fn update_deck(
        &self,
        requester: &UserId,
        deck: &DeckId,
        update: DeckUpdate,
    ) -> Result<DeckDetail> {
        let updated = self.inner.decks.update_deck(deck, requester, update).await?;
        self.detail(Self::view_of(updated, requester), Some(requester))
            .await
    }

    /// Delete a deck with its cards. Returns the number of cards removed.
    pub async fn delete_deck(&self, requester: &UserId, deck: &DeckId) -> Result<usize> {
        self.inner.decks.delete_deck(deck, requester).await
    }

    /// Share a deck with the user identified by `target` (id or username).
    pub async fn share_deck(
        &self,
        requester: &UserId,
        deck: &DeckId,
        target: &str,
        editable: bool,
    ) -> Result<()> {
        let target = self.resolve_target(target).await?;
        self.inner
            .decks
            .share_deck(deck, requester, &target, editable)
            .await
    }

    /// Revoke `target`'s grant on a deck. Returns whether a grant was removed.
    pub async fn unshare_deck(
        &self,
        requester: &UserId,
        deck: &DeckId,
        target: &str,
    ) -> Result<bool> {
        let target = self.resolve_target(target).await?;
        self.inner.decks.unshare_deck(deck, requester, &target).await
    }

    pub async fn like_deck(&self, requester: &UserId, deck: &DeckId) -> Result<bool> {
        self.inner.decks.like_deck(deck, requester).await
    }

    pub async fn unlike_deck(&self, requester: &UserId, deck: &DeckId) -> Result<bool> {
        self.inner.decks.unlike_deck(deck, requester).await
    }

    /// Transfer a deck to the user identified by `new_owner` (id or username).
    pub async fn change_owner(
        &self,
        requester: &UserId,
        deck: &DeckId,
        new_owner: &str,
    ) -> Result<()> {
        let new_owner = self.resolve_target(new_owner).await?;
        self.inner
            .decks
            .transfer_ownership(deck, requester, &new_owner)
            .await
    }

    // === Cards ===

    /// Create a card, in the requester's Uncategorized deck unless a deck is given.
    pub async fn create_card(&self, requester: &UserId, new: NewCard) -> Result<CardId> {
        self.ensure_user(requester).await?;
        self.inner.cards.create_card(requester, new).await
    }

    pub async fn card(&self, requester: Option<&UserId>, card: &CardId) -> Result<CardView> {
        self.inner
            .cards
            .get_card(card, requester)
            .await
            .map(CardView::from)
    }

    pub async fn cards_in_deck(
        &self,
        requester: Option<&UserId>,
        deck: &DeckId,
    ) -> Result<Vec<CardView>> {
        Ok(self
            .inner
            .cards
            .list_cards(deck, requester)
            .await?
            .into_iter()
            .map(CardView::from)
            .collect())
    }

    pub async fn update_card(
        &self,
        requester: &UserId,
        card: &CardId,
        update: CardUpdate,
    ) -> Result<CardView> {
        self.inner
            .cards
            .update_card(card, requester, update)
            .await
            .map(CardView::from)
    }

    /// Move a card to another deck. Needs write access on both decks.
    pub async fn move_card(
        &self,
        requester: &UserId,
        card: &CardId,
        destination: &DeckId,
    ) -> Result<CardView> {
        let update = CardUpdate {
            deck: Some(destination.clone()),
            ..Default::default()
        };
        self.update_card(requester, card, update).await
    }

    pub async fn delete_card(&self, requester: &UserId, card: &CardId) -> Result<()> {
        self.inner.cards.delete_card(card, requester).await
    }

    /// Remove cards left behind by an interrupted deck deletion.
    pub async fn purge_orphaned_cards(&self) -> Result<usize> {
        self.inner.cards.purge_orphans().await
    }
}
