//! Deck store: CRUD, sharing, likes and ownership transfer.

use std::sync::Arc;

use super::{
    Deck, DeckRecord, DeckUpdate, DeckView, NewDeck, Share, StoreError, errors::settle_write,
};
use crate::{
    Clock, DeckId, Error, Result, UserId,
    auth::{self, Capability},
    backend::{BackendError, BackendImpl, DeckGuard},
    constants::UNCATEGORIZED_DECK_NAME,
    user::UserError,
};

/// Trims a deck name and rejects empty or reserved names.
pub(crate) fn validate_deck_name(raw: &str) -> std::result::Result<String, StoreError> {
    let name = raw.trim();
    let invalid = |reason: &str| StoreError::InvalidName {
        name: raw.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name == UNCATEGORIZED_DECK_NAME {
        return Err(invalid("reserved for the Uncategorized deck"));
    }
    Ok(name.to_string())
}

/// Load a deck, failing with `DeckNotFound` if it does not exist.
pub(crate) async fn load_deck(backend: &dyn BackendImpl, id: &DeckId) -> Result<Deck> {
    backend.get_deck(id).await?.ok_or_else(|| {
        StoreError::DeckNotFound {
            deck_id: id.clone(),
        }
        .into()
    })
}

/// A write on behalf of a user that is not registered is `UserNotFound`.
fn user_missing(err: Error) -> Error {
    match err {
        Error::Backend(BackendError::UserMissing { user_id }) => UserError::UserNotFound {
            identifier: user_id.to_string(),
        }
        .into(),
        other => other,
    }
}

/// A share or transfer target deleted before the write is an invalid target.
fn target_missing(err: Error) -> Error {
    match err {
        Error::Backend(BackendError::UserMissing { user_id }) => {
            StoreError::invalid_target(user_id, "user does not exist").into()
        }
        other => settle_write(other),
    }
}

/// Owner of all deck state.
///
/// Every write is checked twice: against a snapshot, to report the precise
/// error early, and by the backend against the stored deck in the same atomic
/// unit as the write, so a concurrent transfer, unshare or deletion can never
/// be overtaken.
///
/// Content operations (`update_deck` on description) are gated on
/// `writable`; administrative ones (delete, rename, privacy change, sharing,
/// transfer) on exact ownership.
#[derive(Clone)]
pub struct DeckStore {
    backend: Arc<dyn BackendImpl>,
    clock: Arc<dyn Clock>,
}

impl DeckStore {
    pub fn new(backend: Arc<dyn BackendImpl>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Create a new, empty deck owned by `owner`.
    ///
    /// # Errors
    /// `InvalidName` if the name is empty or the reserved Uncategorized name.
    pub async fn create_deck(&self, owner: &UserId, new: NewDeck) -> Result<DeckId> {
        let name = validate_deck_name(&new.name)?;
        let now = self.clock.now();
        let record = DeckRecord {
            id: DeckId::generate(),
            owner: owner.clone(),
            name,
            description: new.description,
            kind: Default::default(),
            is_private: new.is_private,
            date_created: now,
            date_updated: now,
        };
        self.backend
            .insert_deck(&record)
            .await
            .map_err(user_missing)?;

        tracing::info!(deck_id = %record.id, owner = %owner, "Created deck");
        Ok(record.id)
    }

    /// Find the owner's Uncategorized deck, creating it on first use.
    ///
    /// Safe under concurrent first use: the backend admits a single
    /// Uncategorized deck per owner, and a losing creator returns the winner's.
    pub async fn get_or_create_uncategorized(&self, owner: &UserId) -> Result<Deck> {
        if let Some(deck) = self.backend.find_uncategorized_deck(owner).await? {
            return Ok(deck);
        }

        let record = DeckRecord::uncategorized(owner.clone(), self.clock.now());
        match self.backend.insert_deck(&record).await {
            Ok(()) => {
                tracing::info!(deck_id = %record.id, owner = %owner, "Created Uncategorized deck");
                Ok(Deck {
                    record,
                    shared_to: Vec::new(),
                    liked_by: Default::default(),
                })
            }
            Err(Error::Backend(err)) if err.is_conflict() => {
                tracing::warn!(owner = %owner, "Lost Uncategorized deck creation race, re-reading");
                self.backend
                    .find_uncategorized_deck(owner)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Conflict {
                            reason: format!(
                                "Uncategorized deck for {owner} vanished after a creation conflict"
                            ),
                        }
                        .into()
                    })
            }
            Err(err) => Err(user_missing(err)),
        }
    }

    /// Fetch a deck as seen by `requester`.
    ///
    /// # Errors
    /// `DeckNotFound` if absent, `Forbidden` unless readable.
    pub async fn get_deck(&self, id: &DeckId, requester: Option<&UserId>) -> Result<DeckView> {
        let deck = load_deck(self.backend.as_ref(), id).await?;
        let access = auth::require_readable(&deck, requester)?;
        let is_liked = requester.is_some_and(|user| deck.liked_by.contains(user));
        tracing::debug!(deck_id = %id, ?access, "Fetched deck");
        Ok(DeckView {
            deck,
            access,
            is_liked,
        })
    }

    /// Decks owned by or shared with `user`, without the Uncategorized deck.
    ///
    /// Most recently updated first, ties broken by name. Public decks of other
    /// users are not listed.
    pub async fn list_decks_for(&self, user: &UserId) -> Result<Vec<DeckRecord>> {
        let mut decks: Vec<DeckRecord> = self
            .backend
            .list_decks_for(user)
            .await?
            .into_iter()
            .filter(|deck| !deck.is_uncategorized())
            .collect();
        decks.sort_by(|a, b| {
            b.date_updated
                .cmp(&a.date_updated)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(decks)
    }

    /// All decks owned by `user`, including the Uncategorized deck.
    pub async fn decks_owned_by(&self, user: &UserId) -> Result<Vec<DeckRecord>> {
        self.backend.list_decks_owned_by(user).await
    }

    /// Apply a partial update to a deck.
    ///
    /// Editing the description needs `writable`. Renaming or changing the
    /// privacy flag needs ownership. The Uncategorized deck can be neither
    /// renamed nor made public.
    pub async fn update_deck(
        &self,
        id: &DeckId,
        requester: &UserId,
        update: DeckUpdate,
    ) -> Result<Deck> {
        let deck = load_deck(self.backend.as_ref(), id).await?;
        auth::require_writable(&deck, Some(requester))?;

        if deck.is_uncategorized() {
            if update.name.is_some() {
                return Err(StoreError::invalid_operation(
                    "rename",
                    "the Uncategorized deck cannot be renamed",
                )
                .into());
            }
            if update.is_private == Some(false) {
                return Err(StoreError::invalid_operation(
                    "publish",
                    "the Uncategorized deck is always private",
                )
                .into());
            }
        }

        // Fields equal to the snapshot are dropped, so a description edit by
        // an editor never rewrites name or privacy.
        let renamed = update
            .name
            .filter(|name| name.trim() != deck.record.name);
        let privacy = update
            .is_private
            .filter(|private| *private != deck.is_private());
        let administrative = renamed.is_some() || privacy.is_some();
        if administrative && !auth::is_owner(&deck, Some(requester)) {
            tracing::debug!(deck_id = %id, user_id = %requester, "Non-owner tried to rename or change privacy");
            return Err(StoreError::Forbidden {
                deck_id: id.clone(),
                required: Capability::Own,
            }
            .into());
        }
        let changes = DeckUpdate {
            name: renamed.as_deref().map(validate_deck_name).transpose()?,
            description: update.description,
            is_private: privacy,
        };
        let guard = if administrative {
            DeckGuard::own(requester)
        } else {
            DeckGuard::write(requester)
        };

        let updated = self
            .backend
            .update_deck(id, &changes, self.clock.now(), guard)
            .await
            .map_err(settle_write)?;

        tracing::info!(deck_id = %id, user_id = %requester, "Updated deck");
        Ok(updated)
    }

    /// Delete a deck and every card in it. Returns the number of cards removed.
    ///
    /// # Errors
    /// `Forbidden` unless owner, `InvalidOperation` for the Uncategorized deck.
    pub async fn delete_deck(&self, id: &DeckId, requester: &UserId) -> Result<usize> {
        let deck = load_deck(self.backend.as_ref(), id).await?;
        auth::require_owner(&deck, Some(requester))?;
        if deck.is_uncategorized() {
            return Err(StoreError::invalid_operation(
                "delete",
                "the Uncategorized deck cannot be deleted",
            )
            .into());
        }

        let cards = self
            .backend
            .delete_deck(id, DeckGuard::own(requester))
            .await
            .map_err(settle_write)?;
        tracing::info!(deck_id = %id, cards, "Deleted deck");
        Ok(cards)
    }

    /// Grant `target` access to a deck, or change the `editable` flag of an
    /// existing grant.
    ///
    /// # Errors
    /// `Forbidden` unless owner, `InvalidOperation` for the Uncategorized deck,
    /// `InvalidTarget` if the target is the owner or does not exist.
    pub async fn share_deck(
        &self,
        id: &DeckId,
        requester: &UserId,
        target: &UserId,
        editable: bool,
    ) -> Result<()> {
        let deck = load_deck(self.backend.as_ref(), id).await?;
        auth::require_owner(&deck, Some(requester))?;
        if deck.is_uncategorized() {
            return Err(StoreError::invalid_operation(
                "share",
                "the Uncategorized deck cannot be shared",
            )
            .into());
        }
        if target == deck.owner() {
            return Err(
                StoreError::invalid_target(target, "a deck cannot be shared with its owner").into(),
            );
        }
        if self.backend.get_user(target).await?.is_none() {
            return Err(StoreError::invalid_target(target, "user does not exist").into());
        }

        if deck
            .share_for(target)
            .is_some_and(|share| share.editable == editable)
        {
            tracing::debug!(deck_id = %id, target = %target, "Share unchanged");
            return Ok(());
        }

        let share = Share {
            user: target.clone(),
            editable,
        };
        self.backend
            .upsert_share(id, &share, self.clock.now(), DeckGuard::own(requester))
            .await
            .map_err(target_missing)?;

        tracing::info!(deck_id = %id, target = %target, editable, "Shared deck");
        Ok(())
    }

    /// Remove `target`'s grant on a deck. Returns whether an entry was removed;
    /// removing an absent entry succeeds.
    pub async fn unshare_deck(
        &self,
        id: &DeckId,
        requester: &UserId,
        target: &UserId,
    ) -> Result<bool> {
        let deck = load_deck(self.backend.as_ref(), id).await?;
        auth::require_owner(&deck, Some(requester))?;
        if target == deck.owner() {
            return Err(StoreError::invalid_target(target, "the owner cannot be unshared").into());
        }

        let removed = self
            .backend
            .remove_share(id, target, self.clock.now(), DeckGuard::own(requester))
            .await
            .map_err(settle_write)?;
        if removed {
            tracing::info!(deck_id = %id, target = %target, "Unshared deck");
        }
        Ok(removed)
    }

    /// Hand a deck over to `new_owner`.
    ///
    /// The new owner's sharing entry, if any, is dropped in the same write.
    /// The previous owner keeps no access beyond what the deck's privacy allows.
    pub async fn transfer_ownership(
        &self,
        id: &DeckId,
        requester: &UserId,
        new_owner: &UserId,
    ) -> Result<()> {
        let deck = load_deck(self.backend.as_ref(), id).await?;
        auth::require_owner(&deck, Some(requester))?;
        if deck.is_uncategorized() {
            return Err(StoreError::invalid_target(
                deck.id(),
                "the Uncategorized deck cannot change owner",
            )
            .into());
        }
        if new_owner == deck.owner() {
            return Err(
                StoreError::invalid_target(new_owner, "already the owner of this deck").into(),
            );
        }
        if self.backend.get_user(new_owner).await?.is_none() {
            return Err(StoreError::invalid_target(new_owner, "user does not exist").into());
        }

        self.backend
            .transfer_deck(id, new_owner, self.clock.now(), DeckGuard::own(requester))
            .await
            .map_err(target_missing)?;

        tracing::info!(deck_id = %id, from = %requester, to = %new_owner, "Transferred deck");
        Ok(())
    }

    /// Like a readable deck. Returns false if it was already liked.
    pub async fn like_deck(&self, id: &DeckId, user: &UserId) -> Result<bool> {
        let deck = load_deck(self.backend.as_ref(), id).await?;
        auth::require_readable(&deck, Some(user))?;
        let changed = self
            .backend
            .add_like(id, DeckGuard::read(user))
            .await
            .map_err(user_missing)
            .map_err(settle_write)?;
        tracing::debug!(deck_id = %id, user_id = %user, changed, "Liked deck");
        Ok(changed)
    }

    /// Remove a like from a readable deck. Returns false if it was not liked.
    pub async fn unlike_deck(&self, id: &DeckId, user: &UserId) -> Result<bool> {
        let deck = load_deck(self.backend.as_ref(), id).await?;
        auth::require_readable(&deck, Some(user))?;
        let changed = self
            .backend
            .remove_like(id, DeckGuard::read(user))
            .await
            .map_err(settle_write)?;
        tracing::debug!(deck_id = %id, user_id = %user, changed, "Unliked deck");
        Ok(changed)
    }
}
