//! Capability resolution for decks
//!
//! This module decides, for a deck and a requesting user, whether the user may
//! read or modify it. It performs no I/O and never mutates anything.
//!
//! Resolution order is fixed:
//! 1. the owner can always read and write;
//! 2. an explicit sharing entry grants read, and write if it is editable;
//! 3. a public deck grants read;
//! 4. otherwise nothing.
//!
//! An explicit entry is authoritative: a non-editable share on a public deck
//! still yields `writable == false`. Administrative operations (delete, rename,
//! privacy change, share management, ownership transfer) are not covered by
//! `writable` at all and must use [`require_owner`].

use serde::Serialize;

use crate::{UserId, store::Deck, store::StoreError};

/// The capability an operation needs on a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    Read,
    Write,
    Own,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Capability::Read => "Read",
            Capability::Write => "Write",
            Capability::Own => "Owner",
        })
    }
}

/// Readable/writable capability pair of one user on one deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Access {
    pub readable: bool,
    pub writable: bool,
}

impl Access {
    /// Full access.
    pub const OWNER: Access = Access {
        readable: true,
        writable: true,
    };

    /// Read-only access.
    pub const READ_ONLY: Access = Access {
        readable: true,
        writable: false,
    };

    /// No access.
    pub const NONE: Access = Access {
        readable: false,
        writable: false,
    };
}

/// Resolve the capabilities of `requester` on `deck`.
///
/// `None` is an unauthenticated requester, which can only ever get the public
/// read fallback.
///
/// # Examples
/// ```
/// use flashdeck::auth::{Access, resolve_access};
/// use flashdeck::store::{Deck, DeckKind, DeckRecord, Share};
/// use flashdeck::{DeckId, UserId};
///
/// let owner = UserId::new("alice");
/// let reader = UserId::new("bob");
/// let deck = Deck {
///     record: DeckRecord {
///         id: DeckId::new("biology"),
///         owner: owner.clone(),
///         name: "Biology".to_string(),
///         description: String::new(),
///         kind: DeckKind::Normal,
///         is_private: false,
///         date_created: 0,
///         date_updated: 0,
///     },
///     shared_to: vec![Share { user: reader.clone(), editable: false }],
///     liked_by: Default::default(),
/// };
///
/// assert_eq!(resolve_access(&deck, Some(&owner)), Access::OWNER);
/// assert_eq!(resolve_access(&deck, Some(&reader)), Access::READ_ONLY);
/// assert_eq!(resolve_access(&deck, None), Access::READ_ONLY);
/// ```
pub fn resolve_access(deck: &Deck, requester: Option<&UserId>) -> Access {
    if let Some(user) = requester {
        if user == deck.owner() {
            return Access::OWNER;
        }
        if let Some(share) = deck.share_for(user) {
            return Access {
                readable: true,
                writable: share.editable,
            };
        }
    }

    if !deck.is_private() {
        return Access::READ_ONLY;
    }

    Access::NONE
}

/// Whether `requester` is exactly the deck's owner.
pub fn is_owner(deck: &Deck, requester: Option<&UserId>) -> bool {
    requester.is_some_and(|user| user == deck.owner())
}

fn forbidden(deck: &Deck, required: Capability) -> StoreError {
    tracing::debug!(deck_id = %deck.id(), %required, "Access denied");
    StoreError::Forbidden {
        deck_id: deck.id().clone(),
        required,
    }
}

/// Fail with `Forbidden` unless `requester` may read `deck`.
pub fn require_readable(deck: &Deck, requester: Option<&UserId>) -> Result<Access, StoreError> {
    let access = resolve_access(deck, requester);
    if access.readable {
        Ok(access)
    } else {
        Err(forbidden(deck, Capability::Read))
    }
}

/// Fail with `Forbidden` unless `requester` may modify `deck`'s contents.
pub fn require_writable(deck: &Deck, requester: Option<&UserId>) -> Result<Access, StoreError> {
    let access = resolve_access(deck, requester);
    if access.writable {
        Ok(access)
    } else {
        Err(forbidden(deck, Capability::Write))
    }
}

/// Fail with `Forbidden` unless `requester` owns `deck`.
pub fn require_owner(deck: &Deck, requester: Option<&UserId>) -> Result<(), StoreError> {
    if is_owner(deck, requester) {
        Ok(())
    } else {
        Err(forbidden(deck, Capability::Own))
    }
}
