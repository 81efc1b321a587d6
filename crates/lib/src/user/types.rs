//! Core data types for the user directory

use serde::{Deserialize, Serialize};

use crate::{UserId, clock::Timestamp};

/// Identity record of a registered user.
///
/// Credentials live outside this library; the directory only needs enough to
/// turn a human-facing username into the opaque id the access policy compares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier
    pub id: UserId,

    /// Unique, lowercase login name
    pub username: String,

    /// Name shown to other users
    pub display_name: String,

    /// Registration time
    pub created_at: Timestamp,
}

/// What was removed along with a deleted user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UserDeletion {
    /// Decks owned by the user that were deleted, including the Uncategorized deck.
    pub decks: usize,
    /// Cards removed along with those decks.
    pub cards: usize,
}
