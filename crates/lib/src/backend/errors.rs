//! Storage error types for the Flashdeck backends.
//!
//! These cover failures of the persistence layer itself, plus the three
//! outcomes of a write whose preconditions no longer hold when it is applied
//! (a vanished deck or user, a revoked grant). The stores translate those
//! into their own domain errors.

use thiserror::Error;

use crate::{DeckId, UserId, auth::Capability};

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint
        constraint: String,
    },

    /// A stored value could not be interpreted.
    #[error("Corrupt stored value in {table}: {reason}")]
    CorruptValue {
        /// Table holding the value
        table: String,
        /// What was wrong with it
        reason: String,
    },

    /// The deck a write targets does not exist at the time of the write.
    #[error("Deck not found at write time: {deck_id}")]
    DeckMissing {
        /// The missing deck
        deck_id: DeckId,
    },

    /// A user the write refers to does not exist at the time of the write.
    #[error("User not found at write time: {user_id}")]
    UserMissing {
        /// The missing user
        user_id: UserId,
    },

    /// The guard of a write no longer holds on the deck as stored.
    #[error("User {user_id} lost {required} access to deck {deck_id}")]
    AccessRevoked {
        /// The deck the write targets
        deck_id: DeckId,
        /// The user the write is performed for
        user_id: UserId,
        /// The capability the write required
        required: Capability,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// SQL backend error.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Context describing the failed statement
        reason: String,
        /// The underlying sqlx error
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error is a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackendError::UniqueViolation { .. })
    }

    /// Check if this error reports a deck or user that vanished before the write.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            BackendError::DeckMissing { .. } | BackendError::UserMissing { .. }
        )
    }

    /// Check if this error reports a guard that no longer held at write time.
    pub fn is_access_revoked(&self) -> bool {
        matches!(self, BackendError::AccessRevoked { .. })
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(self, BackendError::FileIo { .. })
    }

    /// Check if this error indicates stored data could not be read back.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            BackendError::CorruptValue { .. } | BackendError::DeserializationFailed { .. }
        )
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
