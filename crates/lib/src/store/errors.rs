//! Error types for deck and card store operations.
//!
//! These are the error kinds the stores surface directly, so that callers can map
//! them to user-facing responses without re-inspecting internal state.

use thiserror::Error;

use crate::{CardId, DeckId, ErrorKind, auth::Capability, backend::BackendError};

/// Errors that can occur during deck and card operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The deck does not exist.
    #[error("Deck not found: {deck_id}")]
    DeckNotFound { deck_id: DeckId },

    /// The card does not exist, or its owning deck no longer does.
    #[error("Card not found: {card_id}")]
    CardNotFound { card_id: CardId },

    /// The requester lacks the capability this operation needs on the deck.
    #[error("{required} access to deck {deck_id} denied")]
    Forbidden {
        deck_id: DeckId,
        required: Capability,
    },

    /// The deck name is reserved or otherwise unusable.
    #[error("Invalid deck name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The action is structurally disallowed.
    #[error("Invalid operation '{operation}': {reason}")]
    InvalidOperation { operation: String, reason: String },

    /// The target of a share or ownership transfer is invalid.
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// A concurrent mutation invalidated an assumption of the operation.
    #[error("Conflict: {reason}")]
    Conflict { reason: String },
}

impl StoreError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::DeckNotFound { .. } | StoreError::CardNotFound { .. }
        )
    }

    /// Check if this error indicates permission was denied.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, StoreError::Forbidden { .. })
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::DeckNotFound { .. } | StoreError::CardNotFound { .. } => {
                ErrorKind::NotFound
            }
            StoreError::Forbidden { .. } => ErrorKind::Forbidden,
            StoreError::InvalidName { .. } => ErrorKind::InvalidName,
            StoreError::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            StoreError::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
        }
    }

    pub(crate) fn invalid_operation(operation: &str, reason: &str) -> Self {
        StoreError::InvalidOperation {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_target(target: impl ToString, reason: &str) -> Self {
        StoreError::InvalidTarget {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Translate the outcome of a guarded write whose preconditions changed after
/// the store's snapshot into the error the store reports itself.
///
/// A deck deleted meanwhile becomes `DeckNotFound`, a grant or ownership lost
/// meanwhile becomes `Forbidden`. Other errors pass through.
pub(crate) fn settle_write(err: crate::Error) -> crate::Error {
    match err {
        crate::Error::Backend(BackendError::DeckMissing { deck_id }) => {
            tracing::debug!(deck_id = %deck_id, "Deck vanished before the write was applied");
            StoreError::DeckNotFound { deck_id }.into()
        }
        crate::Error::Backend(BackendError::AccessRevoked {
            deck_id,
            user_id,
            required,
        }) => {
            tracing::info!(deck_id = %deck_id, user_id = %user_id, %required, "Access changed before the write was applied");
            StoreError::Forbidden { deck_id, required }.into()
        }
        other => other,
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
