//!
//! Flashdeck: flashcard decks with owner, shared and public access control.
//! This library provides the core components for storing decks and cards and
//! deciding, for any user and deck, what that user may do with it.
//!
//! ## Core Concepts
//!
//! * **Users (`user::User`)**: Identity records held by the [`user::UserDirectory`].
//! * **Decks (`store::Deck`)**: Named collections of cards with an owner, a privacy flag,
//!   a sharing list and a set of users who liked them. Every user has exactly one
//!   Uncategorized deck, created on first use.
//! * **Cards (`store::Card`)**: Question/answer/hint units, each belonging to exactly one deck.
//! * **Access Policy (`auth`)**: Pure decision logic mapping a (deck, user) pair to a
//!   readable/writable capability pair. Administrative operations require exact ownership.
//! * **Backends (`backend::BackendImpl`)**: Pluggable persistence. `InMemory` for tests and
//!   small deployments, `SqlxBackend` for SQLite and PostgreSQL.
//! * **Library (`library::Library`)**: The service layer composing the stores into use cases.

pub mod auth;
pub mod backend;
pub mod clock;
pub mod constants;
pub mod id;
pub mod library;
pub mod store;
pub mod user;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::{ClockHold, FixedClock};
pub use id::{CardId, DeckId, UserId};
pub use library::Library;

/// Result type used throughout the Flashdeck library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Flashdeck library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured user directory errors from the user module
    #[error(transparent)]
    User(user::UserError),

    /// Structured deck and card errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured persistence errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),
}

/// Coarse classification of an [`Error`], used by callers to map failures to
/// user-facing responses without inspecting internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The referenced deck, card or user does not exist.
    NotFound,
    /// The requester lacks the capability the operation needs.
    Forbidden,
    /// A deck name collides with the reserved Uncategorized name.
    InvalidName,
    /// The action is structurally disallowed (e.g. deleting the Uncategorized deck).
    InvalidOperation,
    /// A share or transfer target is invalid.
    InvalidTarget,
    /// A concurrent mutation invalidated an assumption.
    Conflict,
    /// Storage, I/O or serialization failure.
    Internal,
}

impl ErrorKind {
    /// Suggested HTTP status code for this kind of error.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::InvalidName | ErrorKind::InvalidOperation | ErrorKind::InvalidTarget => 422,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::User(_) => "user",
            Error::Store(_) => "store",
            Error::Backend(_) => "backend",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::User(user_err) => user_err.kind(),
            Error::Store(store_err) => store_err.kind(),
            Error::Backend(backend_err) if backend_err.is_conflict() => ErrorKind::Conflict,
            Error::Backend(backend_err) if backend_err.is_missing() => ErrorKind::NotFound,
            Error::Backend(backend_err) if backend_err.is_access_revoked() => ErrorKind::Forbidden,
            Error::Backend(_) | Error::Io(_) | Error::Serialize(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error indicates the requester lacked a capability.
    pub fn is_forbidden(&self) -> bool {
        self.kind() == ErrorKind::Forbidden
    }

    /// Check if this error indicates a conflict (already exists, lost race).
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Check if this error is a validation failure of the request itself.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidName | ErrorKind::InvalidOperation | ErrorKind::InvalidTarget
        )
    }

    /// Check if this error is storage-related.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }
}
