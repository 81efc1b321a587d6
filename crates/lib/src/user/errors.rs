//! Error types for the user directory
use thiserror::Error;

use crate::ErrorKind;

/// Errors that can occur during user directory operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UserError {
    #[error("User not found: {identifier}")]
    UserNotFound { identifier: String },

    #[error("Username already exists: {username}")]
    UsernameAlreadyExists { username: String },

    #[error("Invalid username '{username}': {reason}")]
    InvalidUsername { username: String, reason: String },

    #[error("Invalid display name: {reason}")]
    InvalidDisplayName { reason: String },
}

impl UserError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UserError::UserNotFound { .. })
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::UserNotFound { .. } => ErrorKind::NotFound,
            UserError::UsernameAlreadyExists { .. } => ErrorKind::Conflict,
            UserError::InvalidUsername { .. } | UserError::InvalidDisplayName { .. } => {
                ErrorKind::InvalidName
            }
        }
    }
}

impl From<UserError> for crate::Error {
    fn from(err: UserError) -> Self {
        crate::Error::User(err)
    }
}
