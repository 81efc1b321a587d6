//! User directory: registration and identity lookup.
//!
//! The directory is the only place that turns human-facing identifiers
//! (usernames) into the opaque [`UserId`] the access policy compares against.

use std::sync::Arc;

use super::{User, UserDeletion, UserError};
use crate::{
    Clock, Result, UserId,
    backend::BackendImpl,
    constants::{MAX_DISPLAY_NAME_LEN, MAX_USERNAME_LEN, MIN_USERNAME_LEN},
};

/// Normalizes and validates a username.
///
/// Usernames are case-insensitive and stored lowercase. Allowed characters are
/// ASCII letters, digits, `_`, `-` and `.`.
pub fn normalize_username(raw: &str) -> std::result::Result<String, UserError> {
    let username = raw.trim().to_lowercase();
    let invalid = |reason: &str| UserError::InvalidUsername {
        username: raw.to_string(),
        reason: reason.to_string(),
    };

    let len = username.chars().count();
    if len < MIN_USERNAME_LEN {
        return Err(invalid("too short"));
    }
    if len > MAX_USERNAME_LEN {
        return Err(invalid("too long"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(invalid("contains unsupported characters"));
    }
    Ok(username)
}

fn validate_display_name(raw: &str) -> std::result::Result<String, UserError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(UserError::InvalidDisplayName {
            reason: "must not be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(UserError::InvalidDisplayName {
            reason: format!("longer than {MAX_DISPLAY_NAME_LEN} characters"),
        });
    }
    Ok(name.to_string())
}

/// Registry of user identities.
#[derive(Clone)]
pub struct UserDirectory {
    backend: Arc<dyn BackendImpl>,
    clock: Arc<dyn Clock>,
}

impl UserDirectory {
    /// Create a directory over the given backend.
    pub fn new(backend: Arc<dyn BackendImpl>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Register a new user.
    ///
    /// The display name defaults to the normalized username.
    ///
    /// # Errors
    /// `InvalidUsername`/`InvalidDisplayName` on malformed input,
    /// `UsernameAlreadyExists` if the username is taken.
    pub async fn register(&self, username: &str, display_name: Option<&str>) -> Result<User> {
        let username = normalize_username(username)?;
        let display_name = match display_name {
            Some(name) => validate_display_name(name)?,
            None => username.clone(),
        };

        let user = User {
            id: UserId::generate(),
            username,
            display_name,
            created_at: self.clock.now(),
        };
        self.backend.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Look up a user by id.
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        self.backend.get_user(id).await
    }

    /// Look up a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let Ok(username) = normalize_username(username) else {
            return Ok(None);
        };
        self.backend.find_user_by_username(&username).await
    }

    /// Get a user by id, failing with `UserNotFound` if absent.
    pub async fn get(&self, id: &UserId) -> Result<User> {
        self.find_by_id(id).await?.ok_or_else(|| {
            UserError::UserNotFound {
                identifier: id.to_string(),
            }
            .into()
        })
    }

    /// Resolve a human-facing identifier to a user.
    ///
    /// The identifier is tried as an exact user id first, then as a username.
    /// The two cannot collide: ids are 36-character UUIDs, longer than any
    /// valid username.
    pub async fn resolve(&self, identifier: &str) -> Result<Option<User>> {
        if let Some(user) = self.find_by_id(&UserId::new(identifier)).await? {
            return Ok(Some(user));
        }
        let user = self.find_by_username(identifier).await?;
        tracing::debug!(identifier, found = user.is_some(), "Resolved user identifier");
        Ok(user)
    }

    /// Change a user's display name.
    pub async fn update_display_name(&self, id: &UserId, display_name: &str) -> Result<User> {
        let mut user = self.get(id).await?;
        user.display_name = validate_display_name(display_name)?;
        self.backend.update_user(&user).await?;
        Ok(user)
    }

    /// List all users ordered by username.
    pub async fn list(&self) -> Result<Vec<User>> {
        self.backend.list_users().await
    }

    /// Remove a user with every deck they own, and their sharing entries and
    /// likes on other decks, in one backend write.
    ///
    /// # Errors
    /// `UserNotFound` if the user does not exist.
    pub async fn remove(&self, id: &UserId) -> Result<UserDeletion> {
        let deletion = self
            .backend
            .delete_user(id)
            .await?
            .ok_or_else(|| UserError::UserNotFound {
                identifier: id.to_string(),
            })?;
        tracing::info!(user_id = %id, decks = deletion.decks, cards = deletion.cards, "Removed user");
        Ok(deletion)
    }
}
