//! User directory for Flashdeck
//!
//! Holds identity records and resolves usernames to opaque user ids.
//! Credentials and sessions are handled outside this library.

pub mod directory;
pub mod errors;
pub mod types;

pub use directory::{UserDirectory, normalize_username};
pub use errors::UserError;
pub use types::{User, UserDeletion};
