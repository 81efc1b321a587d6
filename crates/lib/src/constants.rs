//! Constants used throughout the Flashdeck library.
//!
//! This module provides central definitions for reserved names and limits.

/// Reserved display name of every user's Uncategorized deck.
///
/// User-supplied deck names may never equal this value.
pub const UNCATEGORIZED_DECK_NAME: &str = "#UNCATEGORISED#";

/// Minimum length of a username, in characters.
pub const MIN_USERNAME_LEN: usize = 3;

/// Maximum length of a username, in characters.
pub const MAX_USERNAME_LEN: usize = 32;

/// Maximum length of a display name, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 64;
