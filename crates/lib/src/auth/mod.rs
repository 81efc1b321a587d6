//! Access policy for decks and cards.
//!
//! Cards have no permissions of their own: every card operation is authorized
//! against the deck that owns the card.

pub mod access;

pub use access::{
    Access, Capability, is_owner, require_owner, require_readable, require_writable,
    resolve_access,
};
