//! Deck and card stores.
//!
//! [`DeckStore`] and [`CardStore`] are the only writers of deck and card state.
//! Every read and write path checks the requester's capabilities through
//! [`crate::auth`] before touching the backend, and every mutation refreshes
//! the affected decks' `date_updated`.

mod errors;
pub use errors::StoreError;

mod types;
pub use types::{
    Card, CardUpdate, Deck, DeckKind, DeckRecord, DeckUpdate, DeckView, NewCard, NewDeck, Share,
};

mod deck;
pub use deck::DeckStore;

mod card;
pub use card::CardStore;
