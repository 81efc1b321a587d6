pub mod deck;
pub mod info;
pub mod user;
