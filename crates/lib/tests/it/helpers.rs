use std::sync::Arc;

use flashdeck::{
    CardId, DeckId, Error, ErrorKind, FixedClock, Library,
    backend::{BackendImpl, database::InMemory},
    store::{NewCard, NewDeck},
    user::User,
};

// ==========================
// CORE TEST FACTORIES
// ==========================
// Single point of change for backend matrix testing via the TEST_BACKEND env var.

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
/// - "postgres": PostgreSQL backend (requires `postgres` feature and TEST_POSTGRES_URL)
///
/// # Example
/// ```bash
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test --features sqlite
///
/// # Run tests with PostgreSQL
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/flashdeck_test" \
///   cargo test --features postgres
/// ```
pub async fn test_backend() -> Box<dyn BackendImpl> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use flashdeck::backend::database::Sqlite;
                Box::new(
                    Sqlite::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use flashdeck::backend::database::Postgres;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/flashdeck_test".to_string());
                Box::new(
                    Postgres::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Box::new(InMemory::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite, postgres")
        }
    }
}

/// Creates an empty Library with a [`FixedClock`], returning the clock for
/// tests that need to freeze or inspect time.
pub async fn test_library_with_clock() -> (Library, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::default());
    let library = Library::open_with_clock(test_backend().await, clock.clone());
    (library, clock)
}

/// Creates an empty Library with a [`FixedClock`].
pub async fn test_library() -> Library {
    test_library_with_clock().await.0
}

/// Creates a Library with one registered user per name.
pub async fn test_library_with_users<const N: usize>(names: [&str; N]) -> (Library, [User; N]) {
    let library = test_library().await;
    let mut users = Vec::with_capacity(N);
    for name in names {
        users.push(
            library
                .register_user(name, None)
                .await
                .expect("Failed to register user"),
        );
    }
    let users: [User; N] = users
        .try_into()
        .unwrap_or_else(|_| panic!("expected {N} users"));
    (library, users)
}

// ==========================
// DECK AND CARD SETUP
// ==========================

/// Creates a private deck owned by `owner`.
pub async fn private_deck(library: &Library, owner: &User, name: &str) -> DeckId {
    library
        .create_deck(&owner.id, NewDeck::new(name).private(true))
        .await
        .expect("Failed to create deck")
}

/// Creates a public deck owned by `owner`.
pub async fn public_deck(library: &Library, owner: &User, name: &str) -> DeckId {
    library
        .create_deck(&owner.id, NewDeck::new(name).private(false))
        .await
        .expect("Failed to create deck")
}

/// Adds `count` numbered cards to a deck.
pub async fn add_cards(library: &Library, owner: &User, deck: &DeckId, count: usize) -> Vec<CardId> {
    let mut cards = Vec::with_capacity(count);
    for i in 0..count {
        let card = NewCard::new(format!("Question {i}"), format!("Answer {i}")).in_deck(deck.clone());
        cards.push(
            library
                .create_card(&owner.id, card)
                .await
                .expect("Failed to create card"),
        );
    }
    cards
}

/// Current `date_updated` of a deck, read straight from the backend.
pub async fn date_updated(library: &Library, deck: &DeckId) -> i64 {
    library
        .backend()
        .get_deck(deck)
        .await
        .expect("Failed to read deck")
        .expect("Deck should exist")
        .record
        .date_updated
}

// ==========================
// ASSERTION HELPERS
// ==========================

/// Assert that a result failed with the given error kind.
#[track_caller]
pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, Error>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("expected {kind:?}, got Ok({value:?})"),
        Err(err) => assert_eq!(err.kind(), kind, "unexpected error: {err}"),
    }
}
