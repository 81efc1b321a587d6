//! Deck creation, update, deletion and listing.

use flashdeck::{
    ErrorKind,
    constants::UNCATEGORIZED_DECK_NAME,
    store::{DeckUpdate, NewCard, NewDeck},
};

use crate::helpers::*;

#[tokio::test]
async fn test_create_deck() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let deck = library
        .create_deck(
            &alice.id,
            NewDeck::new("  Biology ")
                .description("Cells")
                .private(true),
        )
        .await
        .unwrap();

    let detail = library.deck(Some(&alice.id), &deck).await.unwrap();
    assert_eq!(detail.name, "Biology");
    assert_eq!(detail.description, "Cells");
    assert!(detail.is_private);
    assert!(detail.is_owner);
    assert!(detail.is_editable);
    assert!(!detail.is_uncategorized);
    assert_eq!(detail.likes, 0);
    assert_eq!(detail.date_created, detail.date_updated);
    assert_eq!(detail.shared_to, Some(Vec::new()));
}

#[tokio::test]
async fn test_create_deck_rejects_reserved_and_empty_names() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;

    for name in [UNCATEGORIZED_DECK_NAME, "", "   "] {
        assert_kind(
            library.create_deck(&alice.id, NewDeck::new(name)).await,
            ErrorKind::InvalidName,
        );
    }
    assert!(library.decks_for(&alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_deck_for_unknown_user_fails() {
    let library = test_library().await;
    let ghost = flashdeck::UserId::new("ghost");
    assert_kind(
        library.create_deck(&ghost, NewDeck::new("Biology")).await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_owner_renames_and_publishes() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    let updated = library
        .update_deck(
            &alice.id,
            &deck,
            DeckUpdate {
                name: Some(" Cell Biology ".to_string()),
                is_private: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Cell Biology");
    assert!(!updated.is_private);
    assert!(updated.date_updated > updated.date_created);

    // Renaming to the reserved name is rejected
    assert_kind(
        library
            .update_deck(
                &alice.id,
                &deck,
                DeckUpdate {
                    name: Some(UNCATEGORIZED_DECK_NAME.to_string()),
                    ..Default::default()
                },
            )
            .await,
        ErrorKind::InvalidName,
    );
}

#[tokio::test]
async fn test_uncategorized_deck_cannot_be_renamed_or_published() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let uncategorized = library.uncategorized_deck(&alice.id).await.unwrap();

    assert_kind(
        library
            .update_deck(
                &alice.id,
                &uncategorized.id,
                DeckUpdate {
                    name: Some("Misc".to_string()),
                    ..Default::default()
                },
            )
            .await,
        ErrorKind::InvalidOperation,
    );
    assert_kind(
        library
            .update_deck(
                &alice.id,
                &uncategorized.id,
                DeckUpdate {
                    is_private: Some(false),
                    ..Default::default()
                },
            )
            .await,
        ErrorKind::InvalidOperation,
    );

    // The description is still editable
    let updated = library
        .update_deck(
            &alice.id,
            &uncategorized.id,
            DeckUpdate {
                description: Some("Loose cards".to_string()),
                is_private: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "Loose cards");
    assert_eq!(updated.name, UNCATEGORIZED_DECK_NAME);
    assert!(updated.is_private);
}

#[tokio::test]
async fn test_delete_deck_cascades_to_cards() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;
    let cards = add_cards(&library, &alice, &deck, 3).await;

    assert_eq!(library.delete_deck(&alice.id, &deck).await.unwrap(), 3);

    assert_kind(library.deck(Some(&alice.id), &deck).await, ErrorKind::NotFound);
    for card in &cards {
        assert_kind(library.card(Some(&alice.id), card).await, ErrorKind::NotFound);
    }
    assert!(library.backend().list_cards(&deck).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_uncategorized_deck_cannot_be_deleted() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let card = library
        .create_card(&alice.id, NewCard::new("Q", "A"))
        .await
        .unwrap();
    let deck = library.card(Some(&alice.id), &card).await.unwrap().deck;

    assert_kind(library.delete_deck(&alice.id, &deck).await, ErrorKind::InvalidOperation);
    assert!(library.card(Some(&alice.id), &card).await.is_ok());
}

#[tokio::test]
async fn test_list_orders_by_date_updated_then_name() {
    let (library, clock) = test_library_with_clock().await;
    let alice = library.register_user("alice", None).await.unwrap();

    let hold = clock.hold();
    let zoology = private_deck(&library, &alice, "Zoology").await;
    let botany = private_deck(&library, &alice, "Botany").await;
    drop(hold);
    let chemistry = private_deck(&library, &alice, "Chemistry").await;

    let ids: Vec<_> = library
        .decks_for(&alice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|deck| deck.id)
        .collect();
    assert_eq!(ids, [chemistry.clone(), botany.clone(), zoology.clone()]);

    // Adding a card touches the deck and moves it to the front
    add_cards(&library, &alice, &zoology, 1).await;
    let names: Vec<_> = library
        .decks_for(&alice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|deck| deck.name)
        .collect();
    assert_eq!(names, ["Zoology", "Chemistry", "Botany"]);
}

#[tokio::test]
async fn test_list_includes_shared_and_excludes_public_and_uncategorized() {
    let (library, [alice, bob]) = test_library_with_users(["alice", "bob"]).await;
    let own = private_deck(&library, &alice, "Mine").await;
    library.uncategorized_deck(&alice.id).await.unwrap();

    let shared = private_deck(&library, &bob, "Shared").await;
    library.share_deck(&bob.id, &shared, "alice", false).await.unwrap();
    public_deck(&library, &bob, "Public").await;

    let listed = library.decks_for(&alice.id).await.unwrap();
    assert_eq!(listed.len(), 2);

    let mine = listed.iter().find(|deck| deck.id == own).unwrap();
    assert!(mine.is_owned);
    let theirs = listed.iter().find(|deck| deck.id == shared).unwrap();
    assert!(!theirs.is_owned);
    assert_eq!(theirs.owner, bob.id);
}
