//! Capability resolution as observed through the deck store.

use flashdeck::{
    ErrorKind,
    auth::Access,
    store::{DeckUpdate, NewCard},
};

use crate::helpers::*;

#[tokio::test]
async fn test_biology_sharing_scenario() {
    let (library, clock) = test_library_with_clock().await;
    let alice = library.register_user("alice", None).await.unwrap();
    let bob = library.register_user("bob", None).await.unwrap();
    let biology = private_deck(&library, &alice, "Biology").await;

    // No sharing entry: private deck is invisible to bob
    assert_kind(library.deck(Some(&bob.id), &biology).await, ErrorKind::Forbidden);

    // Read-only share
    library
        .share_deck(&alice.id, &biology, "bob", false)
        .await
        .unwrap();
    let detail = library.deck(Some(&bob.id), &biology).await.unwrap();
    assert!(!detail.is_editable);
    let edit = DeckUpdate {
        description: Some("Cells and more".to_string()),
        ..Default::default()
    };
    assert_kind(
        library.update_deck(&bob.id, &biology, edit.clone()).await,
        ErrorKind::Forbidden,
    );

    // Upgraded to editable: the same update now succeeds and touches the deck
    library
        .share_deck(&alice.id, &biology, "bob", true)
        .await
        .unwrap();
    let before = date_updated(&library, &biology).await;
    clock.advance(1000);
    let updated = library.update_deck(&bob.id, &biology, edit).await.unwrap();
    assert_eq!(updated.description, "Cells and more");
    assert!(updated.is_editable);
    assert!(updated.date_updated > before);
    assert_eq!(date_updated(&library, &biology).await, updated.date_updated);
}

#[tokio::test]
async fn test_owner_has_full_access_regardless_of_privacy_and_shares() {
    let (library, [alice, _bob]) = test_library_with_users(["alice", "bob"]).await;

    for is_private in [true, false] {
        let deck = if is_private {
            private_deck(&library, &alice, "Private").await
        } else {
            public_deck(&library, &alice, "Public").await
        };
        library.share_deck(&alice.id, &deck, "bob", false).await.unwrap();

        let view = library.decks().get_deck(&deck, Some(&alice.id)).await.unwrap();
        assert_eq!(view.access, Access::OWNER);
    }
}

#[tokio::test]
async fn test_explicit_share_beats_public_fallback() {
    let (library, [alice, bob, carol]) = test_library_with_users(["alice", "bob", "carol"]).await;
    let deck = private_deck(&library, &alice, "Chemistry").await;
    library.share_deck(&alice.id, &deck, "bob", false).await.unwrap();

    // Making the deck public does not upgrade bob's explicit read-only entry
    library
        .update_deck(
            &alice.id,
            &deck,
            DeckUpdate {
                is_private: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let bob_view = library.decks().get_deck(&deck, Some(&bob.id)).await.unwrap();
    assert_eq!(bob_view.access, Access::READ_ONLY);

    // Carol reads through the public fallback, and cannot write either
    let carol_view = library.decks().get_deck(&deck, Some(&carol.id)).await.unwrap();
    assert_eq!(carol_view.access, Access::READ_ONLY);
    assert_kind(
        library
            .create_card(&carol.id, NewCard::new("Q", "A").in_deck(deck.clone()))
            .await,
        ErrorKind::Forbidden,
    );
}

#[tokio::test]
async fn test_anonymous_requester_sees_public_decks_only() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let public = public_deck(&library, &alice, "Open").await;
    let private = private_deck(&library, &alice, "Closed").await;
    add_cards(&library, &alice, &public, 2).await;

    let detail = library.deck(None, &public).await.unwrap();
    assert!(!detail.is_editable);
    assert!(!detail.is_owner);
    assert!(detail.shared_to.is_none());
    assert_eq!(library.cards_in_deck(None, &public).await.unwrap().len(), 2);

    assert_kind(library.deck(None, &private).await, ErrorKind::Forbidden);
    assert_kind(library.cards_in_deck(None, &private).await, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_editable_share_does_not_grant_admin_operations() {
    let (library, [alice, bob, _carol]) = test_library_with_users(["alice", "bob", "carol"]).await;
    let deck = private_deck(&library, &alice, "Physics").await;
    library.share_deck(&alice.id, &deck, "bob", true).await.unwrap();

    let rename = DeckUpdate {
        name: Some("Bob's Physics".to_string()),
        ..Default::default()
    };
    let publish = DeckUpdate {
        is_private: Some(false),
        ..Default::default()
    };
    assert_kind(library.update_deck(&bob.id, &deck, rename).await, ErrorKind::Forbidden);
    assert_kind(library.update_deck(&bob.id, &deck, publish).await, ErrorKind::Forbidden);
    assert_kind(library.delete_deck(&bob.id, &deck).await, ErrorKind::Forbidden);
    assert_kind(
        library.share_deck(&bob.id, &deck, "carol", false).await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        library.unshare_deck(&bob.id, &deck, "bob").await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        library.change_owner(&bob.id, &deck, "bob").await,
        ErrorKind::Forbidden,
    );

    // Unchanged values are not administrative
    let same = DeckUpdate {
        name: Some("Physics".to_string()),
        is_private: Some(true),
        description: Some("Forces".to_string()),
    };
    let updated = library.update_deck(&bob.id, &deck, same).await.unwrap();
    assert_eq!(updated.name, "Physics");
    assert_eq!(updated.description, "Forces");
}

#[tokio::test]
async fn test_missing_deck_is_not_found() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let missing = flashdeck::DeckId::new("missing");

    assert_kind(library.deck(Some(&alice.id), &missing).await, ErrorKind::NotFound);
    assert_kind(library.delete_deck(&alice.id, &missing).await, ErrorKind::NotFound);
    assert_kind(library.like_deck(&alice.id, &missing).await, ErrorKind::NotFound);
    assert_kind(
        library
            .update_deck(&alice.id, &missing, DeckUpdate::default())
            .await,
        ErrorKind::NotFound,
    );
}
