//! Sharing list management and ownership transfer.

use flashdeck::{ErrorKind, auth::Access, store::Share};

use crate::helpers::*;

#[tokio::test]
async fn test_share_is_an_upsert() {
    let (library, [alice, bob]) = test_library_with_users(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    library.share_deck(&alice.id, &deck, "bob", false).await.unwrap();
    library.share_deck(&alice.id, &deck, "bob", true).await.unwrap();

    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(
        stored.shared_to,
        vec![Share {
            user: bob.id.clone(),
            editable: true,
        }]
    );
}

#[tokio::test]
async fn test_repeated_share_and_unshare_are_idempotent() {
    let (library, [alice, bob]) = test_library_with_users(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    library.share_deck(&alice.id, &deck, "bob", false).await.unwrap();
    let once = library.backend().get_deck(&deck).await.unwrap().unwrap();
    library.share_deck(&alice.id, &deck, "bob", false).await.unwrap();
    let twice = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(once, twice);

    assert!(library.unshare_deck(&alice.id, &deck, "bob").await.unwrap());
    let once = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert!(!library.unshare_deck(&alice.id, &deck, "bob").await.unwrap());
    let twice = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(once, twice);
    assert!(twice.share_for(&bob.id).is_none());

    assert_kind(library.deck(Some(&bob.id), &deck).await, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_share_and_unshare_touch_the_deck() {
    let (library, clock) = test_library_with_clock().await;
    let alice = library.register_user("alice", None).await.unwrap();
    library.register_user("bob", None).await.unwrap();
    let deck = private_deck(&library, &alice, "Biology").await;

    let created = date_updated(&library, &deck).await;
    clock.advance(10);
    library.share_deck(&alice.id, &deck, "bob", false).await.unwrap();
    let shared = date_updated(&library, &deck).await;
    assert!(shared > created);

    clock.advance(10);
    library.unshare_deck(&alice.id, &deck, "bob").await.unwrap();
    assert!(date_updated(&library, &deck).await > shared);
}

#[tokio::test]
async fn test_share_with_owner_is_invalid_target() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    assert_kind(
        library.share_deck(&alice.id, &deck, "alice", true).await,
        ErrorKind::InvalidTarget,
    );
    assert_kind(
        library.unshare_deck(&alice.id, &deck, "alice").await,
        ErrorKind::InvalidTarget,
    );
}

#[tokio::test]
async fn test_share_with_unknown_user_is_invalid_target() {
    let (library, [alice]) = test_library_with_users(["alice"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    assert_kind(
        library.share_deck(&alice.id, &deck, "nobody", false).await,
        ErrorKind::InvalidTarget,
    );

    // The store checks existence too when called with a raw id
    let ghost = flashdeck::UserId::new("ghost");
    assert_kind(
        library.decks().share_deck(&deck, &alice.id, &ghost, false).await,
        ErrorKind::InvalidTarget,
    );
}

#[tokio::test]
async fn test_uncategorized_deck_cannot_be_shared() {
    let (library, [alice, _bob]) = test_library_with_users(["alice", "bob"]).await;
    let uncategorized = library.uncategorized_deck(&alice.id).await.unwrap();

    assert_kind(
        library
            .share_deck(&alice.id, &uncategorized.id, "bob", false)
            .await,
        ErrorKind::InvalidOperation,
    );
}

#[tokio::test]
async fn test_transfer_ownership() {
    let (library, [alice, bob]) = test_library_with_users(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;
    library.share_deck(&alice.id, &deck, "bob", false).await.unwrap();

    library.change_owner(&alice.id, &deck, "bob").await.unwrap();

    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(stored.owner(), &bob.id);
    // Bob's now-redundant sharing entry is gone
    assert!(stored.shared_to.is_empty());

    let bob_view = library.decks().get_deck(&deck, Some(&bob.id)).await.unwrap();
    assert_eq!(bob_view.access, Access::OWNER);

    // The previous owner keeps nothing on a private deck
    assert_kind(library.deck(Some(&alice.id), &deck).await, ErrorKind::Forbidden);
    assert_kind(
        library.change_owner(&alice.id, &deck, "alice").await,
        ErrorKind::Forbidden,
    );
}

#[tokio::test]
async fn test_transfer_keeps_other_shares_and_cards() {
    let (library, [alice, bob, carol]) = test_library_with_users(["alice", "bob", "carol"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;
    let cards = add_cards(&library, &alice, &deck, 2).await;
    library.share_deck(&alice.id, &deck, "carol", true).await.unwrap();

    library
        .change_owner(&alice.id, &deck, bob.id.as_str())
        .await
        .unwrap();

    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(stored.share_for(&carol.id).map(|s| s.editable), Some(true));
    for card in &cards {
        assert_eq!(library.card(Some(&bob.id), card).await.unwrap().deck, deck);
    }
}

#[tokio::test]
async fn test_transfer_invalid_targets() {
    let (library, [alice, _bob]) = test_library_with_users(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    assert_kind(
        library.change_owner(&alice.id, &deck, "alice").await,
        ErrorKind::InvalidTarget,
    );
    assert_kind(
        library.change_owner(&alice.id, &deck, "nobody").await,
        ErrorKind::InvalidTarget,
    );

    let uncategorized = library.uncategorized_deck(&alice.id).await.unwrap();
    assert_kind(
        library.change_owner(&alice.id, &uncategorized.id, "bob").await,
        ErrorKind::InvalidTarget,
    );
}
