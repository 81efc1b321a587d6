//! Deck writes overtaken by a competing write between check and write.

use flashdeck::{
    ErrorKind,
    backend::DeckGuard,
    store::{DeckUpdate, Share},
};

use crate::helpers::*;
use crate::interleaved::{interleave, interleaved_library};

#[tokio::test]
async fn test_share_after_losing_ownership_is_forbidden() {
    let (library, [alice, bob, carol]) = interleaved_library(["alice", "bob", "carol"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    let (id, from, to) = (deck.clone(), alice.id.clone(), bob.id.clone());
    interleave(&library, "upsert_share", move |backend| async move {
        backend
            .transfer_deck(&id, &to, 0, DeckGuard::own(&from))
            .await
            .unwrap();
    });

    assert_kind(
        library.share_deck(&alice.id, &deck, "carol", true).await,
        ErrorKind::Forbidden,
    );

    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(stored.owner(), &bob.id);
    assert!(stored.share_for(&carol.id).is_none());
    assert_kind(library.deck(Some(&carol.id), &deck).await, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_delete_after_losing_ownership_keeps_the_deck() {
    let (library, [alice, bob]) = interleaved_library(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;
    add_cards(&library, &alice, &deck, 2).await;

    let (id, from, to) = (deck.clone(), alice.id.clone(), bob.id.clone());
    interleave(&library, "delete_deck", move |backend| async move {
        backend
            .transfer_deck(&id, &to, 0, DeckGuard::own(&from))
            .await
            .unwrap();
    });

    assert_kind(library.delete_deck(&alice.id, &deck).await, ErrorKind::Forbidden);
    assert_eq!(library.cards_in_deck(Some(&bob.id), &deck).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_transfer_and_unshare_after_losing_ownership_are_forbidden() {
    let (library, [alice, bob, carol]) = interleaved_library(["alice", "bob", "carol"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;
    library.share_deck(&alice.id, &deck, "carol", false).await.unwrap();

    let (id, from, to) = (deck.clone(), alice.id.clone(), bob.id.clone());
    interleave(&library, "transfer_deck", move |backend| async move {
        backend
            .transfer_deck(&id, &to, 0, DeckGuard::own(&from))
            .await
            .unwrap();
    });
    assert_kind(
        library.change_owner(&alice.id, &deck, "carol").await,
        ErrorKind::Forbidden,
    );
    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(stored.owner(), &bob.id);

    // A stale unshare of carol must not land on a deck alice no longer owns
    let other = private_deck(&library, &alice, "Chemistry").await;
    library.share_deck(&alice.id, &other, "carol", false).await.unwrap();
    let (id, from, to) = (other.clone(), alice.id.clone(), bob.id.clone());
    interleave(&library, "remove_share", move |backend| async move {
        backend
            .transfer_deck(&id, &to, 0, DeckGuard::own(&from))
            .await
            .unwrap();
    });
    assert_kind(
        library.unshare_deck(&alice.id, &other, "carol").await,
        ErrorKind::Forbidden,
    );
    let stored = library.backend().get_deck(&other).await.unwrap().unwrap();
    assert_eq!(stored.owner(), &bob.id);
    assert!(stored.share_for(&carol.id).is_some());
}

#[tokio::test]
async fn test_editor_cannot_edit_after_share_revoked() {
    let (library, [alice, bob]) = interleaved_library(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;
    library.share_deck(&alice.id, &deck, "bob", true).await.unwrap();

    let (id, owner, editor) = (deck.clone(), alice.id.clone(), bob.id.clone());
    interleave(&library, "update_deck", move |backend| async move {
        backend
            .remove_share(&id, &editor, 0, DeckGuard::own(&owner))
            .await
            .unwrap();
    });

    let edit = DeckUpdate {
        description: Some("vandalised".to_string()),
        ..Default::default()
    };
    assert_kind(library.update_deck(&bob.id, &deck, edit).await, ErrorKind::Forbidden);
    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(stored.record.description, "");
}

#[tokio::test]
async fn test_description_edit_keeps_a_concurrent_rename() {
    let (library, [alice, bob]) = interleaved_library(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;
    library.share_deck(&alice.id, &deck, "bob", true).await.unwrap();

    let (id, owner) = (deck.clone(), alice.id.clone());
    interleave(&library, "update_deck", move |backend| async move {
        backend
            .update_deck(
                &id,
                &DeckUpdate {
                    name: Some("Cell Biology".to_string()),
                    is_private: Some(false),
                    ..Default::default()
                },
                0,
                DeckGuard::own(&owner),
            )
            .await
            .unwrap();
    });

    // Bob sends back the name he saw along with his description
    let edit = DeckUpdate {
        name: Some("Biology".to_string()),
        description: Some("Cells and organelles".to_string()),
        is_private: Some(true),
    };
    let updated = library.update_deck(&bob.id, &deck, edit).await.unwrap();
    assert_eq!(updated.name, "Cell Biology");
    assert!(!updated.is_private);
    assert_eq!(updated.description, "Cells and organelles");
}

#[tokio::test]
async fn test_share_on_deck_deleted_meanwhile_is_not_found() {
    let (library, [alice, _bob]) = interleaved_library(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    let (id, owner) = (deck.clone(), alice.id.clone());
    interleave(&library, "upsert_share", move |backend| async move {
        backend.delete_deck(&id, DeckGuard::own(&owner)).await.unwrap();
    });

    assert_kind(
        library.share_deck(&alice.id, &deck, "bob", true).await,
        ErrorKind::NotFound,
    );
    assert!(library.backend().get_deck(&deck).await.unwrap().is_none());
}

#[tokio::test]
async fn test_share_with_user_deleted_meanwhile_is_invalid_target() {
    let (library, [alice, bob]) = interleaved_library(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    let target = bob.id.clone();
    interleave(&library, "upsert_share", move |backend| async move {
        backend.delete_user(&target).await.unwrap();
    });

    assert_kind(
        library.share_deck(&alice.id, &deck, "bob", false).await,
        ErrorKind::InvalidTarget,
    );
    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert!(stored.shared_to.is_empty());
}

#[tokio::test]
async fn test_like_on_deck_deleted_meanwhile_is_not_found() {
    let (library, [alice, bob]) = interleaved_library(["alice", "bob"]).await;
    let deck = public_deck(&library, &alice, "Biology").await;

    let (id, owner) = (deck.clone(), alice.id.clone());
    interleave(&library, "add_like", move |backend| async move {
        backend.delete_deck(&id, DeckGuard::own(&owner)).await.unwrap();
    });

    assert_kind(library.like_deck(&bob.id, &deck).await, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_like_after_deck_made_private_is_forbidden() {
    let (library, [alice, bob]) = interleaved_library(["alice", "bob"]).await;
    let deck = public_deck(&library, &alice, "Biology").await;

    let (id, owner) = (deck.clone(), alice.id.clone());
    interleave(&library, "add_like", move |backend| async move {
        backend
            .update_deck(
                &id,
                &DeckUpdate {
                    is_private: Some(true),
                    ..Default::default()
                },
                0,
                DeckGuard::own(&owner),
            )
            .await
            .unwrap();
    });

    assert_kind(library.like_deck(&bob.id, &deck).await, ErrorKind::Forbidden);
    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert!(stored.liked_by.is_empty());
}

#[tokio::test]
async fn test_competing_share_is_kept_when_owner_resends_it() {
    let (library, [alice, bob]) = interleaved_library(["alice", "bob"]).await;
    let deck = private_deck(&library, &alice, "Biology").await;

    let (id, owner, target) = (deck.clone(), alice.id.clone(), bob.id.clone());
    interleave(&library, "upsert_share", move |backend| async move {
        let share = Share {
            user: target,
            editable: false,
        };
        backend
            .upsert_share(&id, &share, 0, DeckGuard::own(&owner))
            .await
            .unwrap();
    });

    // Both requests come from the owner, so the later one wins
    library.share_deck(&alice.id, &deck, "bob", true).await.unwrap();
    let stored = library.backend().get_deck(&deck).await.unwrap().unwrap();
    assert_eq!(stored.share_for(&bob.id).map(|s| s.editable), Some(true));
}
