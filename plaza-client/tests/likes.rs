mod common;

use common::Harness;
use plaza_client::{
    mutation::{LikeState, MutationPhase},
    session::Session,
    views::PostCard,
};
use plaza_remote::{memory::Operation, platform::Collection};
use serde_json::json;
use std::time::Duration;

async fn card_for(harness: &Harness, likes: i64) -> (Session, PostCard) {
    let (session, viewer) = harness.signed_up("Bea", "bea@example.com").await;
    let post_id = harness.seed_post(viewer.id, "Like me", likes, "2025-03-01T09:00:00Z");
    let post = harness.post(post_id).await;
    let card = PostCard::load(post, &session, &harness.data).await.unwrap();

    (session, card)
}

fn stored_likes(harness: &Harness, card: &PostCard) -> u64 {
    harness
        .platform
        .document(Collection::Posts, &card.post().id.to_string())
        .and_then(|post| post["likes"].as_u64())
        .unwrap()
}

#[tokio::test]
async fn like_then_unlike_returns_to_start() {
    let harness = Harness::new();
    let (session, card) = card_for(&harness, 5).await;
    assert_eq!(
        card.like_state(),
        LikeState {
            liked: false,
            likes: 5
        }
    );

    let liked = card.toggle_like(&session, &harness.data).await.unwrap();
    assert_eq!(
        liked,
        LikeState {
            liked: true,
            likes: 6
        }
    );
    assert_eq!(stored_likes(&harness, &card), 6);
    assert_eq!(harness.platform.documents(Collection::Likes).len(), 1);

    let unliked = card.toggle_like(&session, &harness.data).await.unwrap();
    assert_eq!(unliked.likes, 5);
    assert_eq!(stored_likes(&harness, &card), 5);
    assert!(harness.platform.documents(Collection::Likes).is_empty());
    assert_eq!(card.like_phase(), MutationPhase::Committed);
}

#[tokio::test(start_paused = true)]
async fn rapid_double_toggle_converges() {
    let harness = Harness::new();
    let (session, card) = card_for(&harness, 5).await;
    harness.platform.set_latency(Duration::from_millis(15));

    let (first, second) = tokio::join!(
        card.toggle_like(&session, &harness.data),
        card.toggle_like(&session, &harness.data),
    );
    first.unwrap();
    second.unwrap();

    let stored = stored_likes(&harness, &card);
    assert!(stored == 5 || stored == 6, "stored {stored}");

    let post = harness.post(card.post().id).await;
    let user = session.require_user().unwrap();
    let liked = harness.data.liked(post.id, user.id).await.unwrap();
    assert!(card.sync(&post, liked));

    let shown = card.like_state().likes;
    assert!(shown == 5 || shown == 6, "shown {shown}");
    assert_eq!(u64::from(shown), stored);
}

#[tokio::test]
async fn failed_like_rolls_back_silently() {
    let harness = Harness::new();
    let (session, card) = card_for(&harness, 5).await;
    harness
        .platform
        .fail(Operation::CreateDocument(Collection::Likes), "Rate limit");

    card.toggle_like(&session, &harness.data).await.unwrap_err();

    assert_eq!(
        card.like_state(),
        LikeState {
            liked: false,
            likes: 5
        }
    );
    assert_eq!(card.like_phase(), MutationPhase::RolledBack);
    assert_eq!(stored_likes(&harness, &card), 5);
}

#[tokio::test]
async fn unlike_at_zero_stays_at_zero() {
    let harness = Harness::new();
    let (session, viewer) = harness.signed_up("Bea", "bea@example.com").await;
    let post_id = harness.seed_post(viewer.id, "Drifted", 0, "2025-03-01T09:00:00Z");
    harness.platform.insert_document(
        Collection::Likes,
        "77",
        json!({
            "postId": post_id.to_string(),
            "userId": viewer.id.to_string(),
            "createdAt": "2025-03-01T09:05:00Z",
        }),
    );

    let post = harness.post(post_id).await;
    let card = PostCard::load(post, &session, &harness.data).await.unwrap();
    assert!(card.like_state().liked);

    let state = card.toggle_like(&session, &harness.data).await.unwrap();
    assert_eq!(
        state,
        LikeState {
            liked: false,
            likes: 0
        }
    );
    assert_eq!(stored_likes(&harness, &card), 0);
}

#[tokio::test]
async fn anonymous_viewer_cannot_like() {
    let harness = Harness::new();
    let (session, card) = card_for(&harness, 2).await;
    session.logout().await.unwrap();
    harness.platform.clear_calls();

    card.toggle_like(&session, &harness.data).await.unwrap_err();

    assert_eq!(card.like_state().likes, 2);
    assert!(harness.platform.calls().is_empty());
}
