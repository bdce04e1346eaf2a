mod common;

use common::Harness;
use plaza_client::{error::ClientError, feed::FeedPager, forms::CreatePostForm, views::PostCard};
use plaza_common::{model::post::PostUpdate, validation::Content};
use plaza_remote::{
    memory::{Call, Operation},
    platform::{Collection, ListQuery},
};
use serde_json::json;
use std::{sync::Arc, time::Duration};

fn posts_listing(call: &Call) -> Option<&ListQuery> {
    match call {
        Call::ListDocuments {
            collection: Collection::Posts,
            query,
        } => Some(query),
        _ => None,
    }
}

#[tokio::test]
async fn page_n_lists_ten_posts_from_offset_ten_n() {
    let harness = Harness::new();

    for page in 0..4 {
        harness.data.posts_page(page).await.unwrap();
    }

    let queries: Vec<_> = harness
        .platform
        .calls()
        .iter()
        .filter_map(posts_listing)
        .cloned()
        .collect();
    let expected: Vec<_> = (0..4)
        .map(|page| {
            ListQuery::new()
                .order_desc("createdAt")
                .limit(10)
                .offset(page * 10)
        })
        .collect();
    assert_eq!(queries, expected);
}

#[tokio::test]
async fn pager_offers_next_only_after_a_full_page() {
    let harness = Harness::new();
    let (_, author) = harness.signed_up("Ada", "ada@example.com").await;
    for minute in 0..20 {
        harness.seed_post(
            author.id,
            &format!("post {minute}"),
            0,
            &format!("2025-02-01T10:{minute:02}:00Z"),
        );
    }

    let pager = FeedPager::new(harness.data.clone());
    assert!(!pager.previous().await.unwrap());
    pager.load(0).await.unwrap();
    let first = pager.current();
    assert_eq!(first.posts.len(), 10);
    assert_eq!(first.posts[0].content, "post 19");
    assert!(first.has_next());
    assert!(!first.has_previous());

    assert!(pager.next().await.unwrap());
    let second = pager.current();
    assert_eq!(second.page, 1);
    assert_eq!(second.posts[9].content, "post 0");
    assert!(second.has_previous());
    // Twenty posts fill page 1 exactly, so a third, empty page is still offered.
    assert!(second.has_next());

    assert!(pager.next().await.unwrap());
    assert!(pager.current().posts.is_empty());
    assert!(!pager.current().has_next());

    assert!(pager.previous().await.unwrap());
    assert_eq!(pager.current().page, 1);
}

#[tokio::test]
async fn hello_world_lands_on_top_of_the_feed() {
    let harness = Harness::new();
    let (session, author) = harness.signed_up("Ada", "ada@example.com").await;
    harness.seed_post(author.id, "older", 3, "2025-01-02T08:00:00Z");

    let pager = FeedPager::new(harness.data.clone());
    pager.load(0).await.unwrap();
    assert_eq!(pager.current().posts[0].content, "older");
    harness.platform.clear_calls();

    let mut form = CreatePostForm {
        content: "Hello world".to_owned(),
        ..CreatePostForm::default()
    };
    form.submit(&session, &harness.data).await.unwrap();
    assert!(form.content.is_empty());

    let creates: Vec<_> = harness
        .platform
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::CreateDocument {
                collection: Collection::Posts,
                data,
                ..
            } => Some(data),
            _ => None,
        })
        .collect();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0]["content"], json!("Hello world"));
    assert_eq!(creates[0]["imageUrl"], json!(""));
    assert_eq!(creates[0]["likes"], json!(0));
    assert_eq!(creates[0]["userId"], json!(author.id.to_string()));

    pager.refresh().await.unwrap();
    let page = pager.current();
    assert_eq!(page.posts.len(), 2);
    assert_eq!(page.posts[0].content, "Hello world");
    assert_eq!(page.posts[0].likes, 0);
    assert_eq!(page.posts[0].image_url, None);
    assert_eq!(
        harness
            .platform
            .count_calls(Operation::ListDocuments(Collection::Posts)),
        1
    );
}

#[tokio::test]
async fn shown_page_follows_the_background_refetch() {
    let harness = Harness::new();
    let (session, author) = harness.signed_up("Ada", "ada@example.com").await;
    harness.seed_post(author.id, "older", 0, "2025-01-02T08:00:00Z");

    let pager = FeedPager::new(harness.data.clone());
    pager.load(0).await.unwrap();
    assert_eq!(pager.current().posts[0].content, "older");

    let mut form = CreatePostForm {
        content: "Hello world".to_owned(),
        ..CreatePostForm::default()
    };
    form.submit(&session, &harness.data).await.unwrap();

    assert!(pager.changed().await);
    let page = pager.current();
    assert_eq!(page.posts.len(), 2);
    assert_eq!(page.posts[0].content, "Hello world");
    assert_eq!(
        harness
            .platform
            .count_calls(Operation::ListDocuments(Collection::Posts)),
        2
    );
}

#[tokio::test]
async fn empty_post_is_rejected_locally() {
    let harness = Harness::new();
    let (session, _) = harness.signed_up("Ada", "ada@example.com").await;

    let mut form = CreatePostForm {
        content: "   ".to_owned(),
        ..CreatePostForm::default()
    };
    form.submit(&session, &harness.data).await.unwrap_err();

    assert_eq!(form.alert.as_deref(), Some("Please write something"));
    assert_eq!(form.content, "   ");
    assert!(harness.platform.calls().is_empty());
}

#[tokio::test]
async fn failed_post_keeps_input_and_alerts() {
    let harness = Harness::new();
    let (session, _) = harness.signed_up("Ada", "ada@example.com").await;
    harness
        .platform
        .fail(Operation::CreateDocument(Collection::Posts), "Server Error");

    let mut form = CreatePostForm {
        content: "Hello world".to_owned(),
        ..CreatePostForm::default()
    };
    form.submit(&session, &harness.data).await.unwrap_err();

    assert_eq!(form.alert.as_deref(), Some("Failed to create post"));
    assert_eq!(form.content, "Hello world");
}

#[tokio::test(start_paused = true)]
async fn concurrent_page_loads_share_one_listing() {
    let harness = Harness::new();
    harness.platform.set_latency(Duration::from_millis(20));

    let (a, b) = tokio::join!(harness.data.posts_page(0), harness.data.posts_page(0));
    assert_eq!(a.unwrap(), b.unwrap());
    harness.data.posts_page(0).await.unwrap();
    assert_eq!(
        harness
            .platform
            .count_calls(Operation::ListDocuments(Collection::Posts)),
        1
    );

    tokio::time::advance(Duration::from_secs(5 * 60)).await;
    harness.data.posts_page(0).await.unwrap();
    assert_eq!(
        harness
            .platform
            .count_calls(Operation::ListDocuments(Collection::Posts)),
        2
    );
}

#[tokio::test]
async fn only_the_owner_edits_or_deletes_a_post() {
    let harness = Harness::new();
    let (owner_session, owner) = harness.signed_up("Ada", "ada@example.com").await;
    let (visitor, _) = harness.signed_up("Bea", "bea@example.com").await;
    let id = harness.seed_post(owner.id, "Draft", 0, "2025-02-01T10:00:00Z");
    let card = PostCard::load(harness.post(id).await, &visitor, &harness.data)
        .await
        .unwrap();
    assert!(!card.can_delete(&visitor));
    harness.platform.clear_calls();

    let err = card.delete(&visitor, &harness.data).await.unwrap_err();
    assert_eq!(err, ClientError::NotOwner);
    assert_eq!(card.alert().as_deref(), Some("Only the owner can do that"));
    assert!(harness.platform.calls().is_empty());

    let update = PostUpdate {
        content: Some(Content::new("Final").unwrap()),
        image_url: None,
        likes: None,
    };
    let edited = harness
        .data
        .update_post(owner.id, card.post(), &update)
        .await
        .unwrap();
    assert_eq!(edited.content, "Final");
    assert_eq!(harness.post(id).await.content, "Final");

    let pager = FeedPager::new(harness.data.clone());
    pager.load(0).await.unwrap();
    assert_eq!(pager.current().posts.len(), 1);

    assert!(card.can_delete(&owner_session));
    card.delete(&owner_session, &harness.data).await.unwrap();
    pager.refresh().await.unwrap();
    assert!(pager.current().posts.is_empty());
    assert_eq!(harness.data.post(id).await.unwrap(), Arc::new(None));
}

#[tokio::test]
async fn failed_delete_leaves_an_alert_on_the_card() {
    let harness = Harness::new();
    let (session, author) = harness.signed_up("Ada", "ada@example.com").await;
    let id = harness.seed_post(author.id, "Keep me", 0, "2025-02-01T10:00:00Z");
    let card = PostCard::load(harness.post(id).await, &session, &harness.data)
        .await
        .unwrap();
    harness
        .platform
        .fail(Operation::DeleteDocument(Collection::Posts), "Server Error");

    card.delete(&session, &harness.data).await.unwrap_err();
    assert_eq!(card.alert().as_deref(), Some("Failed to delete post"));
    assert!(harness.platform.document(Collection::Posts, &id.to_string()).is_some());

    harness
        .platform
        .recover(Operation::DeleteDocument(Collection::Posts));
    card.delete(&session, &harness.data).await.unwrap();
    assert_eq!(card.alert(), None);
}
