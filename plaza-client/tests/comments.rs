mod common;

use common::Harness;
use plaza_client::{
    cache::{QueryKey, QueryObserver},
    error::ClientError,
    forms::CommentSection,
};
use plaza_common::model::{Id, comment::Comment};
use plaza_remote::{memory::Operation, platform::Collection};
use serde_json::json;

#[tokio::test]
async fn only_the_author_sees_the_delete_control() {
    let harness = Harness::new();
    let (session, viewer) = harness.signed_up("Bea", "bea@example.com").await;
    let post = harness.seed_post(viewer.id, "Thoughts?", 0, "2025-03-01T09:00:00Z");
    harness.platform.insert_document(
        Collection::Comments,
        "501",
        json!({
            "commentId": "501",
            "postId": post.to_string(),
            "userId": "999",
            "content": "Not yours",
            "createdAt": "2025-03-01T09:01:00Z",
        }),
    );

    let mut section = CommentSection::new(post);
    section.draft = "  Mine  ".to_owned();
    let own = section.submit(&session, &harness.data).await.unwrap();
    assert_eq!(own.content, "Mine");
    assert!(section.draft.is_empty());

    let comments = section.comments(&harness.data).await.unwrap();
    let contents: Vec<_> = comments.iter().map(|comment| comment.content.as_str()).collect();
    assert_eq!(contents, ["Not yours", "Mine"]);

    let foreign: &Comment = &comments[0];
    assert!(!section.can_delete(&session, foreign));
    assert!(section.can_delete(&session, &own));

    harness.platform.clear_calls();
    let err = section
        .delete(&session, &harness.data, foreign)
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::NotOwner);
    assert!(harness.platform.calls().is_empty());

    section.delete(&session, &harness.data, &own).await.unwrap();
    assert_eq!(
        harness
            .platform
            .count_calls(Operation::DeleteDocument(Collection::Comments)),
        1
    );
    let remaining = section.comments(&harness.data).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, Id::from(501));
}

#[tokio::test]
async fn new_comment_only_refreshes_its_thread() {
    let harness = Harness::new();
    let (session, viewer) = harness.signed_up("Bea", "bea@example.com").await;
    let post = harness.seed_post(viewer.id, "Thoughts?", 0, "2025-03-01T09:00:00Z");

    let _feed: QueryObserver = harness.data.cache().observe(QueryKey::Posts { page: 0 });
    let mut thread = harness.data.cache().observe(QueryKey::Comments { post });
    harness.data.posts_page(0).await.unwrap();
    harness.data.comments(post).await.unwrap();
    assert!(thread.changed().await);
    harness.platform.clear_calls();

    let mut section = CommentSection::new(post);
    section.draft = "First!".to_owned();
    section.submit(&session, &harness.data).await.unwrap();

    assert!(thread.changed().await);
    assert_eq!(
        harness
            .platform
            .count_calls(Operation::ListDocuments(Collection::Comments)),
        1
    );
    assert_eq!(
        harness
            .platform
            .count_calls(Operation::ListDocuments(Collection::Posts)),
        0
    );
}

#[tokio::test]
async fn failed_comment_keeps_draft() {
    let harness = Harness::new();
    let (session, viewer) = harness.signed_up("Bea", "bea@example.com").await;
    let post = harness.seed_post(viewer.id, "Thoughts?", 0, "2025-03-01T09:00:00Z");
    harness
        .platform
        .fail(Operation::CreateDocument(Collection::Comments), "Timeout");

    let mut section = CommentSection::new(post);
    section.draft = "Still here".to_owned();
    section.submit(&session, &harness.data).await.unwrap_err();

    assert_eq!(section.draft, "Still here");
    assert_eq!(section.alert.as_deref(), Some("Failed to post comment"));
}
