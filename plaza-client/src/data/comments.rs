use crate::{
    cache::{QueryFilter, QueryKey},
    data::{DataAccess, require_owner},
    error::{ClientError, Result},
};
use futures_util::TryFutureExt;
use plaza_common::{
    model::{
        Id,
        comment::{Comment, CreateComment},
        post::PostMarker,
        user::UserMarker,
    },
    validation::Content,
};
use std::sync::Arc;

impl DataAccess {
    /// The first comments on `post`, oldest first.
    pub async fn comments(&self, post: Id<PostMarker>) -> Result<Arc<Vec<Comment>>> {
        self.query(QueryKey::Comments { post }, move |client| async move {
            client.fetch_comments(post).await
        })
        .await
    }

    pub async fn create_comment(
        &self,
        author: Id<UserMarker>,
        post: Id<PostMarker>,
        content: Content,
    ) -> Result<Comment> {
        let create = CreateComment {
            post_id: post,
            author_id: author,
            content,
        };

        self.cache
            .mutate(
                self.client.create_comment(&create).map_err(ClientError::from),
                &[QueryFilter::Exact(QueryKey::Comments { post })],
            )
            .await
    }

    pub async fn delete_comment(&self, actor: Id<UserMarker>, comment: &Comment) -> Result<()> {
        require_owner(actor, comment.author_id)?;

        self.cache
            .mutate(
                self.client
                    .delete_comment(comment.id)
                    .map_err(ClientError::from),
                &[QueryFilter::Exact(QueryKey::Comments {
                    post: comment.post_id,
                })],
            )
            .await
    }
}
