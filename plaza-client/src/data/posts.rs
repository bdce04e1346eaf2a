use crate::{
    cache::{QueryFilter, QueryKey, QueryKind},
    data::{DataAccess, require_owner},
    error::{ClientError, Result},
    feed::page_window,
};
use futures_util::TryFutureExt;
use plaza_common::{
    image::ImageUpload,
    model::{
        Id,
        post::{CreatePost, Post, PostMarker, PostUpdate},
        user::UserMarker,
    },
    validation::Content,
};
use std::sync::Arc;
use tracing::debug;

impl DataAccess {
    /// Page `page` of the feed, newest first.
    pub async fn posts_page(&self, page: u32) -> Result<Arc<Vec<Post>>> {
        let (limit, offset) = page_window(page);
        self.query(QueryKey::Posts { page }, move |client| async move {
            client.fetch_posts(limit, offset).await
        })
        .await
    }

    pub async fn user_posts(&self, user: Id<UserMarker>) -> Result<Arc<Vec<Post>>> {
        self.query(QueryKey::UserPosts { user }, move |client| async move {
            client.fetch_user_posts(user).await
        })
        .await
    }

    pub async fn post(&self, post: Id<PostMarker>) -> Result<Arc<Option<Post>>> {
        self.query(QueryKey::Post { post }, move |client| async move {
            client.fetch_post(post).await
        })
        .await
    }

    /// Stores `image` first when given, then the post referencing its preview URL.
    pub async fn create_post(
        &self,
        author: Id<UserMarker>,
        content: Content,
        image: Option<&ImageUpload>,
    ) -> Result<Post> {
        let stored = self.upload(image).await?;
        let create = CreatePost {
            author_id: author,
            content,
            image_url: stored.as_ref().map(|stored| stored.preview_url.clone()),
        };

        let post = self
            .cache
            .mutate(
                self.write_referencing(stored.as_ref(), self.client.create_post(&create)),
                &[
                    QueryFilter::Kind(QueryKind::Posts),
                    QueryFilter::Exact(QueryKey::UserPosts { user: author }),
                ],
            )
            .await?;

        debug!(post = %post.id, "Created post");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        actor: Id<UserMarker>,
        post: &Post,
        update: &PostUpdate,
    ) -> Result<Post> {
        require_owner(actor, post.author_id)?;

        self.cache
            .mutate(
                self.client.update_post(post.id, update).map_err(ClientError::from),
                &[
                    QueryFilter::Exact(QueryKey::Post { post: post.id }),
                    QueryFilter::Kind(QueryKind::Posts),
                ],
            )
            .await
    }

    pub async fn delete_post(&self, actor: Id<UserMarker>, post: &Post) -> Result<()> {
        require_owner(actor, post.author_id)?;

        self.cache
            .mutate(
                self.client.delete_post(post.id).map_err(ClientError::from),
                &[
                    QueryFilter::Kind(QueryKind::Posts),
                    QueryFilter::Exact(QueryKey::Post { post: post.id }),
                    QueryFilter::Exact(QueryKey::UserPosts {
                        user: post.author_id,
                    }),
                ],
            )
            .await
    }

    /// Whether `user` has a like on `post`.
    pub async fn liked(&self, post: Id<PostMarker>, user: Id<UserMarker>) -> Result<bool> {
        let liked: Arc<bool> = self
            .query(QueryKey::Liked { post, user }, move |client| async move {
                client
                    .find_user_like(post, user)
                    .await
                    .map(|like| like.is_some())
            })
            .await?;

        Ok(*liked)
    }

    /// Flips the like of `user` on `post` and returns whether it is now liked.
    ///
    /// The stored like is looked up first and then removed or added; the two steps are separate
    /// calls.
    pub async fn toggle_like(&self, post: Id<PostMarker>, user: Id<UserMarker>) -> Result<bool> {
        self.cache
            .mutate(
                self.flip_like(post, user),
                &[
                    QueryFilter::Kind(QueryKind::Posts),
                    QueryFilter::Exact(QueryKey::Post { post }),
                    QueryFilter::Exact(QueryKey::Liked { post, user }),
                ],
            )
            .await
    }

    async fn flip_like(&self, post: Id<PostMarker>, user: Id<UserMarker>) -> Result<bool> {
        match self.client.find_user_like(post, user).await? {
            Some(like) => {
                self.client.remove_like(post, like.id).await?;
                Ok(false)
            }
            None => {
                self.client.add_like(post, user).await?;
                Ok(true)
            }
        }
    }
}
