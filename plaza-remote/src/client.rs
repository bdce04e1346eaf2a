use crate::{
    ids::IdGenerator,
    platform::{BlobStore, Collection, DocumentStore, ListQuery, Result},
    record::{
        CommentData, CommentRecord, LikeData, LikeRecord, PostData, PostPatch, PostRecord,
        ProfilePatch, UserData, UserRecord,
    },
};
use plaza_common::{
    image::ImageUpload,
    model::{
        Id, ModelValidationError,
        comment::{Comment, CommentMarker, CreateComment},
        file::{FileMarker, StoredImage},
        like::{Like, LikeMarker},
        post::{CreatePost, Post, PostMarker, PostUpdate},
        user::{CreateUser, ProfileUpdate, User, UserMarker},
    },
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

pub const USER_POSTS_LIMIT: u32 = 20;
pub const COMMENTS_LIMIT: u32 = 20;

fn decode<R, M>(document: Value) -> Result<M>
where
    R: DeserializeOwned,
    M: TryFrom<R, Error = ModelValidationError>,
{
    let record: R = serde_json::from_value(document)?;
    Ok(M::try_from(record)?)
}

fn decode_all<R, M>(documents: Vec<Value>) -> Result<Vec<M>>
where
    R: DeserializeOwned,
    M: TryFrom<R, Error = ModelValidationError>,
{
    documents.into_iter().map(decode::<R, M>).collect()
}

fn encode<T: Serialize>(data: &T) -> Result<Value> {
    Ok(serde_json::to_value(data)?)
}

/// Typed access to the four collections and the image bucket.
///
/// Every method is one remote call or a fixed, non-atomic sequence of them; nothing here retries
/// or compensates.
pub struct PlatformClient {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    ids: Arc<IdGenerator>,
}

impl PlatformClient {
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        ids: Arc<IdGenerator>,
    ) -> Self {
        Self {
            documents,
            blobs,
            ids,
        }
    }

    #[must_use]
    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    pub async fn create_user_profile(&self, user: &CreateUser) -> Result<User> {
        let data = UserData {
            user_id: user.id.to_string(),
            email: &user.email,
            name: user.name.get(),
            bio: "",
            profile_image: "",
            created_at: OffsetDateTime::now_utc(),
        };

        debug!(user = %user.id, "Creating user profile");
        let document = self
            .documents
            .create_document(Collection::Users, &user.id.to_string(), encode(&data)?)
            .await?;

        decode::<UserRecord, _>(document)
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        debug!(user = %user_id, "Fetching user profile");
        match self
            .documents
            .get_document(Collection::Users, &user_id.to_string())
            .await
        {
            Ok(document) => decode::<UserRecord, _>(document).map(Some),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn update_user_profile(
        &self,
        user_id: Id<UserMarker>,
        update: &ProfileUpdate,
    ) -> Result<User> {
        let patch = ProfilePatch {
            name: update.name.get(),
            bio: update.bio.get(),
            profile_image: update.profile_image.as_deref(),
        };

        debug!(user = %user_id, "Updating user profile");
        let document = self
            .documents
            .update_document(Collection::Users, &user_id.to_string(), encode(&patch)?)
            .await?;

        decode::<UserRecord, _>(document)
    }

    pub async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let post_id: Id<PostMarker> = self.ids.generate();
        let now = OffsetDateTime::now_utc();
        let data = PostData {
            post_id: post_id.to_string(),
            user_id: post.author_id.to_string(),
            content: post.content.get(),
            image_url: post.image_url.as_deref().unwrap_or_default(),
            likes: 0,
            created_at: now,
            updated_at: now,
        };

        debug!(post = %post_id, author = %post.author_id, "Creating post");
        let document = self
            .documents
            .create_document(Collection::Posts, &post_id.to_string(), encode(&data)?)
            .await?;

        decode::<PostRecord, _>(document)
    }

    /// Newest first, `limit` posts starting at `offset`.
    pub async fn fetch_posts(&self, limit: u32, offset: u32) -> Result<Vec<Post>> {
        let query = ListQuery::new()
            .order_desc("createdAt")
            .limit(limit)
            .offset(offset);

        debug!(limit, offset, "Listing posts");
        let list = self
            .documents
            .list_documents(Collection::Posts, &query)
            .await?;

        decode_all::<PostRecord, _>(list.documents)
    }

    pub async fn fetch_user_posts(&self, user_id: Id<UserMarker>) -> Result<Vec<Post>> {
        let query = ListQuery::new()
            .equal("userId", user_id)
            .order_desc("createdAt")
            .limit(USER_POSTS_LIMIT)
            .offset(0);

        debug!(user = %user_id, "Listing user posts");
        let list = self
            .documents
            .list_documents(Collection::Posts, &query)
            .await?;

        decode_all::<PostRecord, _>(list.documents)
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        match self.get_post(post_id).await {
            Ok(post) => Ok(Some(post)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn get_post(&self, post_id: Id<PostMarker>) -> Result<Post> {
        debug!(post = %post_id, "Fetching post");
        let document = self
            .documents
            .get_document(Collection::Posts, &post_id.to_string())
            .await?;

        decode::<PostRecord, _>(document)
    }

    pub async fn update_post(&self, post_id: Id<PostMarker>, update: &PostUpdate) -> Result<Post> {
        let patch = PostPatch {
            content: update.content.as_ref().map(|content| content.get()),
            image_url: update.image_url.as_deref(),
            likes: update.likes,
            updated_at: OffsetDateTime::now_utc(),
        };

        debug!(post = %post_id, "Updating post");
        let document = self
            .documents
            .update_document(Collection::Posts, &post_id.to_string(), encode(&patch)?)
            .await?;

        decode::<PostRecord, _>(document)
    }

    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<()> {
        debug!(post = %post_id, "Deleting post");
        self.documents
            .delete_document(Collection::Posts, &post_id.to_string())
            .await
    }

    pub async fn find_user_like(
        &self,
        post_id: Id<PostMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<Option<Like>> {
        let query = ListQuery::new()
            .equal("postId", post_id)
            .equal("userId", user_id);

        debug!(post = %post_id, user = %user_id, "Looking up like");
        let list = self
            .documents
            .list_documents(Collection::Likes, &query)
            .await?;

        let likes = decode_all::<LikeRecord, Like>(list.documents)?;
        Ok(likes.into_iter().next())
    }

    /// Inserts the like row, then rewrites the post's counter from a fresh read.
    pub async fn add_like(&self, post_id: Id<PostMarker>, user_id: Id<UserMarker>) -> Result<Like> {
        let like_id: Id<LikeMarker> = self.ids.generate();
        let data = LikeData {
            like_id: like_id.to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };

        debug!(post = %post_id, user = %user_id, "Adding like");
        let document = self
            .documents
            .create_document(Collection::Likes, &like_id.to_string(), encode(&data)?)
            .await?;
        let like = decode::<LikeRecord, _>(document)?;

        let post = self.get_post(post_id).await?;
        let update = PostUpdate {
            likes: Some(post.likes.saturating_add(1)),
            ..PostUpdate::default()
        };
        self.update_post(post_id, &update).await?;

        Ok(like)
    }

    /// Deletes the like row, then rewrites the post's counter from a fresh read, never below zero.
    pub async fn remove_like(&self, post_id: Id<PostMarker>, like_id: Id<LikeMarker>) -> Result<()> {
        debug!(post = %post_id, like = %like_id, "Removing like");
        self.documents
            .delete_document(Collection::Likes, &like_id.to_string())
            .await?;

        let post = self.get_post(post_id).await?;
        let update = PostUpdate {
            likes: Some(post.likes.saturating_sub(1)),
            ..PostUpdate::default()
        };
        self.update_post(post_id, &update).await?;

        Ok(())
    }

    pub async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let comment_id: Id<CommentMarker> = self.ids.generate();
        let data = CommentData {
            comment_id: comment_id.to_string(),
            post_id: comment.post_id.to_string(),
            user_id: comment.author_id.to_string(),
            content: comment.content.get(),
            created_at: OffsetDateTime::now_utc(),
        };

        debug!(comment = %comment_id, post = %comment.post_id, "Creating comment");
        let document = self
            .documents
            .create_document(Collection::Comments, &comment_id.to_string(), encode(&data)?)
            .await?;

        decode::<CommentRecord, _>(document)
    }

    /// Oldest first.
    pub async fn fetch_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let query = ListQuery::new()
            .equal("postId", post_id)
            .order_asc("createdAt")
            .limit(COMMENTS_LIMIT)
            .offset(0);

        debug!(post = %post_id, "Listing comments");
        let list = self
            .documents
            .list_documents(Collection::Comments, &query)
            .await?;

        decode_all::<CommentRecord, _>(list.documents)
    }

    pub async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<()> {
        debug!(comment = %comment_id, "Deleting comment");
        self.documents
            .delete_document(Collection::Comments, &comment_id.to_string())
            .await
    }

    pub async fn upload_image(&self, upload: &ImageUpload) -> Result<StoredImage> {
        let file_id: Id<FileMarker> = self.ids.generate();

        debug!(file = %file_id, ?upload, "Uploading image");
        self.blobs.create_file(file_id, upload).await?;

        Ok(StoredImage {
            file_id,
            preview_url: self.blobs.preview_url(file_id),
            download_url: self.blobs.download_url(file_id),
        })
    }

    pub async fn delete_file(&self, file_id: Id<FileMarker>) -> Result<()> {
        debug!(file = %file_id, "Deleting file");
        self.blobs.delete_file(file_id).await
    }
}
