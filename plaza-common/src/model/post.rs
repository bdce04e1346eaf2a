use crate::{
    model::{Id, user::UserMarker},
    validation::Content,
};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub content: String,
    pub image_url: Option<String>,
    pub likes: u32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Post {
    #[must_use]
    pub fn is_owned_by(&self, user: Id<UserMarker>) -> bool {
        self.author_id == user
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    pub author_id: Id<UserMarker>,
    pub content: Content,
    pub image_url: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostUpdate {
    pub content: Option<Content>,
    pub image_url: Option<String>,
    pub likes: Option<u32>,
}
