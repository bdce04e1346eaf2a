use crate::{
    model::{Id, post::PostMarker, user::UserMarker},
    validation::Content,
};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub post_id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub content: String,
    pub created_at: OffsetDateTime,
}

impl Comment {
    #[must_use]
    pub fn is_authored_by(&self, user: Id<UserMarker>) -> bool {
        self.author_id == user
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateComment {
    pub post_id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub content: Content,
}
