use crate::model::{Id, post::PostMarker, user::UserMarker};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct LikeMarker;

/// Join row between a post and a user who liked it.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Like {
    pub id: Id<LikeMarker>,
    pub post_id: Id<PostMarker>,
    pub user_id: Id<UserMarker>,
    pub created_at: OffsetDateTime,
}
