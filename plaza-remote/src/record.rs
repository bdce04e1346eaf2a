use plaza_common::model::{
    Id, ModelValidationError,
    comment::Comment,
    like::Like,
    post::Post,
    user::{Account, Bio, DisplayName, User},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub(crate) struct AccountRecord {
    #[serde(rename = "$id")]
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserRecord {
    #[serde(rename = "$id")]
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostRecord {
    #[serde(rename = "$id")]
    pub id: String,
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentRecord {
    #[serde(rename = "$id")]
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LikeRecord {
    #[serde(rename = "$id")]
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserData<'a> {
    pub user_id: String,
    pub email: &'a str,
    pub name: &'a str,
    pub bio: &'a str,
    pub profile_image: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostData<'a> {
    pub post_id: String,
    pub user_id: String,
    pub content: &'a str,
    pub image_url: &'a str,
    pub likes: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentData<'a> {
    pub comment_id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LikeData {
    pub like_id: String,
    pub post_id: String,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Partial post write; absent fields keep their stored value.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u32>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfilePatch<'a> {
    pub name: &'a str,
    pub bio: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<&'a str>,
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl TryFrom<AccountRecord> for Account {
    type Error = ModelValidationError;

    fn try_from(value: AccountRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::parse(&value.id)?,
            email: value.email,
            name: value.name,
        })
    }
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::parse(&value.id)?,
            email: value.email,
            name: DisplayName::new(value.name)?,
            bio: Bio::new(value.bio)?,
            profile_image: non_empty(value.profile_image),
            created_at: value.created_at,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::parse(&value.id)?,
            author_id: Id::parse(&value.user_id)?,
            content: value.content,
            image_url: non_empty(value.image_url),
            likes: u32::try_from(value.likes)
                .map_err(|_| ModelValidationError::LikeCount(value.likes))?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::parse(&value.id)?,
            post_id: Id::parse(&value.post_id)?,
            author_id: Id::parse(&value.user_id)?,
            content: value.content,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<LikeRecord> for Like {
    type Error = ModelValidationError;

    fn try_from(value: LikeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::parse(&value.id)?,
            post_id: Id::parse(&value.post_id)?,
            user_id: Id::parse(&value.user_id)?,
            created_at: value.created_at,
        })
    }
}
