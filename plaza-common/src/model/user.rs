use crate::model::Id;
use thiserror::Error;
use time::OffsetDateTime;

pub const DISPLAY_NAME_MAX_LEN: usize = 128;
pub const BIO_MAX_LEN: usize = 500;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// Identity as the auth platform knows it.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Account {
    pub id: Id<UserMarker>,
    pub email: String,
    pub name: String,
}

/// Profile document for an account.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct User {
    pub id: Id<UserMarker>,
    pub email: String,
    pub name: DisplayName,
    pub bio: Bio,
    pub profile_image: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateUser {
    pub id: Id<UserMarker>,
    pub email: String,
    pub name: DisplayName,
}

/// Fields written by a profile edit. `profile_image` is only written when a new image was stored.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ProfileUpdate {
    pub name: DisplayName,
    pub bio: Bio,
    pub profile_image: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct DisplayName(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The display name is invalid: {0}")]
pub struct InvalidDisplayNameError(String);

impl DisplayName {
    pub fn new(name: String) -> Result<Self, InvalidDisplayNameError> {
        if name.chars().count() <= DISPLAY_NAME_MAX_LEN {
            Ok(Self(name))
        } else {
            Err(InvalidDisplayNameError(name))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Bio(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The bio has {0} characters, at most {BIO_MAX_LEN} are allowed")]
pub struct BioTooLongError(pub usize);

impl Bio {
    pub fn new(bio: String) -> Result<Self, BioTooLongError> {
        let len = bio.chars().count();
        if len <= BIO_MAX_LEN {
            Ok(Self(bio))
        } else {
            Err(BioTooLongError(len))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}
