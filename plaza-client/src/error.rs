use plaza_common::{model::Id, model::file::FileMarker, validation::ValidationError};
use plaza_remote::platform::RemoteError;
use std::fmt::Display;
use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("You need to be logged in to do that")]
    NotAuthenticated,
    #[error("Only the owner can do that")]
    NotOwner,
    #[error("Image {file} was stored but the document referencing it was not: {source}")]
    OrphanedUpload {
        file: Id<FileMarker>,
        source: RemoteError,
    },
}

impl ClientError {
    /// The file left behind by a half-finished upload, if any.
    #[must_use]
    pub fn orphaned_file(&self) -> Option<Id<FileMarker>> {
        match self {
            ClientError::OrphanedUpload { file, .. } => Some(*file),
            _ => None,
        }
    }

    /// Text of the alert shown when `action` fails.
    ///
    /// Local rejections keep their own wording; remote failures get the generic text of the action.
    #[must_use]
    pub fn alert(&self, action: UserAction) -> String {
        match self {
            ClientError::Validation(_) | ClientError::NotAuthenticated | ClientError::NotOwner => {
                self.to_string()
            }
            ClientError::Remote(_) | ClientError::OrphanedUpload { .. } => action.to_string(),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum UserAction {
    CreatePost,
    DeletePost,
    CreateComment,
    DeleteComment,
    UpdateProfile,
}

impl Display for UserAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UserAction::CreatePost => "Failed to create post",
            UserAction::DeletePost => "Failed to delete post",
            UserAction::CreateComment => "Failed to post comment",
            UserAction::DeleteComment => "Failed to delete comment",
            UserAction::UpdateProfile => "Failed to update profile",
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{ClientError, UserAction};
    use plaza_common::validation::ValidationError;
    use plaza_remote::platform::RemoteError;

    #[test]
    fn remote_failures_alert_generically() {
        let err = ClientError::from(RemoteError::Platform {
            status: 500,
            message: "Server Error".to_owned(),
        });

        assert_eq!(err.to_string(), "Server Error");
        assert_eq!(err.alert(UserAction::CreatePost), "Failed to create post");
        assert_eq!(
            ClientError::from(ValidationError::EmptyContent).alert(UserAction::CreatePost),
            "Please write something"
        );
    }
}
