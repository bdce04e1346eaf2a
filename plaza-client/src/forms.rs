//! State behind the login, signup, post composition, profile edit and comment forms.
//!
//! Local validation runs before any remote call. On failure a form keeps what the user typed.

use crate::{
    data::DataAccess,
    error::{ClientError, Result, UserAction},
    format::bio_counter,
    session::Session,
};
use plaza_common::{
    image::ImageUpload,
    model::{
        Id,
        comment::Comment,
        post::{Post, PostMarker},
        user::{Account, CreateUser, User, UserMarker},
    },
    validation::{self, Content},
};
use std::sync::Arc;
use tracing::error;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
}

impl LoginForm {
    pub async fn submit(&mut self, session: &Session) -> Result<Account> {
        self.error = None;
        let result = match validation::validate_login(&self.email, &self.password) {
            Ok(()) => session.login(&self.email, &self.password).await,
            Err(err) => Err(err.into()),
        };

        if let Err(err) = &result {
            self.error = Some(err.to_string());
        }
        result
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub error: Option<String>,
}

impl SignupForm {
    /// Registers the account, logs into it and creates its profile, in that order.
    pub async fn submit(&mut self, session: &Session, data: &DataAccess) -> Result<User> {
        self.error = None;
        let result = self.register(session, data).await;

        if let Err(err) = &result {
            self.error = Some(err.to_string());
        }
        result
    }

    async fn register(&self, session: &Session, data: &DataAccess) -> Result<User> {
        validation::validate_signup(
            &self.name,
            &self.email,
            &self.password,
            &self.confirm_password,
        )?;
        let name = validation::display_name(&self.name)?;

        let account = session
            .register(&self.email, &self.password, name.get())
            .await?;

        data.create_profile(&CreateUser {
            id: account.id,
            email: account.email,
            name,
        })
        .await
        .inspect_err(|err| error!(user = %account.id, %err, "Profile creation failed"))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreatePostForm {
    pub content: String,
    pub image: Option<ImageUpload>,
    pub alert: Option<String>,
}

impl CreatePostForm {
    /// Inline preview of the selected image.
    #[must_use]
    pub fn preview(&self) -> Option<String> {
        self.image.as_ref().map(ImageUpload::data_url)
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Publishes the post and clears the form. On failure the input stays for another attempt.
    pub async fn submit(&mut self, session: &Session, data: &DataAccess) -> Result<Post> {
        self.alert = None;
        let result = async {
            let author = session.require_user()?;
            let content = Content::new(&self.content)?;
            data.create_post(author.id, content, self.image.as_ref())
                .await
        }
        .await;

        match result {
            Ok(post) => {
                self.content.clear();
                self.image = None;
                Ok(post)
            }
            Err(err) => {
                error!(%err, "Creating post failed");
                self.alert = Some(err.alert(UserAction::CreatePost));
                Err(err)
            }
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct EditProfileForm {
    pub name: String,
    pub bio: String,
    pub image: Option<ImageUpload>,
    pub error: Option<String>,
}

impl EditProfileForm {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.get().to_owned(),
            bio: user.bio.get().to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn bio_counter(&self) -> String {
        bio_counter(&self.bio)
    }

    #[must_use]
    pub fn preview(&self) -> Option<String> {
        self.image.as_ref().map(ImageUpload::data_url)
    }

    pub async fn submit(
        &mut self,
        session: &Session,
        data: &DataAccess,
        user: Id<UserMarker>,
    ) -> Result<User> {
        self.error = None;
        let result = async {
            let actor = session.require_user()?;
            let name = validation::display_name(&self.name)?;
            let bio = validation::bio(&self.bio)?;
            data.update_profile(actor.id, user, name, bio, self.image.as_ref())
                .await
        }
        .await;

        match result {
            Ok(profile) => {
                self.image = None;
                Ok(profile)
            }
            Err(err) => {
                error!(%user, %err, "Updating profile failed");
                self.error = Some(err.alert(UserAction::UpdateProfile));
                Err(err)
            }
        }
    }
}

/// Comments under one post and the draft of a new one.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CommentSection {
    pub post: Id<PostMarker>,
    pub draft: String,
    pub alert: Option<String>,
}

impl CommentSection {
    #[must_use]
    pub fn new(post: Id<PostMarker>) -> Self {
        Self {
            post,
            draft: String::new(),
            alert: None,
        }
    }

    pub async fn comments(&self, data: &DataAccess) -> Result<Arc<Vec<Comment>>> {
        data.comments(self.post).await
    }

    /// The delete control is only shown to the comment's author.
    #[must_use]
    pub fn can_delete(&self, session: &Session, comment: &Comment) -> bool {
        session.is_current_user(comment.author_id)
    }

    pub async fn submit(&mut self, session: &Session, data: &DataAccess) -> Result<Comment> {
        self.alert = None;
        let result = async {
            let author = session.require_user()?;
            let content = Content::new(&self.draft)?;
            data.create_comment(author.id, self.post, content).await
        }
        .await;

        match result {
            Ok(comment) => {
                self.draft.clear();
                Ok(comment)
            }
            Err(err) => Err(self.alert_for(err, UserAction::CreateComment)),
        }
    }

    pub async fn delete(
        &mut self,
        session: &Session,
        data: &DataAccess,
        comment: &Comment,
    ) -> Result<()> {
        self.alert = None;
        let result = async {
            let actor = session.require_user()?;
            data.delete_comment(actor.id, comment).await
        }
        .await;

        result.map_err(|err| self.alert_for(err, UserAction::DeleteComment))
    }

    fn alert_for(&mut self, err: ClientError, action: UserAction) -> ClientError {
        error!(post = %self.post, %err, "{action}");
        self.alert = Some(err.alert(action));
        err
    }
}
