//! Display surfaces: post cards and profile pages.

use crate::{
    data::DataAccess,
    error::{Result, UserAction},
    format::{avatar_initial, relative_time},
    forms::EditProfileForm,
    mutation::{LikeState, MutationPhase, Optimistic, Tentative},
    session::Session,
};
use plaza_common::model::{
    Id,
    post::Post,
    user::{User, UserMarker},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use tracing::{error, warn};

/// One post in the feed or on a profile, with its optimistic like state.
#[derive(Debug)]
pub struct PostCard {
    post: Post,
    like: Mutex<Optimistic<LikeState>>,
    alert: Mutex<Option<String>>,
}

impl PostCard {
    #[must_use]
    pub fn new(post: Post, liked: bool) -> Self {
        let like = LikeState {
            liked,
            likes: post.likes,
        };

        Self {
            post,
            like: Mutex::new(Optimistic::new(like)),
            alert: Mutex::default(),
        }
    }

    /// Builds the card with the viewer's own like state looked up.
    pub async fn load(post: Post, session: &Session, data: &DataAccess) -> Result<Self> {
        let liked = match session.current_user() {
            Some(account) => data.liked(post.id, account.id).await?,
            None => false,
        };

        Ok(Self::new(post, liked))
    }

    fn lock(&self) -> MutexGuard<'_, Optimistic<LikeState>> {
        self.like.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_alert(&self) -> MutexGuard<'_, Option<String>> {
        self.alert.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Alert left by the last failed delete.
    #[must_use]
    pub fn alert(&self) -> Option<String> {
        self.lock_alert().clone()
    }

    #[must_use]
    pub fn post(&self) -> &Post {
        &self.post
    }

    #[must_use]
    pub fn like_state(&self) -> LikeState {
        *self.lock().displayed()
    }

    #[must_use]
    pub fn like_phase(&self) -> MutationPhase {
        self.lock().phase()
    }

    #[must_use]
    pub fn posted(&self, now: OffsetDateTime) -> String {
        relative_time(self.post.created_at, now)
    }

    /// The delete control is only shown to the post's owner.
    #[must_use]
    pub fn can_delete(&self, session: &Session) -> bool {
        session.is_current_user(self.post.author_id)
    }

    /// Flips the displayed like right away.
    pub fn begin_like(&self) -> Tentative<LikeState> {
        self.lock().apply(|state| state.toggled())
    }

    /// Settles a flip started with [`PostCard::begin_like`]. A failure restores the prior state.
    pub fn finish_like(&self, tentative: Tentative<LikeState>, succeeded: bool) {
        let mut like = self.lock();
        if succeeded {
            like.commit(tentative);
        } else if like.revert(tentative) {
            warn!(post = %self.post.id, "Rolled back like");
        }
    }

    /// Takes in a confirmed post, e.g. after the feed was refetched.
    pub fn sync(&self, post: &Post, liked: bool) -> bool {
        self.lock().sync(LikeState {
            liked,
            likes: post.likes,
        })
    }

    /// Optimistically toggles the like of the current user.
    ///
    /// A failure rolls the display back without an alert; the error is still returned.
    pub async fn toggle_like(&self, session: &Session, data: &DataAccess) -> Result<LikeState> {
        let account = session.require_user()?;

        let tentative = self.begin_like();
        let result = data.toggle_like(self.post.id, account.id).await;
        self.finish_like(tentative, result.is_ok());

        result.map(|_| self.like_state())
    }

    pub async fn delete(&self, session: &Session, data: &DataAccess) -> Result<()> {
        *self.lock_alert() = None;
        let result = match session.require_user() {
            Ok(account) => data.delete_post(account.id, &self.post).await,
            Err(err) => Err(err),
        };

        result.inspect_err(|err| {
            let alert = err.alert(UserAction::DeletePost);
            error!(post = %self.post.id, %err, "{alert}");
            *self.lock_alert() = Some(alert);
        })
    }
}

/// Loaded contents of a profile page.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Profile {
    pub user: Arc<Option<User>>,
    pub posts: Arc<Vec<Post>>,
}

impl Profile {
    /// Name shown in the header; falls back to a placeholder for users without a profile.
    #[must_use]
    pub fn display_name(&self) -> &str {
        Option::as_ref(&self.user).map_or("Unknown user", |user| user.name.get())
    }

    #[must_use]
    pub fn avatar_initial(&self) -> String {
        avatar_initial(self.display_name())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct ProfilePage {
    pub user: Id<UserMarker>,
}

impl ProfilePage {
    #[must_use]
    pub fn new(user: Id<UserMarker>) -> Self {
        Self { user }
    }

    pub async fn load(&self, data: &DataAccess) -> Result<Profile> {
        let (user, posts) =
            tokio::try_join!(data.profile(self.user), data.user_posts(self.user))?;

        Ok(Profile { user, posts })
    }

    /// The edit control is only shown on one's own profile.
    #[must_use]
    pub fn can_edit(&self, session: &Session) -> bool {
        session.is_current_user(self.user)
    }

    #[must_use]
    pub fn edit_form(&self, profile: &Profile) -> Option<EditProfileForm> {
        Option::as_ref(&profile.user).map(EditProfileForm::from_user)
    }
}
