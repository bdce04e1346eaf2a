use crate::{
    cache::{QueryFilter, QueryKey, QueryKind},
    data::{DataAccess, require_owner},
    error::{ClientError, Result},
};
use futures_util::TryFutureExt;
use plaza_common::{
    image::ImageUpload,
    model::{
        Id,
        user::{Bio, CreateUser, DisplayName, ProfileUpdate, User, UserMarker},
    },
};
use std::sync::Arc;
use tracing::debug;

impl DataAccess {
    /// The profile document of `user`, `None` when none was ever created.
    pub async fn profile(&self, user: Id<UserMarker>) -> Result<Arc<Option<User>>> {
        self.query(QueryKey::UserProfile { user }, move |client| async move {
            client.fetch_user(user).await
        })
        .await
    }

    pub async fn create_profile(&self, user: &CreateUser) -> Result<User> {
        self.cache
            .mutate(
                self.client
                    .create_user_profile(user)
                    .map_err(ClientError::from),
                &[QueryFilter::Exact(QueryKey::UserProfile { user: user.id })],
            )
            .await
    }

    /// Writes name and bio of `user`, and a new profile image when one is given.
    pub async fn update_profile(
        &self,
        actor: Id<UserMarker>,
        user: Id<UserMarker>,
        name: DisplayName,
        bio: Bio,
        image: Option<&ImageUpload>,
    ) -> Result<User> {
        require_owner(actor, user)?;

        let stored = self.upload(image).await?;
        let update = ProfileUpdate {
            name,
            bio,
            profile_image: stored.as_ref().map(|stored| stored.preview_url.clone()),
        };

        let profile = self
            .cache
            .mutate(
                self.write_referencing(
                    stored.as_ref(),
                    self.client.update_user_profile(user, &update),
                ),
                &[
                    QueryFilter::Exact(QueryKey::UserProfile { user }),
                    QueryFilter::Kind(QueryKind::Posts),
                ],
            )
            .await?;

        debug!(%user, "Updated profile");
        Ok(profile)
    }
}
