//! Cached reads and invalidating writes over the platform collections.

use crate::{
    cache::{QueryCache, QueryKey},
    error::{ClientError, Result},
};
use plaza_common::{
    image::ImageUpload,
    model::{
        Id,
        file::{FileMarker, StoredImage},
        user::UserMarker,
    },
};
use plaza_remote::{client::PlatformClient, platform::RemoteError};
use std::{future::Future, sync::Arc};
use tracing::{debug, warn};

mod comments;
mod posts;
mod profile;

#[derive(Clone)]
pub struct DataAccess {
    client: Arc<PlatformClient>,
    cache: QueryCache,
}

impl std::fmt::Debug for DataAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccess")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn require_owner(actor: Id<UserMarker>, owner: Id<UserMarker>) -> Result<()> {
    if actor == owner {
        Ok(())
    } else {
        Err(ClientError::NotOwner)
    }
}

impl DataAccess {
    #[must_use]
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self {
            client,
            cache: QueryCache::new(),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    #[must_use]
    pub fn client(&self) -> &Arc<PlatformClient> {
        &self.client
    }

    async fn query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<PlatformClient>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let value = self
            .cache
            .fetch(key, move || fetch(Arc::clone(&client)))
            .await?;

        Ok(value)
    }

    async fn upload(&self, image: Option<&ImageUpload>) -> Result<Option<StoredImage>> {
        match image {
            Some(image) => Ok(Some(self.client.upload_image(image).await?)),
            None => Ok(None),
        }
    }

    /// Runs the document write of an upload-then-reference pair.
    ///
    /// When it fails after an image was stored, the error names the file so the caller can
    /// [discard](DataAccess::discard_upload) it.
    async fn write_referencing<T>(
        &self,
        stored: Option<&StoredImage>,
        write: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T> {
        match (write.await, stored) {
            (Ok(value), _) => Ok(value),
            (Err(source), Some(stored)) => {
                warn!(file = %stored.file_id, %source, "Document write failed after upload");
                Err(ClientError::OrphanedUpload {
                    file: stored.file_id,
                    source,
                })
            }
            (Err(err), None) => Err(err.into()),
        }
    }

    /// Deletes an image that no document references.
    pub async fn discard_upload(&self, file: Id<FileMarker>) -> Result<()> {
        debug!(%file, "Discarding orphaned upload");
        self.client.delete_file(file).await?;

        Ok(())
    }
}
