use plaza_remote::http::{CollectionIds, HttpPlatformConfig};
use serde::Deserialize;

/// Process environment read at start-up.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Env {
    pub platform_endpoint: String,
    pub platform_project_id: String,
    pub platform_database_id: String,
    pub platform_users_collection: String,
    pub platform_posts_collection: String,
    pub platform_comments_collection: String,
    pub platform_likes_collection: String,
    pub platform_bucket_id: String,
}

impl Env {
    #[must_use]
    pub fn platform_config(self) -> HttpPlatformConfig {
        HttpPlatformConfig {
            endpoint: self.platform_endpoint,
            project_id: self.platform_project_id,
            database_id: self.platform_database_id,
            collections: CollectionIds {
                users: self.platform_users_collection,
                posts: self.platform_posts_collection,
                comments: self.platform_comments_collection,
                likes: self.platform_likes_collection,
            },
            bucket_id: self.platform_bucket_id,
        }
    }
}
