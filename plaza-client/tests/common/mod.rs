#![allow(dead_code)]

use plaza_client::{data::DataAccess, forms::SignupForm, session::Session};
use plaza_common::model::{
    Id,
    post::{Post, PostMarker},
    user::{User, UserMarker},
};
use plaza_remote::{
    client::PlatformClient, ids::IdGenerator, memory::MemoryPlatform, platform::Collection,
};
use serde_json::json;
use std::sync::Arc;

pub const PASSWORD: &str = "correct horse";

pub struct Harness {
    pub platform: Arc<MemoryPlatform>,
    pub ids: Arc<IdGenerator>,
    pub data: DataAccess,
}

impl Harness {
    pub fn new() -> Self {
        let platform = Arc::new(MemoryPlatform::new());
        let ids = Arc::new(IdGenerator::random());
        let client = PlatformClient::new(platform.clone(), platform.clone(), Arc::clone(&ids));

        Self {
            platform,
            ids,
            data: DataAccess::new(Arc::new(client)),
        }
    }

    pub async fn session(&self) -> Session {
        Session::init(self.platform.clone(), Arc::clone(&self.ids)).await
    }

    /// A session signed up through the signup form, with the call log cleared afterwards.
    pub async fn signed_up(&self, name: &str, email: &str) -> (Session, User) {
        let session = self.session().await;
        let mut form = SignupForm {
            name: name.to_owned(),
            email: email.to_owned(),
            password: PASSWORD.to_owned(),
            confirm_password: PASSWORD.to_owned(),
            error: None,
        };
        let user = form.submit(&session, &self.data).await.unwrap();
        self.platform.clear_calls();

        (session, user)
    }

    pub fn seed_post(
        &self,
        author: Id<UserMarker>,
        content: &str,
        likes: i64,
        created_at: &str,
    ) -> Id<PostMarker> {
        let id: Id<PostMarker> = self.ids.generate();
        self.platform.insert_document(
            Collection::Posts,
            &id.to_string(),
            json!({
                "postId": id.to_string(),
                "userId": author.to_string(),
                "content": content,
                "imageUrl": "",
                "likes": likes,
                "createdAt": created_at,
                "updatedAt": created_at,
            }),
        );
        id
    }

    /// The stored post as the data layer reads it.
    pub async fn post(&self, id: Id<PostMarker>) -> Post {
        Option::clone(&self.data.post(id).await.unwrap()).unwrap()
    }
}
