//! The platform's REST API over `reqwest`.

use crate::{
    platform::{
        AuthPlatform, BlobStore, Collection, DocumentList, DocumentStore, ListQuery, RemoteError,
        Result,
    },
    record::AccountRecord,
};
use async_trait::async_trait;
use plaza_common::{
    image::ImageUpload,
    model::{
        Id,
        file::FileMarker,
        user::{Account, UserMarker},
    },
};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, warn};

pub const PROJECT_HEADER: &str = "X-Platform-Project";

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CollectionIds {
    pub users: String,
    pub posts: String,
    pub comments: String,
    pub likes: String,
}

impl CollectionIds {
    fn get(&self, collection: Collection) -> &str {
        match collection {
            Collection::Users => &self.users,
            Collection::Posts => &self.posts,
            Collection::Comments => &self.comments,
            Collection::Likes => &self.likes,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct HttpPlatformConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collections: CollectionIds,
    pub bucket_id: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct PlatformErrorBody {
    message: String,
}

/// Auth, documents and files of one platform project. The session lives in the cookie store.
#[derive(Clone, Debug)]
pub struct HttpPlatform {
    client: Client,
    config: HttpPlatformConfig,
}

impl HttpPlatform {
    pub fn new(config: HttpPlatformConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().cookie_store(true).build()?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &HttpPlatformConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn documents_path(&self, collection: Collection) -> String {
        format!(
            "databases/{}/collections/{}/documents",
            self.config.database_id,
            self.config.collections.get(collection)
        )
    }

    fn document_path(&self, collection: Collection, document_id: &str) -> String {
        format!("{}/{document_id}", self.documents_path(collection))
    }

    fn file_path(&self, file_id: Id<FileMarker>) -> String {
        format!("storage/buckets/{}/files/{file_id}", self.config.bucket_id)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(PROJECT_HEADER, &self.config.project_id)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|err| RemoteError::Network(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .map_err(|err| RemoteError::Network(err.to_string()))?;
        let message = serde_json::from_str::<PlatformErrorBody>(&text).map_or_else(
            |_| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_owned()
            },
            |body| body.message,
        );

        warn!(%status, %message, "Platform rejected request");
        Err(RemoteError::Platform {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RemoteError::Network(err.to_string()))?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await.map(|_| ())
    }
}

#[async_trait]
impl AuthPlatform for HttpPlatform {
    async fn create_account(
        &self,
        user_id: Id<UserMarker>,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account> {
        debug!(user = %user_id, "Creating account");
        let body = json!({
            "userId": user_id.to_string(),
            "email": email,
            "password": password,
            "name": name,
        });
        let record: AccountRecord = self
            .send_json(self.client.post(self.url("account")).json(&body))
            .await?;

        Ok(record.try_into()?)
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<()> {
        debug!("Creating email session");
        let body = json!({ "email": email, "password": password });
        self.send_empty(
            self.client
                .post(self.url("account/sessions/email"))
                .json(&body),
        )
        .await
    }

    async fn current_account(&self) -> Result<Option<Account>> {
        match self
            .send_json::<AccountRecord>(self.client.get(self.url("account")))
            .await
        {
            Ok(record) => Ok(Some(record.try_into()?)),
            Err(err) if err.status() == Some(StatusCode::UNAUTHORIZED.as_u16()) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn delete_current_session(&self) -> Result<()> {
        debug!("Deleting current session");
        self.send_empty(self.client.delete(self.url("account/sessions/current")))
            .await
    }
}

#[async_trait]
impl DocumentStore for HttpPlatform {
    async fn create_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let body = json!({ "documentId": document_id, "data": data });
        self.send_json(
            self.client
                .post(self.url(&self.documents_path(collection)))
                .json(&body),
        )
        .await
    }

    async fn get_document(&self, collection: Collection, document_id: &str) -> Result<Value> {
        let url = self.url(&self.document_path(collection, document_id));
        self.send_json(self.client.get(url)).await
    }

    async fn update_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        self.send_json(
            self.client
                .patch(self.url(&self.document_path(collection, document_id)))
                .json(&json!({ "data": data })),
        )
        .await
    }

    async fn delete_document(&self, collection: Collection, document_id: &str) -> Result<()> {
        let url = self.url(&self.document_path(collection, document_id));
        self.send_empty(self.client.delete(url)).await
    }

    async fn list_documents(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<DocumentList> {
        let queries = query
            .queries()
            .iter()
            .map(|query| serde_json::to_string(query).map(|json| ("queries[]", json)))
            .collect::<Result<Vec<_>, _>>()?;

        self.send_json(
            self.client
                .get(self.url(&self.documents_path(collection)))
                .query(&queries),
        )
        .await
    }
}

#[async_trait]
impl BlobStore for HttpPlatform {
    async fn create_file(&self, file_id: Id<FileMarker>, upload: &ImageUpload) -> Result<()> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|err| RemoteError::Decode(err.to_string()))?;
        let form = Form::new()
            .text("fileId", file_id.to_string())
            .part("file", part);

        let url = self.url(&format!("storage/buckets/{}/files", self.config.bucket_id));
        self.send_empty(self.client.post(url).multipart(form)).await
    }

    fn preview_url(&self, file_id: Id<FileMarker>) -> String {
        format!(
            "{}/preview?project={}",
            self.url(&self.file_path(file_id)),
            self.config.project_id
        )
    }

    fn download_url(&self, file_id: Id<FileMarker>) -> String {
        format!(
            "{}/download?project={}",
            self.url(&self.file_path(file_id)),
            self.config.project_id
        )
    }

    async fn delete_file(&self, file_id: Id<FileMarker>) -> Result<()> {
        self.send_empty(self.client.delete(self.url(&self.file_path(file_id))))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        http::{CollectionIds, HttpPlatform, HttpPlatformConfig},
        platform::{BlobStore, Collection},
    };
    use plaza_common::model::Id;

    fn platform() -> HttpPlatform {
        HttpPlatform::new(HttpPlatformConfig {
            endpoint: "https://cloud.example.com/v1/".to_owned(),
            project_id: "plaza".to_owned(),
            database_id: "main".to_owned(),
            collections: CollectionIds {
                users: "users".to_owned(),
                posts: "posts".to_owned(),
                comments: "comments".to_owned(),
                likes: "likes".to_owned(),
            },
            bucket_id: "images".to_owned(),
        })
        .unwrap()
    }

    #[test]
    fn file_urls_are_derived_locally() {
        let platform = platform();
        let file_id = Id::from(99);

        assert_eq!(
            platform.preview_url(file_id),
            "https://cloud.example.com/v1/storage/buckets/images/files/99/preview?project=plaza"
        );
        assert_eq!(
            platform.download_url(file_id),
            "https://cloud.example.com/v1/storage/buckets/images/files/99/download?project=plaza"
        );
    }

    #[test]
    fn document_paths_use_configured_ids() {
        let platform = platform();

        assert_eq!(
            platform.url(&platform.document_path(Collection::Comments, "7")),
            "https://cloud.example.com/v1/databases/main/collections/comments/documents/7"
        );
    }
}
