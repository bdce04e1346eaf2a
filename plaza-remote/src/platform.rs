//! Call-through traits for the hosted platform: managed auth, a document store and a blob store.

use async_trait::async_trait;
use plaza_common::{
    image::ImageUpload,
    model::{
        Id, ModelValidationError,
        file::FileMarker,
        user::{Account, UserMarker},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;

pub type Result<T, E = RemoteError> = std::result::Result<T, E>;

/// A failed remote call. Cloneable so one outcome can be handed to every waiter of a shared fetch.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum RemoteError {
    #[error("{message}")]
    Platform { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Platform response could not be decoded: {0}")]
    Decode(String),
    #[error("A document from the platform was invalid: {0}")]
    InvalidDocument(#[from] ModelValidationError),
}

impl RemoteError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Platform { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(value: serde_json::Error) -> Self {
        RemoteError::Decode(value.to_string())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Collection {
    Users,
    Posts,
    Comments,
    Likes,
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
            Collection::Likes => "likes",
        })
    }
}

/// One clause of a document listing, in the platform's JSON query syntax.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Query {
    Equal {
        attribute: String,
        values: Vec<String>,
    },
    OrderDesc {
        attribute: String,
    },
    OrderAsc {
        attribute: String,
    },
    Limit {
        values: [u32; 1],
    },
    Offset {
        values: [u32; 1],
    },
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ListQuery(Vec<Query>);

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equal(mut self, attribute: &str, value: impl Display) -> Self {
        self.0.push(Query::Equal {
            attribute: attribute.to_owned(),
            values: vec![value.to_string()],
        });
        self
    }

    #[must_use]
    pub fn order_desc(mut self, attribute: &str) -> Self {
        self.0.push(Query::OrderDesc {
            attribute: attribute.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn order_asc(mut self, attribute: &str) -> Self {
        self.0.push(Query::OrderAsc {
            attribute: attribute.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.0.push(Query::Limit { values: [limit] });
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.0.push(Query::Offset { values: [offset] });
        self
    }

    #[must_use]
    pub fn queries(&self) -> &[Query] {
        &self.0
    }

    #[must_use]
    pub fn get_limit(&self) -> Option<u32> {
        self.0.iter().rev().find_map(|query| match query {
            Query::Limit { values: [limit] } => Some(*limit),
            _ => None,
        })
    }

    #[must_use]
    pub fn get_offset(&self) -> Option<u32> {
        self.0.iter().rev().find_map(|query| match query {
            Query::Offset { values: [offset] } => Some(*offset),
            _ => None,
        })
    }
}

impl From<Vec<Query>> for ListQuery {
    fn from(value: Vec<Query>) -> Self {
        Self(value)
    }
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Value>,
}

#[async_trait]
pub trait AuthPlatform: Send + Sync {
    async fn create_account(
        &self,
        user_id: Id<UserMarker>,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account>;

    async fn create_session(&self, email: &str, password: &str) -> Result<()>;

    /// The identity behind the current session, `None` when there is no valid session.
    async fn current_account(&self) -> Result<Option<Account>>;

    async fn delete_current_session(&self) -> Result<()>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value>;

    async fn get_document(&self, collection: Collection, document_id: &str) -> Result<Value>;

    async fn update_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value>;

    async fn delete_document(&self, collection: Collection, document_id: &str) -> Result<()>;

    async fn list_documents(&self, collection: Collection, query: &ListQuery)
    -> Result<DocumentList>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn create_file(&self, file_id: Id<FileMarker>, upload: &ImageUpload) -> Result<()>;

    fn preview_url(&self, file_id: Id<FileMarker>) -> String;

    fn download_url(&self, file_id: Id<FileMarker>) -> String;

    async fn delete_file(&self, file_id: Id<FileMarker>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use crate::platform::ListQuery;
    use serde_json::json;

    #[test]
    fn queries_use_platform_json() {
        let query = ListQuery::new()
            .equal("postId", 42)
            .order_asc("createdAt")
            .limit(20)
            .offset(0);

        let encoded: Vec<_> = query
            .queries()
            .iter()
            .map(|query| serde_json::to_value(query).unwrap())
            .collect();

        assert_eq!(
            encoded,
            [
                json!({"method": "equal", "attribute": "postId", "values": ["42"]}),
                json!({"method": "orderAsc", "attribute": "createdAt"}),
                json!({"method": "limit", "values": [20]}),
                json!({"method": "offset", "values": [0]}),
            ]
        );
        assert_eq!(query.get_limit(), Some(20));
        assert_eq!(query.get_offset(), Some(0));
    }
}
