//! A platform kept entirely in process memory.
//!
//! It records every call it receives and can be told to reject chosen operations, which makes
//! the multi-step flows of the client observable step by step.

use crate::platform::{
    AuthPlatform, BlobStore, Collection, DocumentList, DocumentStore, ListQuery, Query,
    RemoteError, Result,
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
use serde_json::{Map, Value};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub const DEFAULT_LIST_LIMIT: u32 = 25;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Operation {
    CreateAccount,
    CreateSession,
    GetAccount,
    DeleteSession,
    CreateDocument(Collection),
    GetDocument(Collection),
    UpdateDocument(Collection),
    DeleteDocument(Collection),
    ListDocuments(Collection),
    CreateFile,
    DeleteFile,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Call {
    CreateAccount {
        email: String,
    },
    CreateSession {
        email: String,
    },
    GetAccount,
    DeleteSession,
    CreateDocument {
        collection: Collection,
        document_id: String,
        data: Value,
    },
    GetDocument {
        collection: Collection,
        document_id: String,
    },
    UpdateDocument {
        collection: Collection,
        document_id: String,
        data: Value,
    },
    DeleteDocument {
        collection: Collection,
        document_id: String,
    },
    ListDocuments {
        collection: Collection,
        query: ListQuery,
    },
    CreateFile {
        file_id: String,
    },
    DeleteFile {
        file_id: String,
    },
}

impl Call {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Call::CreateAccount { .. } => Operation::CreateAccount,
            Call::CreateSession { .. } => Operation::CreateSession,
            Call::GetAccount => Operation::GetAccount,
            Call::DeleteSession => Operation::DeleteSession,
            Call::CreateDocument { collection, .. } => Operation::CreateDocument(*collection),
            Call::GetDocument { collection, .. } => Operation::GetDocument(*collection),
            Call::UpdateDocument { collection, .. } => Operation::UpdateDocument(*collection),
            Call::DeleteDocument { collection, .. } => Operation::DeleteDocument(*collection),
            Call::ListDocuments { collection, .. } => Operation::ListDocuments(*collection),
            Call::CreateFile { .. } => Operation::CreateFile,
            Call::DeleteFile { .. } => Operation::DeleteFile,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
struct StoredAccount {
    account: Account,
    password: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: Vec<StoredAccount>,
    session: Option<Id<UserMarker>>,
    collections: HashMap<Collection, Vec<(String, Value)>>,
    files: BTreeMap<String, ImageUpload>,
    failures: HashMap<Operation, String>,
    calls: Vec<Call>,
}

#[derive(Debug, Default)]
pub struct MemoryPlatform {
    state: Mutex<MemoryState>,
    latency: Mutex<Duration>,
}

fn platform_error(status: u16, message: &str) -> RemoteError {
    RemoteError::Platform {
        status,
        message: message.to_owned(),
    }
}

fn not_found() -> RemoteError {
    platform_error(404, "Document with the requested ID could not be found.")
}

impl MemoryPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call suspends for this long before it is served.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Rejects `operation` with `message` until [`MemoryPlatform::recover`] is called.
    pub fn fail(&self, operation: Operation, message: &str) {
        self.lock().failures.insert(operation, message.to_owned());
    }

    pub fn recover(&self, operation: Operation) {
        self.lock().failures.remove(&operation);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    #[must_use]
    pub fn count_calls(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    #[must_use]
    pub fn document(&self, collection: Collection, document_id: &str) -> Option<Value> {
        self.lock()
            .collections
            .get(&collection)?
            .iter()
            .find(|(id, _)| id == document_id)
            .map(|(_, document)| document.clone())
    }

    #[must_use]
    pub fn documents(&self, collection: Collection) -> Vec<Value> {
        self.lock()
            .collections
            .get(&collection)
            .map(|documents| documents.iter().map(|(_, document)| document.clone()).collect())
            .unwrap_or_default()
    }

    /// Stores a document directly, bypassing the call log.
    pub fn insert_document(&self, collection: Collection, document_id: &str, mut data: Value) {
        if let Some(fields) = data.as_object_mut() {
            fields.insert("$id".to_owned(), Value::String(document_id.to_owned()));
        }
        self.lock()
            .collections
            .entry(collection)
            .or_default()
            .push((document_id.to_owned(), data));
    }

    #[must_use]
    pub fn file_ids(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.lock().session.is_some()
    }

    async fn enter(&self, call: Call) -> Result<MutexGuard<'_, MemoryState>> {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        let operation = call.operation();
        state.calls.push(call);

        match state.failures.get(&operation) {
            Some(message) => Err(platform_error(500, message)),
            None => Ok(state),
        }
    }
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (
                OffsetDateTime::parse(a, &Rfc3339),
                OffsetDateTime::parse(b, &Rfc3339),
            ) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

fn field_matches(document: &Value, attribute: &str, values: &[String]) -> bool {
    let rendered = match document.get(attribute) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Number(value)) => value.to_string(),
        Some(Value::Bool(value)) => value.to_string(),
        _ => return false,
    };
    values.contains(&rendered)
}

fn run_query(documents: &[(String, Value)], query: &ListQuery) -> DocumentList {
    let mut selected: Vec<&Value> = documents
        .iter()
        .map(|(_, document)| document)
        .filter(|document| {
            query.queries().iter().all(|clause| match clause {
                Query::Equal { attribute, values } => field_matches(document, attribute, values),
                _ => true,
            })
        })
        .collect();

    for clause in query.queries().iter().rev() {
        match clause {
            Query::OrderAsc { attribute } => {
                selected.sort_by(|a, b| compare_fields(a.get(attribute), b.get(attribute)));
            }
            Query::OrderDesc { attribute } => {
                selected.sort_by(|a, b| compare_fields(b.get(attribute), a.get(attribute)));
            }
            _ => {}
        }
    }

    let total = selected.len() as u64;
    let offset = query.get_offset().unwrap_or(0) as usize;
    let limit = query.get_limit().unwrap_or(DEFAULT_LIST_LIMIT) as usize;

    DocumentList {
        total,
        documents: selected
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect(),
    }
}

#[async_trait]
impl AuthPlatform for MemoryPlatform {
    async fn create_account(
        &self,
        user_id: Id<UserMarker>,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account> {
        let mut state = self
            .enter(Call::CreateAccount {
                email: email.to_owned(),
            })
            .await?;

        if state
            .accounts
            .iter()
            .any(|stored| stored.account.email == email || stored.account.id == user_id)
        {
            return Err(platform_error(
                409,
                "A user with the same id, email, or phone already exists in this project.",
            ));
        }

        let account = Account {
            id: user_id,
            email: email.to_owned(),
            name: name.to_owned(),
        };
        state.accounts.push(StoredAccount {
            account: account.clone(),
            password: password.to_owned(),
        });

        Ok(account)
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<()> {
        let mut state = self
            .enter(Call::CreateSession {
                email: email.to_owned(),
            })
            .await?;

        let user_id = state
            .accounts
            .iter()
            .find(|stored| stored.account.email == email && stored.password == password)
            .map(|stored| stored.account.id)
            .ok_or_else(|| {
                platform_error(
                    401,
                    "Invalid credentials. Please check the email and password.",
                )
            })?;
        state.session = Some(user_id);

        Ok(())
    }

    async fn current_account(&self) -> Result<Option<Account>> {
        let state = self.enter(Call::GetAccount).await?;

        Ok(state.session.and_then(|user_id| {
            state
                .accounts
                .iter()
                .find(|stored| stored.account.id == user_id)
                .map(|stored| stored.account.clone())
        }))
    }

    async fn delete_current_session(&self) -> Result<()> {
        let mut state = self.enter(Call::DeleteSession).await?;

        if state.session.take().is_none() {
            return Err(platform_error(
                401,
                "User (role: guests) missing scope (account)",
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryPlatform {
    async fn create_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let mut state = self
            .enter(Call::CreateDocument {
                collection,
                document_id: document_id.to_owned(),
                data: data.clone(),
            })
            .await?;

        let documents = state.collections.entry(collection).or_default();
        if documents.iter().any(|(id, _)| id == document_id) {
            return Err(platform_error(
                409,
                "Document with the requested ID already exists.",
            ));
        }

        let mut fields = match data {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        fields.insert("$id".to_owned(), Value::String(document_id.to_owned()));
        let document = Value::Object(fields);
        documents.push((document_id.to_owned(), document.clone()));

        Ok(document)
    }

    async fn get_document(&self, collection: Collection, document_id: &str) -> Result<Value> {
        let state = self
            .enter(Call::GetDocument {
                collection,
                document_id: document_id.to_owned(),
            })
            .await?;

        state
            .collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|(id, _)| id == document_id))
            .map(|(_, document)| document.clone())
            .ok_or_else(not_found)
    }

    async fn update_document(
        &self,
        collection: Collection,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let mut state = self
            .enter(Call::UpdateDocument {
                collection,
                document_id: document_id.to_owned(),
                data: data.clone(),
            })
            .await?;

        let document = state
            .collections
            .get_mut(&collection)
            .and_then(|documents| documents.iter_mut().find(|(id, _)| id == document_id))
            .map(|(_, document)| document)
            .ok_or_else(not_found)?;

        if let (Some(stored), Value::Object(patch)) = (document.as_object_mut(), data) {
            stored.extend(patch);
        }

        Ok(document.clone())
    }

    async fn delete_document(&self, collection: Collection, document_id: &str) -> Result<()> {
        let mut state = self
            .enter(Call::DeleteDocument {
                collection,
                document_id: document_id.to_owned(),
            })
            .await?;

        let documents = state.collections.entry(collection).or_default();
        let before = documents.len();
        documents.retain(|(id, _)| id != document_id);

        if documents.len() == before {
            return Err(not_found());
        }

        Ok(())
    }

    async fn list_documents(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<DocumentList> {
        let state = self
            .enter(Call::ListDocuments {
                collection,
                query: query.clone(),
            })
            .await?;

        Ok(state
            .collections
            .get(&collection)
            .map(|documents| run_query(documents, query))
            .unwrap_or_default())
    }
}

#[async_trait]
impl BlobStore for MemoryPlatform {
    async fn create_file(&self, file_id: Id<FileMarker>, upload: &ImageUpload) -> Result<()> {
        let mut state = self
            .enter(Call::CreateFile {
                file_id: file_id.to_string(),
            })
            .await?;

        state.files.insert(file_id.to_string(), upload.clone());

        Ok(())
    }

    fn preview_url(&self, file_id: Id<FileMarker>) -> String {
        format!("memory://images/{file_id}/preview")
    }

    fn download_url(&self, file_id: Id<FileMarker>) -> String {
        format!("memory://images/{file_id}/download")
    }

    async fn delete_file(&self, file_id: Id<FileMarker>) -> Result<()> {
        let mut state = self
            .enter(Call::DeleteFile {
                file_id: file_id.to_string(),
            })
            .await?;

        state
            .files
            .remove(&file_id.to_string())
            .map(|_| ())
            .ok_or_else(|| platform_error(404, "The requested file could not be found."))
    }
}
