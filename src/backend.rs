use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::model::{Credentials, Session};

pub mod firebase;
mod firebase_types;
pub mod memory;

pub use firebase::{FirebaseBackend, FirebaseConfig};
pub use memory::MemoryBackend;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already in use")]
    EmailExists,
    #[error("password is too weak: {0}")]
    WeakPassword(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// `collection(name).order_by(field, direction).limit(n).get()`
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub collection: String,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            order_by: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// A document about to be written. Fields named in `server_timestamps` are
/// filled in by the store, never by the caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewDocument {
    pub fields: Map<String, Value>,
    pub server_timestamps: Vec<String>,
}

impl NewDocument {
    /// # Errors
    ///
    /// Will return `Err` if `value` does not serialize to a JSON object
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, BackendError> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self {
                fields,
                server_timestamps: Vec::new(),
            }),
            other => Err(BackendError::Parse(format!(
                "documents must be objects, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn with_server_timestamp(mut self, field: &str) -> Self {
        self.server_timestamps.push(field.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

impl StoredDocument {
    /// # Errors
    ///
    /// Will return `Err` if the stored fields don't match `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        serde_json::from_value(Value::Object(self.data.clone()))
            .map_err(|e| BackendError::Parse(format!("document {}: {e}", self.id)))
    }
}

/// Per-browser identity session. Every change of the signed-in user is
/// published on the channel returned by [`IdentityService::subscribe`].
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<Credentials, BackendError>;
    async fn sign_out(&self) -> Result<(), BackendError>;
    /// Removes the signed-in identity and signs out.
    async fn delete_current_user(&self) -> Result<(), BackendError>;
    /// Renews an expiring session; publishes a signed-out session when that fails.
    async fn refresh_session(&self) -> Result<(), BackendError> {
        Ok(())
    }
    fn current_user(&self) -> Option<Credentials>;
    /// The receiver holds the current session at subscription time.
    fn subscribe(&self) -> watch::Receiver<Session>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document with a generated id and returns that id.
    async fn add(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        doc: NewDocument,
    ) -> Result<String, BackendError>;
    async fn set(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        id: &str,
        doc: NewDocument,
    ) -> Result<(), BackendError>;
    async fn query(
        &self,
        auth: Option<&Credentials>,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, BackendError>;
}

/// Connection to a hosted backend: one identity session per browser, one
/// shared store.
pub trait Backend: Send + Sync {
    fn new_identity(&self) -> Arc<dyn IdentityService>;
    fn store(&self) -> Arc<dyn DocumentStore>;
}
