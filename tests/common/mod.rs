#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use clubhouse::PageClient;
use clubhouse::backend::{
    Backend, BackendError, DocumentStore, IdentityService, MemoryBackend, NewDocument, Query,
    StoredDocument,
};
use clubhouse::backend::memory::{MemoryIdentity, MemoryStore};
use clubhouse::model::{Credentials, Session};
use clubhouse::view::dom::Document;

pub const ALICE: &str = "alice@example.com";
pub const PASSWORD: &str = "hunter22";

/// Store whose writes and queries can be switched to fail.
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
    pub fail_writes: AtomicBool,
    pub fail_queries: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_queries: AtomicBool::new(false),
        }
    }

    fn unavailable() -> BackendError {
        BackendError::Status {
            status: 503,
            message: "UNAVAILABLE".into(),
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn add(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        doc: NewDocument,
    ) -> Result<String, BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.add(auth, collection, doc).await
    }

    async fn set(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        id: &str,
        doc: NewDocument,
    ) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.set(auth, collection, id, doc).await
    }

    async fn query(
        &self,
        auth: Option<&Credentials>,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, BackendError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.query(auth, query).await
    }
}

/// Identity whose account deletion can be switched to fail.
pub struct FlakyIdentity {
    pub inner: MemoryIdentity,
    pub fail_delete: AtomicBool,
}

#[async_trait]
impl IdentityService for FlakyIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        self.inner.sign_up(email, password).await
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.inner.sign_out().await
    }

    async fn delete_current_user(&self) -> Result<(), BackendError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BackendError::Network("connection reset".into()));
        }
        self.inner.delete_current_user().await
    }

    fn current_user(&self) -> Option<Credentials> {
        self.inner.current_user()
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.subscribe()
    }
}

/// A memory backend with failure switches on both services.
pub struct TestBackend {
    pub memory: MemoryBackend,
    pub store: Arc<FlakyStore>,
    pub fail_delete: Arc<AtomicBool>,
}

impl TestBackend {
    pub fn new() -> Self {
        let memory = MemoryBackend::new();
        let store = Arc::new(FlakyStore::new(memory.memory_store()));
        Self {
            memory,
            store,
            fail_delete: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn flaky_identity(&self) -> FlakyIdentity {
        FlakyIdentity {
            inner: self.memory.memory_identity(),
            fail_delete: AtomicBool::new(self.fail_delete.load(Ordering::SeqCst)),
        }
    }

    pub async fn client(&self) -> PageClient {
        PageClient::new(self.new_identity(), self.store(), Document::default()).await
    }
}

impl Backend for TestBackend {
    fn new_identity(&self) -> Arc<dyn IdentityService> {
        Arc::new(self.flaky_identity())
    }

    fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }
}

/// A client for an existing account, already signed in and settled.
pub async fn signed_in_client(backend: &TestBackend) -> PageClient {
    let mut client = backend.client().await;
    client
        .dispatch(clubhouse::mvu::page::Msg::SignInSubmitted {
            email: ALICE.into(),
            password: PASSWORD.into(),
        })
        .await;
    client
}
