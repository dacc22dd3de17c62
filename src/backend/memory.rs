use ahash::AHashMap;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

use super::{
    Backend, BackendError, Direction, DocumentStore, IdentityService, NewDocument, Query,
    StoredDocument,
};
use crate::model::{Credentials, Session};

const MIN_PASSWORD_LEN: usize = 6;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Debug)]
struct Account {
    uid: String,
    password: String,
}

type Accounts = Arc<Mutex<AHashMap<String, Account>>>;

/// Process-local stand-in for the hosted backend. Used for development and
/// by the test-suite.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    accounts: Accounts,
    store: Arc<MemoryStore>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account without signing anybody in. Returns the uid.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the email is taken or the password is too short
    pub fn create_account(&self, email: &str, password: &str) -> Result<String, BackendError> {
        register(&self.accounts, email, password).map(|c| c.uid)
    }

    #[must_use]
    pub fn memory_store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn memory_identity(&self) -> MemoryIdentity {
        MemoryIdentity::new(Arc::clone(&self.accounts))
    }
}

impl Backend for MemoryBackend {
    fn new_identity(&self) -> Arc<dyn IdentityService> {
        Arc::new(self.memory_identity())
    }

    fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn register(accounts: &Accounts, email: &str, password: &str) -> Result<Credentials, BackendError> {
    let email = normalize_email(email);
    if !email.contains('@') {
        return Err(BackendError::Other("INVALID_EMAIL".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BackendError::WeakPassword(format!(
            "Password should be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let mut accounts = lock(accounts);
    if accounts.contains_key(&email) {
        return Err(BackendError::EmailExists);
    }
    let uid = uuid::Uuid::new_v4().simple().to_string();
    accounts.insert(
        email.clone(),
        Account {
            uid: uid.clone(),
            password: password.to_string(),
        },
    );
    Ok(Credentials {
        uid,
        email,
        id_token: None,
    })
}

pub struct MemoryIdentity {
    accounts: Accounts,
    session: watch::Sender<Session>,
}

impl MemoryIdentity {
    fn new(accounts: Accounts) -> Self {
        let (session, _) = watch::channel(Session::signed_out());
        Self { accounts, session }
    }

    /// Ends the session from the provider's side, as a revoked or expired
    /// token would. Subscribers see a signed-out session.
    pub fn expire(&self) {
        self.session.send_replace(Session::signed_out());
    }
}

#[async_trait]
impl IdentityService for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        let email = normalize_email(email);
        let credentials = {
            let accounts = lock(&self.accounts);
            match accounts.get(&email) {
                Some(account) if account.password == password => Credentials {
                    uid: account.uid.clone(),
                    email,
                    id_token: None,
                },
                _ => return Err(BackendError::InvalidCredentials),
            }
        };
        self.session
            .send_replace(Session::signed_in(credentials.clone()));
        Ok(credentials)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        let credentials = register(&self.accounts, email, password)?;
        debug!(uid = %credentials.uid, "memory identity created");
        self.session
            .send_replace(Session::signed_in(credentials.clone()));
        Ok(credentials)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.session.send_replace(Session::signed_out());
        Ok(())
    }

    async fn delete_current_user(&self) -> Result<(), BackendError> {
        let Some(user) = self.current_user() else {
            return Err(BackendError::NotSignedIn);
        };
        lock(&self.accounts).remove(&user.email);
        self.session.send_replace(Session::signed_out());
        Ok(())
    }

    fn current_user(&self) -> Option<Credentials> {
        self.session.borrow().user.clone()
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }
}

#[derive(Default)]
struct Collections {
    docs: AHashMap<String, Vec<StoredDocument>>,
    last_stamp: Option<DateTime<Utc>>,
}

/// Schema-less collections of JSON documents. Reads and writes require a
/// signed-in caller, like the hosted rules this site runs under.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    /// Writes bypassing the access rules; used for seeding.
    pub fn insert_unchecked(&self, collection: &str, doc: NewDocument) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.write(collection, id.clone(), doc);
        id
    }

    /// Like [`MemoryStore::insert_unchecked`] with a caller-chosen id.
    pub fn set_unchecked(&self, collection: &str, id: &str, doc: NewDocument) {
        self.write(collection, id.to_string(), doc);
    }

    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        lock(&self.collections)
            .docs
            .get(collection)
            .map_or(0, Vec::len)
    }

    #[must_use]
    pub fn get(&self, collection: &str, id: &str) -> Option<StoredDocument> {
        lock(&self.collections)
            .docs
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
    }

    fn write(&self, collection: &str, id: String, doc: NewDocument) {
        let mut guard = lock(&self.collections);
        let mut data = doc.fields;
        if !doc.server_timestamps.is_empty() {
            // Strictly increasing so creation order is total.
            let now = Utc::now();
            let stamp = match guard.last_stamp {
                Some(last) if now <= last => last + Duration::nanoseconds(1),
                _ => now,
            };
            guard.last_stamp = Some(stamp);
            for field in doc.server_timestamps {
                data.insert(
                    field,
                    Value::String(stamp.to_rfc3339_opts(SecondsFormat::Nanos, true)),
                );
            }
        }
        let docs = guard.docs.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(existing) => existing.data = data,
            None => docs.push(StoredDocument { id, data }),
        }
    }
}

fn require_auth(auth: Option<&Credentials>) -> Result<(), BackendError> {
    match auth {
        Some(_) => Ok(()),
        None => Err(BackendError::PermissionDenied(
            "Missing or insufficient permissions.".into(),
        )),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        doc: NewDocument,
    ) -> Result<String, BackendError> {
        require_auth(auth)?;
        Ok(self.insert_unchecked(collection, doc))
    }

    async fn set(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        id: &str,
        doc: NewDocument,
    ) -> Result<(), BackendError> {
        require_auth(auth)?;
        self.write(collection, id.to_string(), doc);
        Ok(())
    }

    async fn query(
        &self,
        auth: Option<&Credentials>,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, BackendError> {
        require_auth(auth)?;
        let guard = lock(&self.collections);
        let mut docs: Vec<StoredDocument> = guard
            .docs
            .get(&query.collection)
            .cloned()
            .unwrap_or_default();
        drop(guard);

        if let Some((field, direction)) = &query.order_by {
            // Ordered queries only see documents that carry the field.
            docs.retain(|d| d.data.get(field).is_some_and(|v| !v.is_null()));
            docs.sort_by(|a, b| {
                let ord = compare_values(&a.data[field], &b.data[field]);
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> NewDocument {
        NewDocument {
            fields: v.as_object().cloned().unwrap(),
            server_timestamps: vec![],
        }
    }

    fn someone() -> Credentials {
        Credentials {
            uid: "u1".into(),
            email: "a@b.c".into(),
            id_token: None,
        }
    }

    #[tokio::test]
    async fn ordered_query_skips_documents_without_the_field() {
        let store = MemoryStore::default();
        store.insert_unchecked("scores", doc(json!({"score": 74})));
        store.insert_unchecked("scores", doc(json!({"player": "no score"})));
        store.insert_unchecked("scores", doc(json!({"score": 70})));

        let q = Query::collection("scores").order_by("score", Direction::Ascending);
        let got = store.query(Some(&someone()), &q).await.unwrap();
        let scores: Vec<_> = got.iter().map(|d| d.data["score"].clone()).collect();
        assert_eq!(scores, vec![json!(70), json!(74)]);
    }

    #[tokio::test]
    async fn server_timestamps_are_strictly_increasing() {
        let store = MemoryStore::default();
        for i in 0..5 {
            store.insert_unchecked(
                "players",
                doc(json!({ "n": i })).with_server_timestamp("createdAt"),
            );
        }
        let q = Query::collection("players").order_by("createdAt", Direction::Descending);
        let got = store.query(Some(&someone()), &q).await.unwrap();
        let order: Vec<_> = got.iter().map(|d| d.data["n"].clone()).collect();
        assert_eq!(order, vec![json!(4), json!(3), json!(2), json!(1), json!(0)]);
    }

    #[tokio::test]
    async fn anonymous_writes_are_rejected() {
        let store = MemoryStore::default();
        let err = store
            .add(None, "scores", doc(json!({"score": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::PermissionDenied(_)));
        assert_eq!(store.count("scores"), 0);
    }

    #[tokio::test]
    async fn sign_up_rules() {
        let backend = MemoryBackend::new();
        let identity = backend.memory_identity();
        assert!(matches!(
            identity.sign_up("x@y.z", "short").await,
            Err(BackendError::WeakPassword(_))
        ));
        identity.sign_up("x@y.z", "long enough").await.unwrap();
        assert!(matches!(
            identity.sign_up("X@y.z", "long enough").await,
            Err(BackendError::EmailExists)
        ));
    }
}
