use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

use super::firebase_types::{
    ErrorEnvelope, PasswordRequest, PasswordResponse, RefreshResponse, RunQueryItem,
    fields_from_firestore, fields_to_firestore, identity_error,
};
use super::{
    Backend, BackendError, Direction, DocumentStore, IdentityService, NewDocument, Query,
    StoredDocument,
};
use crate::model::{Credentials, Session};

const IDENTITY_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_BASE: &str = "https://securetoken.googleapis.com/v1";
const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

/// Refresh this long before the token actually runs out.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub identity_base: String,
    pub secure_token_base: String,
    pub firestore_base: String,
}

impl FirebaseConfig {
    #[must_use]
    pub fn new(api_key: &str, project_id: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            project_id: project_id.to_string(),
            identity_base: IDENTITY_BASE.to_string(),
            secure_token_base: SECURE_TOKEN_BASE.to_string(),
            firestore_base: FIRESTORE_BASE.to_string(),
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/{}",
            self.firestore_base.trim_end_matches('/'),
            self.documents_root()
        )
    }
}

/// Identity Toolkit + Firestore over their REST APIs.
#[derive(Clone)]
pub struct FirebaseBackend {
    client: reqwest::Client,
    config: Arc<FirebaseConfig>,
}

impl FirebaseBackend {
    #[must_use]
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }
}

impl Backend for FirebaseBackend {
    fn new_identity(&self) -> Arc<dyn IdentityService> {
        Arc::new(FirebaseIdentity::new(
            self.client.clone(),
            Arc::clone(&self.config),
        ))
    }

    fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::new(FirestoreStore {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
        })
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(identity_error(status.as_u16(), &message));
    }
    Ok(serde_json::from_str(&body)?)
}

struct TokenState {
    credentials: Credentials,
    refresh_token: String,
    expires_at: Instant,
}

fn expiry_from(expires_in: &str) -> Instant {
    let secs = expires_in.parse::<u64>().unwrap_or(3600);
    Instant::now() + Duration::from_secs(secs)
}

pub struct FirebaseIdentity {
    client: reqwest::Client,
    config: Arc<FirebaseConfig>,
    token: Mutex<Option<TokenState>>,
    session: watch::Sender<Session>,
}

impl FirebaseIdentity {
    fn new(client: reqwest::Client, config: Arc<FirebaseConfig>) -> Self {
        let (session, _) = watch::channel(Session::signed_out());
        Self {
            client,
            config,
            token: Mutex::new(None),
            session,
        }
    }

    fn accounts_url(&self, action: &str) -> String {
        format!(
            "{}/accounts:{action}?key={}",
            self.config.identity_base.trim_end_matches('/'),
            self.config.api_key
        )
    }

    async fn password_call(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<Credentials, BackendError> {
        let resp = self
            .client
            .post(self.accounts_url(action))
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;
        let body: PasswordResponse = read_json(resp).await?;
        let credentials = Credentials {
            uid: body.local_id,
            email: body.email,
            id_token: Some(body.id_token),
        };
        self.install(TokenState {
            credentials: credentials.clone(),
            refresh_token: body.refresh_token,
            expires_at: expiry_from(&body.expires_in),
        });
        Ok(credentials)
    }

    fn install(&self, state: TokenState) {
        let session = Session::signed_in(state.credentials.clone());
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
        self.session.send_replace(session);
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.session.send_replace(Session::signed_out());
    }
}

#[async_trait]
impl IdentityService for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Credentials, BackendError> {
        let credentials = self.password_call("signUp", email, password).await?;
        info!(uid = %credentials.uid, "firebase identity created");
        Ok(credentials)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        // Tokens are bearer-only; forgetting them is the sign-out.
        self.clear();
        Ok(())
    }

    async fn delete_current_user(&self) -> Result<(), BackendError> {
        let id_token = self
            .current_user()
            .and_then(|c| c.id_token)
            .ok_or(BackendError::NotSignedIn)?;
        let resp = self
            .client
            .post(self.accounts_url("delete"))
            .json(&json!({ "idToken": id_token }))
            .send()
            .await?;
        let _: Value = read_json(resp).await?;
        self.clear();
        Ok(())
    }

    async fn refresh_session(&self) -> Result<(), BackendError> {
        let refresh_token = {
            let guard = self.token.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(t) if t.expires_at <= Instant::now() + EXPIRY_MARGIN => {
                    t.refresh_token.clone()
                }
                _ => return Ok(()),
            }
        };
        let url = format!(
            "{}/token?key={}",
            self.config.secure_token_base.trim_end_matches('/'),
            self.config.api_key
        );
        let result = async {
            let resp = self
                .client
                .post(url)
                .form(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token.as_str()),
                ])
                .send()
                .await?;
            read_json::<RefreshResponse>(resp).await
        }
        .await;

        match result {
            Ok(body) => {
                let email = self.current_user().map(|c| c.email).unwrap_or_default();
                self.install(TokenState {
                    credentials: Credentials {
                        uid: body.user_id,
                        email,
                        id_token: Some(body.id_token),
                    },
                    refresh_token: body.refresh_token,
                    expires_at: expiry_from(&body.expires_in),
                });
                Ok(())
            }
            Err(e) => {
                warn!("token refresh failed, signing out: {e}");
                self.clear();
                Err(e)
            }
        }
    }

    fn current_user(&self) -> Option<Credentials> {
        self.session.borrow().user.clone()
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }
}

pub struct FirestoreStore {
    client: reqwest::Client,
    config: Arc<FirebaseConfig>,
}

impl FirestoreStore {
    fn authorized(
        &self,
        req: reqwest::RequestBuilder,
        auth: Option<&Credentials>,
    ) -> reqwest::RequestBuilder {
        match auth.and_then(|c| c.id_token.as_deref()) {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn commit(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        id: &str,
        doc: NewDocument,
    ) -> Result<(), BackendError> {
        let name = format!("{}/{collection}/{id}", self.config.documents_root());
        let transforms: Vec<Value> = doc
            .server_timestamps
            .iter()
            .map(|f| json!({ "fieldPath": f, "setToServerValue": "REQUEST_TIME" }))
            .collect();
        let body = json!({
            "writes": [{
                "update": { "name": name, "fields": fields_to_firestore(&doc.fields) },
                "updateTransforms": transforms,
            }]
        });
        let url = format!("{}:commit", self.config.documents_url());
        let resp = self
            .authorized(self.client.post(url), auth)
            .json(&body)
            .send()
            .await?;
        let _: Value = read_json(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        doc: NewDocument,
    ) -> Result<String, BackendError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.commit(auth, collection, &id, doc).await?;
        Ok(id)
    }

    async fn set(
        &self,
        auth: Option<&Credentials>,
        collection: &str,
        id: &str,
        doc: NewDocument,
    ) -> Result<(), BackendError> {
        self.commit(auth, collection, id, doc).await
    }

    async fn query(
        &self,
        auth: Option<&Credentials>,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, BackendError> {
        let mut structured = json!({ "from": [{ "collectionId": query.collection }] });
        if let Some((field, direction)) = &query.order_by {
            let direction = match direction {
                Direction::Ascending => "ASCENDING",
                Direction::Descending => "DESCENDING",
            };
            structured["orderBy"] =
                json!([{ "field": { "fieldPath": field }, "direction": direction }]);
        }
        if let Some(limit) = query.limit {
            structured["limit"] = json!(limit);
        }
        let url = format!("{}:runQuery", self.config.documents_url());
        let resp = self
            .authorized(self.client.post(url), auth)
            .json(&json!({ "structuredQuery": structured }))
            .send()
            .await?;
        let items: Vec<RunQueryItem> = read_json(resp).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|d| StoredDocument {
                id: d.name.rsplit('/').next().unwrap_or_default().to_string(),
                data: fields_from_firestore(&d.fields),
            })
            .collect())
    }
}
