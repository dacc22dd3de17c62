//! Authentication gate.
//!
//! The identity service is the only authority on who is signed in. The gate
//! never flips its own state after a sign-in or sign-out call; it waits for
//! the pushed session and reconciles the page to it, which also covers
//! sessions that end on the provider's side.

use tracing::{error, info, warn};

use crate::backend::{DocumentStore, IdentityService, NewDocument};
use crate::model::{CREATED_AT_FIELD, Credentials, Session, USERS_COLLECTION, UserProfile};
use crate::mvu::error::AppError;
use crate::mvu::page::Effect;
use crate::view::dom::{Document, ids};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    SignedIn(String),
}

impl From<&Session> for SessionState {
    fn from(session: &Session) -> Self {
        match session.user_email() {
            Some(email) => Self::SignedIn(email.to_string()),
            None => Self::SignedOut,
        }
    }
}

/// Something on the page that depends on who is signed in.
pub trait SessionObserver {
    /// Called once per reconciled change. Returned effects are scheduled.
    fn session_changed(&mut self, state: &SessionState, doc: &mut Document) -> Vec<Effect>;
}

#[derive(Clone, Debug, Default)]
pub struct AuthGate {
    /// The state the page was last reconciled to; `None` until the first push.
    reconciled: Option<SessionState>,
}

impl AuthGate {
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.reconciled.clone().unwrap_or(SessionState::SignedOut)
    }

    #[must_use]
    pub fn user_email(&self) -> Option<&str> {
        match &self.reconciled {
            Some(SessionState::SignedIn(email)) => Some(email),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user_email().is_some()
    }

    /// Brings the page in line with a pushed session. Pushes that match the
    /// state already shown change nothing.
    pub fn reconcile(
        &mut self,
        session: &Session,
        doc: &mut Document,
        observers: &mut [&mut dyn SessionObserver],
    ) -> Vec<Effect> {
        let next = SessionState::from(session);
        if self.reconciled.as_ref() == Some(&next) {
            return vec![];
        }
        info!(from = ?self.reconciled, to = ?next, "session changed");
        self.reconciled = Some(next.clone());

        let mut effects = Vec::new();
        match &next {
            SessionState::SignedIn(email) => {
                doc.set_inner_html(ids::USER_EMAIL, maud::html! { (email) }.into_string());
                doc.configure_nav_bar(Some(email));
                for observer in observers.iter_mut() {
                    effects.extend(observer.session_changed(&next, doc));
                }
                doc.configure_message_bar(&format!("Welcome {email}"));
            }
            SessionState::SignedOut => {
                doc.set_inner_html(ids::USER_EMAIL, String::new());
                doc.configure_nav_bar(None);
                doc.configure_message_bar("Please sign in to see full content");
                for observer in observers.iter_mut() {
                    effects.extend(observer.session_changed(&next, doc));
                }
            }
        }
        effects
    }
}

/// # Errors
///
/// Will return `AppError::Auth` if the identity service rejects the credentials
pub async fn sign_in(
    identity: &dyn IdentityService,
    email: &str,
    password: &str,
) -> Result<Credentials, AppError> {
    identity.sign_in(email, password).await.map_err(|e| {
        warn!("sign in failed: {e}");
        AppError::Auth(e)
    })
}

/// Creates the identity, then its `users/{uid}` profile. If the profile
/// can't be written the new identity is deleted again so no account exists
/// without a profile.
///
/// # Errors
///
/// Will return `AppError::Auth` if the identity can't be created,
/// `AppError::Write` if the profile write failed and the identity was rolled
/// back, and `AppError::PartialSignup` if the rollback failed as well
pub async fn sign_up(
    identity: &dyn IdentityService,
    store: &dyn DocumentStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Credentials, AppError> {
    let credentials = identity.sign_up(email, password).await.map_err(|e| {
        warn!("sign up failed: {e}");
        AppError::Auth(e)
    })?;

    let profile = UserProfile {
        name: name.to_string(),
        email: email.to_string(),
        created_at: None,
    };
    let written = match NewDocument::from_serializable(&profile) {
        Ok(doc) => {
            store
                .set(
                    Some(&credentials),
                    USERS_COLLECTION,
                    &credentials.uid,
                    doc.with_server_timestamp(CREATED_AT_FIELD),
                )
                .await
        }
        Err(e) => Err(e),
    };

    match written {
        Ok(()) => Ok(credentials),
        Err(write_err) => {
            warn!(uid = %credentials.uid, "profile write failed, removing identity: {write_err}");
            match identity.delete_current_user().await {
                Ok(()) => Err(AppError::Write(write_err)),
                Err(delete_err) => {
                    error!(
                        uid = %credentials.uid,
                        "identity left without profile, rollback failed: {delete_err}"
                    );
                    Err(AppError::PartialSignup {
                        uid: credentials.uid,
                        source: write_err,
                    })
                }
            }
        }
    }
}

/// Best-effort; a failure is logged and otherwise ignored.
pub async fn sign_out(identity: &dyn IdentityService) {
    if let Err(e) = identity.sign_out().await {
        warn!("sign out failed: {e}");
    }
}
