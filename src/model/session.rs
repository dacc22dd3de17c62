use serde::{Deserialize, Serialize};

/// Identity of a signed-in user as handed back by the identity service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub uid: String,
    pub email: String,
    /// Bearer token for the document store. Absent for the in-memory backend.
    #[serde(skip)]
    pub id_token: Option<String>,
}

/// The value the identity service pushes to subscribers on every change.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<Credentials>,
}

impl Session {
    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None }
    }

    #[must_use]
    pub fn signed_in(credentials: Credentials) -> Self {
        Self {
            user: Some(credentials),
        }
    }

    #[must_use]
    pub fn user_email(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.email.as_str())
    }
}
