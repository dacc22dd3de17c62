use thiserror::Error;

use crate::backend::BackendError;

/// Every way a page action can fail. None of them are fatal: the handler
/// that ran the action logs the error and shows a notification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// A precondition failed before any backend call was made.
    #[error("validation error: {0}")]
    Validation(String),
    #[error("auth error: {0}")]
    Auth(BackendError),
    #[error("query error: {0}")]
    Query(BackendError),
    #[error("write error: {0}")]
    Write(BackendError),
    /// The identity was created but its profile document was not, and the
    /// identity could not be removed again.
    #[error("identity {uid} was created without a profile: {source}")]
    PartialSignup { uid: String, source: BackendError },
}

impl AppError {
    #[must_use]
    pub fn validation(msg: &str) -> Self {
        Self::Validation(msg.to_string())
    }
}
