use crate::types::RefreshFailure;
use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The request was rejected again after being replayed with a refreshed
    /// credential.
    #[error("Session expired: request rejected after credential refresh")]
    AuthExpired,

    /// The backend answered 403. The session has been ended.
    #[error("Access denied")]
    AccessDenied,

    /// The refresh call failed. Every request waiting on it sees the same value.
    #[error("Credential refresh failed: {0}")]
    RefreshFailed(RefreshFailure),

    #[error("Credential storage error: {0}")]
    Storage(#[source] BridgeError),

    #[error("Transport error: {0}")]
    Transport(#[source] BridgeError),
}

impl AuthError {
    /// Whether the session was ended as part of producing this error.
    pub fn ends_session(&self) -> bool {
        matches!(self, AuthError::AccessDenied | AuthError::RefreshFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
