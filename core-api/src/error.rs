use bridge_traits::BridgeError;
use core_auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The gateway could not authenticate the call. The session may already
    /// have been ended.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the user has to sign in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, ApiError::Auth(e) if e.ends_session() || matches!(e, AuthError::AuthExpired))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
