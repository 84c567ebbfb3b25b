use thiserror::Error;

/// Failure reported by a host capability.
///
/// Messages must never contain stored values or credentials.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The backend could not be reached at all.
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether sending the same request again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Connection(_) | BridgeError::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
