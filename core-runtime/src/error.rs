use thiserror::Error;

/// Errors raised while assembling the client core.
#[derive(Error, Debug)]
pub enum Error {
    /// A setting is missing or out of range. The message names the setting
    /// and, where there is one, the environment variable behind it.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid API base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A bridge the host must provide was not injected and no desktop
    /// default is compiled in.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
