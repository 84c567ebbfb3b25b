//! Credential and response-classification types

use bridge_traits::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque bearer credential.
///
/// `Debug` never prints the value; use [`Credential::as_str`] where the raw
/// token is genuinely needed (the `Authorization` header, storage).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// Why a credential refresh did not produce a credential.
///
/// Cloned to every request that was waiting on the refresh, so all of them
/// report the same status and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    /// HTTP or envelope status, when the backend answered at all
    pub status: Option<u16>,
    pub message: String,
}

impl RefreshFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The refresh never reached the backend.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    /// The task driving the refresh went away before it settled.
    pub fn abandoned() -> Self {
        Self::new(None, "credential refresh was abandoned before completing")
    }

    /// The session the refresh belonged to ended before it returned.
    pub fn superseded() -> Self {
        Self::new(None, "session ended while the credential was being refreshed")
    }
}

impl fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RefreshFailure {}

/// Result of one refresh, as handed to every waiting request.
pub type RefreshOutcome = std::result::Result<Credential, RefreshFailure>;

/// What a response says about the credential it was sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSignal {
    Clear,
    /// 401: missing or expired credential, recoverable by a refresh
    Unauthorized,
    /// 403: terminal for the session
    Forbidden,
}

impl AuthSignal {
    /// Classify by HTTP status or by the envelope's `statusCode` field.
    /// Forbidden wins when either source says 403.
    pub fn classify(response: &HttpResponse) -> Self {
        let envelope = envelope_status(&response.body);
        let says = |code: u16| response.status == code || envelope == Some(code);

        if says(403) {
            AuthSignal::Forbidden
        } else if says(401) {
            AuthSignal::Unauthorized
        } else {
            AuthSignal::Clear
        }
    }
}

/// `statusCode` of a JSON envelope body, accepting numbers and numeric strings.
pub fn envelope_status(body: &[u8]) -> Option<u16> {
    let value = parse_object(body)?;
    match value.get("statusCode")? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `message` of a JSON envelope body. Arrays of messages are joined.
pub fn envelope_message(body: &[u8]) -> Option<String> {
    let value = parse_object(body)?;
    match value.get("message")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

fn parse_object(body: &[u8]) -> Option<Value> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' {
        return None;
    }
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(Value::is_object)
}
