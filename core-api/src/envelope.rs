//! Backend response envelope `{ result, message, statusCode }`.

use crate::error::{ApiError, Result};
use bridge_traits::HttpResponse;
use core_auth::types::{envelope_message, envelope_status};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub result: Option<T>,
}

/// Status the call effectively failed with: the HTTP status when it is not
/// 2xx, otherwise an envelope `statusCode` of 400 or above.
pub fn failure_status(response: &HttpResponse) -> Option<u16> {
    if !response.is_success() {
        return Some(response.status);
    }
    envelope_status(&response.body).filter(|code| *code >= 400)
}

/// Map a failed response onto [`ApiError`].
pub fn failure(response: &HttpResponse, status: u16) -> ApiError {
    let message = envelope_message(&response.body)
        .or_else(|| {
            let text = String::from_utf8_lossy(&response.body).trim().to_string();
            (!text.is_empty() && !text.starts_with('{')).then_some(text)
        })
        .unwrap_or_else(|| format!("request failed with status {}", status));

    match status {
        404 => ApiError::NotFound(message),
        _ => ApiError::Api { status, message },
    }
}

/// Decode the `result` of a successful response.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    let envelope: ApiEnvelope<T> = serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::Decode(format!("invalid response envelope: {}", e)))?;
    envelope
        .result
        .ok_or_else(|| ApiError::Decode("response envelope has no result".to_string()))
}
