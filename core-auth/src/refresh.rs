//! Credential refresh call.

use crate::types::{envelope_message, AuthSignal, Credential, RefreshFailure, RefreshOutcome};
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, AUTHORIZATION};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Deserialize)]
struct RefreshEnvelope {
    result: Option<RefreshResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResult {
    access_token: Option<String>,
}

/// Calls the refresh endpoint through the raw transport.
///
/// The request has no body and no `Authorization` header; the backend
/// identifies the session from the cookie the transport kept at sign-in.
/// It bypasses the gateway, so a rejected refresh never recurses into
/// another refresh.
#[derive(Clone)]
pub struct RefreshClient {
    http: Arc<dyn HttpClient>,
    url: String,
}

impl RefreshClient {
    pub fn new(http: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn refresh(&self) -> RefreshOutcome {
        let request = HttpRequest::new(HttpMethod::Post, &self.url)
            .without_header(AUTHORIZATION)
            .header("Accept", "application/json");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| RefreshFailure::transport(format!("refresh request failed: {}", e)))?;

        let signal = AuthSignal::classify(&response);
        if !response.is_success() || signal != AuthSignal::Clear {
            let status = match signal {
                AuthSignal::Forbidden => 403,
                AuthSignal::Unauthorized => 401,
                AuthSignal::Clear => response.status,
            };
            let message = envelope_message(&response.body)
                .unwrap_or_else(|| "refresh rejected by the server".to_string());
            debug!(status, "Refresh rejected");
            return Err(RefreshFailure::new(Some(status), message));
        }

        let envelope: RefreshEnvelope = serde_json::from_slice(&response.body).map_err(|e| {
            RefreshFailure::new(
                Some(response.status),
                format!("malformed refresh response: {}", e),
            )
        })?;

        envelope
            .result
            .and_then(|r| r.access_token)
            .map(Credential::from)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                RefreshFailure::new(
                    Some(response.status),
                    "refresh response did not contain an access token",
                )
            })
    }
}
