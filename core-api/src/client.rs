//! Typed JSON calls over the authenticated gateway.

use crate::envelope::{decode, failure, failure_status};
use crate::error::{ApiError, Result};
use bridge_traits::{HttpMethod, HttpRequest, HttpResponse};
use core_auth::AuthGateway;
use core_runtime::config::{join_url, ClientConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Shared by every service. Cloning is cheap and clones use the same
/// gateway, so they share one refresh coordinator.
#[derive(Clone)]
pub struct ApiClient {
    gateway: Arc<AuthGateway>,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(gateway: Arc<AuthGateway>, base_url: Url, timeout: Duration) -> Self {
        Self {
            gateway,
            base_url,
            timeout,
        }
    }

    pub fn from_config(gateway: Arc<AuthGateway>, config: &ClientConfig) -> Self {
        Self::new(gateway, config.base_url.clone(), config.request_timeout)
    }

    pub fn gateway(&self) -> &Arc<AuthGateway> {
        &self.gateway
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.url(path))
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(HttpMethod::Get, path)).await?;
        decode(&response)
    }

    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize,
        T: DeserializeOwned,
    {
        let query = serde_urlencoded::to_string(query)
            .map_err(|e| ApiError::validation("query", e.to_string()))?;
        let path = if query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query)
        };
        self.get(&path).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.send_json(HttpMethod::Post, path, body).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.send_json(HttpMethod::Put, path, body).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.send_json(HttpMethod::Patch, path, body).await
    }

    /// Send a request whose response carries nothing the caller needs.
    pub async fn execute(&self, method: HttpMethod, path: &str) -> Result<()> {
        self.send(self.request(method, path)).await.map(|_| ())
    }

    async fn send_json<B, T>(&self, method: HttpMethod, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = self.request(method, path).json(body)?;
        let response = self.send(request).await?;
        decode(&response)
    }

    /// POST outside the session: no credential, no refresh on 401.
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = self.request(HttpMethod::Post, path).json(body)?;
        let response = self.gateway.execute_public(request).await?;
        decode(&Self::check(response)?)
    }

    /// Route `request` through the gateway and turn failed statuses into
    /// [`ApiError`]s.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.gateway.execute(request).await?;
        Self::check(response)
    }

    /// Like [`send`](Self::send) but bypassing credential handling.
    pub async fn send_public(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.gateway.execute_public(request).await?;
        Self::check(response)
    }

    fn check(response: HttpResponse) -> Result<HttpResponse> {
        if let Some(status) = failure_status(&response) {
            let error = failure(&response, status);
            if status >= 500 {
                warn!(status, error = %error, "Backend error");
            } else {
                debug!(status, error = %error, "Request rejected");
            }
            return Err(error);
        }

        Ok(response)
    }
}
