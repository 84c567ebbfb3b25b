//! # Client Configuration
//!
//! [`ClientConfig`] carries the backend location, the session routes and the
//! three host capabilities the core cannot work without:
//!
//! - `HttpClient` - raw transport, must keep cookies for credential refresh
//! - `KeyValueStore` - durable home of the access credential
//! - `SessionNavigator` - user notices and the redirect to sign-in
//!
//! The builder validates fail-fast. With the `desktop-shims` feature, missing
//! capabilities are filled with the `bridge-desktop` adapters; without it a
//! missing capability is reported as [`Error::CapabilityMissing`].
//!
//! ```ignore
//! use core_runtime::config::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://api.bookstore.example")
//!     .login_route("/signin")
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! [`ClientConfigBuilder::from_env`] seeds a builder from:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `BOOKSTORE_API_BASE_URL` | `base_url` |
//! | `BOOKSTORE_REFRESH_PATH` | `refresh_path` |
//! | `BOOKSTORE_LOGIN_ROUTE` | `login_route` |
//! | `BOOKSTORE_REQUEST_TIMEOUT_SECS` | `request_timeout` |

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, KeyValueStore, SessionNavigator};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-access-token";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_CREDENTIAL_KEY: &str = "accessToken";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_BASE_URL: &str = "BOOKSTORE_API_BASE_URL";
pub const ENV_REFRESH_PATH: &str = "BOOKSTORE_REFRESH_PATH";
pub const ENV_LOGIN_ROUTE: &str = "BOOKSTORE_LOGIN_ROUTE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "BOOKSTORE_REQUEST_TIMEOUT_SECS";

/// Validated client configuration. Build with [`ClientConfig::builder`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend root, e.g. `https://api.bookstore.example/v1`
    pub base_url: Url,
    /// Path of the cookie-authenticated refresh endpoint
    pub refresh_path: String,
    /// Route the navigator is sent to when the session ends involuntarily
    pub login_route: String,
    /// Storage key the credential lives under
    pub credential_key: String,
    pub request_timeout: Duration,
    pub event_buffer_size: usize,
    pub http_client: Arc<dyn HttpClient>,
    pub credential_store: Arc<dyn KeyValueStore>,
    pub navigator: Arc<dyn SessionNavigator>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("refresh_path", &self.refresh_path)
            .field("login_route", &self.login_route)
            .field("credential_key", &self.credential_key)
            .field("request_timeout", &self.request_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field("credential_store", &"KeyValueStore { ... }")
            .field("navigator", &"SessionNavigator { ... }")
            .finish()
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Absolute URL for an API path. The base URL's own path is kept as a prefix.
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub fn refresh_url(&self) -> String {
        self.endpoint(&self.refresh_path)
    }

    pub fn validate(&self) -> Result<()> {
        match self.base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::Config(format!(
                    "API base URL must use http or https, got '{}'",
                    other
                )))
            }
        }
        if self.base_url.host_str().is_none() {
            return Err(Error::Config("API base URL must include a host".to_string()));
        }

        for (name, value) in [
            ("Refresh path", &self.refresh_path),
            ("Login route", &self.login_route),
        ] {
            if !value.starts_with('/') {
                return Err(Error::Config(format!(
                    "{} must start with '/', got '{}'",
                    name, value
                )));
            }
        }

        if self.credential_key.trim().is_empty() {
            return Err(Error::Config("Credential key cannot be empty".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Join `path` onto `base`, tolerating a missing or doubled slash.
pub fn join_url(base: &Url, path: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

#[derive(Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    refresh_path: Option<String>,
    login_route: Option<String>,
    credential_key: Option<String>,
    request_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    credential_store: Option<Arc<dyn KeyValueStore>>,
    navigator: Option<Arc<dyn SessionNavigator>>,
}

impl ClientConfigBuilder {
    /// Builder seeded from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builder seeded from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut builder = Self::default();

        if let Some(url) = read(ENV_BASE_URL) {
            builder = builder.base_url(url);
        }
        if let Some(path) = read(ENV_REFRESH_PATH) {
            builder = builder.refresh_path(path);
        }
        if let Some(route) = read(ENV_LOGIN_ROUTE) {
            builder = builder.login_route(route);
        }
        if let Some(secs) = read(ENV_REQUEST_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_REQUEST_TIMEOUT_SECS, secs
                ))
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        Ok(builder)
    }

    /// Required.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = Some(route.into());
        self
    }

    pub fn credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = Some(key.into());
        self
    }

    /// Applied to the default desktop transport. Injected clients carry
    /// their own timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// The client must send cookies set by the backend back on later
    /// requests, otherwise the refresh endpoint cannot identify the session.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.credential_store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn SessionNavigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let raw_url = self.base_url.ok_or_else(|| {
            Error::Config(format!(
                "API base URL is required. Use .base_url() or set {}.",
                ENV_BASE_URL
            ))
        })?;
        let base_url = Url::parse(raw_url.trim())?;
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => defaults::http_client(request_timeout)?,
        };
        let credential_store = match self.credential_store {
            Some(store) => store,
            None => defaults::credential_store()?,
        };
        let navigator = match self.navigator {
            Some(navigator) => navigator,
            None => defaults::navigator()?,
        };

        let config = ClientConfig {
            base_url,
            refresh_path: self
                .refresh_path
                .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string()),
            login_route: self
                .login_route
                .unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_string()),
            credential_key: self
                .credential_key
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_KEY.to_string()),
            request_timeout,
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            credential_store,
            navigator,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{ConsoleNavigator, ReqwestHttpClient};

    pub(super) fn http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
        let client = ReqwestHttpClient::with_timeout(timeout).map_err(|e| {
            Error::Internal(format!("Failed to create default HttpClient: {}", e))
        })?;
        Ok(Arc::new(client))
    }

    #[cfg(feature = "secure-store")]
    pub(super) fn credential_store() -> Result<Arc<dyn KeyValueStore>> {
        Ok(Arc::new(bridge_desktop::KeyringStore::new()))
    }

    #[cfg(not(feature = "secure-store"))]
    pub(super) fn credential_store() -> Result<Arc<dyn KeyValueStore>> {
        Ok(Arc::new(bridge_desktop::FileKeyValueStore::new()))
    }

    pub(super) fn navigator() -> Result<Arc<dyn SessionNavigator>> {
        Ok(Arc::new(ConsoleNavigator::new()))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    fn missing(capability: &str, message: &str) -> Error {
        Error::CapabilityMissing {
            capability: capability.to_string(),
            message: message.to_string(),
        }
    }

    pub(super) fn http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
        Err(missing(
            "HttpClient",
            "An HttpClient with a cookie jar is required to reach the API. \
             Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient.",
        ))
    }

    pub(super) fn credential_store() -> Result<Arc<dyn KeyValueStore>> {
        Err(missing(
            "KeyValueStore",
            "A KeyValueStore is required to persist the access credential. \
             Desktop: enable 'desktop-shims' (file store) or 'secure-store' (OS keychain).",
        ))
    }

    pub(super) fn navigator() -> Result<Arc<dyn SessionNavigator>> {
        Err(missing(
            "SessionNavigator",
            "A SessionNavigator is required to notify the user and show the sign-in view. \
             Desktop: enable the 'desktop-shims' feature to use ConsoleNavigator.",
        ))
    }
}
