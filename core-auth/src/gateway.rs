//! # Authenticated Request Gateway
//!
//! Wraps the raw [`HttpClient`] so that callers never deal with credential
//! expiry themselves:
//!
//! 1. Every request is stamped with the stored credential.
//! 2. A 401 (HTTP status or envelope `statusCode`) triggers one shared
//!    refresh; the request is replayed once with the new credential.
//! 3. A 403, or a refresh that fails, ends the session: the credential is
//!    cleared, the user is notified and sent to the sign-in route.
//!
//! However many requests are rejected during one expiry window, exactly one
//! refresh call is made and all of them observe its outcome. A refresh that
//! returns after the session ended never writes its credential back.
//!
//! ```ignore
//! let gateway = AuthGateway::from_config(&config, event_bus.clone());
//! let response = gateway
//!     .execute(HttpRequest::new(HttpMethod::Get, config.endpoint("/cart")))
//!     .await?;
//! ```

use crate::coordinator::{RefreshCoordinator, RefreshLease, Ticket};
use crate::credential_store::CredentialStore;
use crate::error::{AuthError, Result};
use crate::refresh::RefreshClient;
use crate::session::SessionTerminator;
use crate::types::{AuthSignal, Credential, RefreshFailure};
use bridge_traits::{HttpClient, HttpRequest, HttpResponse, KeyValueStore, SessionNavigator};
use core_runtime::config::ClientConfig;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, SignOutReason};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Endpoints and keys the gateway needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub refresh_url: String,
    pub login_route: String,
    pub credential_key: String,
}

impl From<&ClientConfig> for GatewaySettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            refresh_url: config.refresh_url(),
            login_route: config.login_route.clone(),
            credential_key: config.credential_key.clone(),
        }
    }
}

pub struct AuthGateway {
    http: Arc<dyn HttpClient>,
    credentials: CredentialStore,
    coordinator: RefreshCoordinator,
    refresher: RefreshClient,
    terminator: SessionTerminator,
    events: EventBus,
    /// Held while the stored credential changes hands
    session: Mutex<()>,
}

impl AuthGateway {
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn SessionNavigator>,
        events: EventBus,
        settings: GatewaySettings,
    ) -> Self {
        let credentials = CredentialStore::new(store, settings.credential_key);
        let refresher = RefreshClient::new(Arc::clone(&http), settings.refresh_url);
        let terminator = SessionTerminator::new(
            credentials.clone(),
            navigator,
            events.clone(),
            settings.login_route,
        );

        Self {
            http,
            credentials,
            coordinator: RefreshCoordinator::new(),
            refresher,
            terminator,
            events,
            session: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ClientConfig, events: EventBus) -> Self {
        Self::new(
            Arc::clone(&config.http_client),
            Arc::clone(&config.credential_store),
            Arc::clone(&config.navigator),
            events,
            GatewaySettings::from(config),
        )
    }

    /// Send `request` with the current credential, recovering from one
    /// credential expiry.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AccessDenied`] on 403; the session has been ended
    /// - [`AuthError::RefreshFailed`] when the shared refresh failed; the
    ///   session has been ended
    /// - [`AuthError::RefreshFailed`] with [`RefreshFailure::superseded`] when
    ///   the session ended while the refresh was running
    /// - [`AuthError::AuthExpired`] when the replayed request is rejected
    ///   again, or the session ended before the rejection arrived
    /// - [`AuthError::Transport`] when the transport itself failed
    ///
    /// Any other response, including non-auth 4xx/5xx, is returned as-is.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let generation = self.coordinator.generation();
        let mut credential = self.stored_credential().await;
        let mut retried = false;

        loop {
            let response = self.dispatch(&request, credential.as_ref()).await?;

            match AuthSignal::classify(&response) {
                AuthSignal::Clear => return Ok(response),
                AuthSignal::Forbidden => return Err(self.deny().await),
                AuthSignal::Unauthorized if retried => {
                    warn!("Request rejected again after credential refresh");
                    return Err(AuthError::AuthExpired);
                }
                AuthSignal::Unauthorized => {
                    retried = true;
                    let fresh = self.recover(credential.as_ref(), generation).await?;
                    debug!("Replaying request with refreshed credential");
                    credential = Some(fresh);
                }
            }
        }
    }

    /// Send `request` as-is, without attaching the stored credential and
    /// without reacting to 401/403.
    ///
    /// For sign-in, registration and sign-out, where a rejection is an
    /// answer about the submitted data rather than about the session.
    pub async fn execute_public(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.http.execute(request).await.map_err(AuthError::Transport)
    }

    /// Store a credential obtained by signing in and start a new session.
    pub async fn establish_session(&self, credential: Credential) -> Result<()> {
        let _session = self.session.lock().await;
        self.coordinator.reset();
        self.credentials.save(&credential).await?;
        let _ = self.events.emit(CoreEvent::Auth(AuthEvent::SignedIn));
        info!("Session established");
        Ok(())
    }

    /// End the session locally. Forced reasons also notify and redirect.
    pub async fn end_session(&self, reason: SignOutReason) {
        let _session = self.session.lock().await;
        self.close(reason).await;
    }

    async fn close(&self, reason: SignOutReason) {
        self.coordinator.reset();
        self.terminator.terminate(reason).await;
    }

    pub async fn current_credential(&self) -> Result<Option<Credential>> {
        self.credentials.load().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// Requests parked behind the in-flight refresh.
    pub fn queued_requests(&self) -> usize {
        self.coordinator.queued()
    }

    async fn stored_credential(&self) -> Option<Credential> {
        match self.credentials.load().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Could not read credential, sending unauthenticated");
                None
            }
        }
    }

    async fn dispatch(
        &self,
        request: &HttpRequest,
        credential: Option<&Credential>,
    ) -> Result<HttpResponse> {
        let request = match credential {
            Some(credential) => request.clone().bearer_token(credential.as_str()),
            None => request.clone(),
        };
        self.http.execute(request).await.map_err(AuthError::Transport)
    }

    async fn deny(&self) -> AuthError {
        warn!("Access denied, ending session");
        self.end_session(SignOutReason::AccessDenied).await;
        AuthError::AccessDenied
    }

    /// Obtain a credential to replay a request that was rejected while
    /// carrying `sent_with` during session `generation`.
    async fn recover(&self, sent_with: Option<&Credential>, generation: u64) -> Result<Credential> {
        match self.coordinator.join(sent_with, generation) {
            Ticket::Ready(credential) => {
                debug!("Credential already refreshed since this request was sent");
                Ok(credential)
            }
            Ticket::Failed(failure) => {
                debug!("Refresh already failed for this session");
                Err(AuthError::RefreshFailed(failure))
            }
            Ticket::Ended => match self.stored_credential().await {
                Some(current) if Some(&current) != sent_with => {
                    debug!("Session changed since this request was sent");
                    Ok(current)
                }
                _ => Err(AuthError::AuthExpired),
            },
            Ticket::Wait(rx) => match rx.await {
                Ok(Ok(credential)) => Ok(credential),
                Ok(Err(failure)) => Err(AuthError::RefreshFailed(failure)),
                Err(_) => Err(AuthError::RefreshFailed(RefreshFailure::abandoned())),
            },
            Ticket::Lead(lease) => self.lead_refresh(lease).await,
        }
    }

    #[instrument(skip_all)]
    async fn lead_refresh(&self, mut lease: RefreshLease<'_>) -> Result<Credential> {
        info!("Credential rejected, refreshing");
        let _ = self.events.emit(CoreEvent::Auth(AuthEvent::TokenRefreshing));

        let outcome = self.refresher.refresh().await;
        let session = self.session.lock().await;

        if !lease.is_current() {
            let failure = RefreshFailure::superseded();
            let rejected = lease.publish(Err(failure.clone()));
            warn!(rejected, "Session ended during refresh, discarding credential");
            return Err(AuthError::RefreshFailed(failure));
        }

        match outcome {
            Ok(credential) => {
                if let Err(e) = self.credentials.save(&credential).await {
                    warn!(error = %e, "Failed to persist refreshed credential");
                }
                let replayed = lease.settle(Ok(credential.clone()));
                drop(session);
                let _ = self
                    .events
                    .emit(CoreEvent::Auth(AuthEvent::TokenRefreshed { replayed }));
                info!(replayed, "Credential refreshed");
                Ok(credential)
            }
            Err(failure) => {
                let rejected = lease.publish(Err(failure.clone()));
                error!(rejected, error = %failure, "Credential refresh failed");
                let _ = self.events.emit(CoreEvent::Auth(AuthEvent::RefreshFailed {
                    message: failure.to_string(),
                }));
                self.close(SignOutReason::SessionExpired).await;
                drop(session);
                drop(lease);
                Err(AuthError::RefreshFailed(failure))
            }
        }
    }
}
