//! Sign-in, registration and sign-out.
//!
//! These calls go around the gateway's expiry handling: a 401 from the
//! sign-in endpoint means wrong credentials, not an expired session.

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{
    is_email, Credentials, LoginResult, RegisterRequest, UserProfile, MIN_PASSWORD_LENGTH,
};
use bridge_traits::HttpMethod;
use core_auth::{Credential, SignOutReason};
use core_runtime::logging::redact_if_sensitive;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sign in and persist the returned credential.
    ///
    /// Returns the user when the backend includes it in the response.
    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<UserProfile>> {
        let email = email.trim();
        if !is_email(email) {
            return Err(ApiError::validation("email", "must be a valid email address"));
        }
        if password.is_empty() {
            return Err(ApiError::validation("password", "is required"));
        }

        let result: LoginResult = self
            .client
            .post_public("/auth/login", &Credentials { email, password })
            .await?;

        let credential = Credential::new(result.access_token);
        if credential.is_empty() {
            return Err(ApiError::Decode(
                "sign-in response did not contain an access token".to_string(),
            ));
        }

        self.client.gateway().establish_session(credential).await?;
        info!("Signed in");
        Ok(result.user)
    }

    #[instrument(skip_all, fields(email = %redact_if_sensitive("email", &request.email)))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile> {
        if !is_email(&request.email) {
            return Err(ApiError::validation("email", "must be a valid email address"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::validation(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        if request.full_name.trim().is_empty() {
            return Err(ApiError::validation("fullName", "is required"));
        }

        let user: UserProfile = self.client.post_public("/auth/register", &request).await?;
        info!(user_id = %user.id, "Registered");
        Ok(user)
    }

    /// Tell the backend to drop the session, then forget it locally.
    ///
    /// The local sign-out happens even when the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        let gateway = self.client.gateway();

        let mut request = self.client.request(HttpMethod::Post, "/auth/logout");
        match gateway.current_credential().await {
            Ok(Some(credential)) => request = request.bearer_token(credential.as_str()),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read credential for sign-out"),
        }

        if let Err(e) = self.client.send_public(request).await {
            warn!(error = %e, "Backend sign-out failed, signing out locally");
        }

        gateway.end_session(SignOutReason::UserInitiated).await;
        info!("Signed out");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(self.client.gateway().current_credential().await, Ok(Some(_)))
    }
}
