//! Ending a session: local credential, events, user notice, redirect.

use crate::credential_store::CredentialStore;
use bridge_traits::{Notice, SessionNavigator};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, SignOutReason};
use std::sync::Arc;
use tracing::{info, warn};

pub const ACCESS_DENIED_NOTICE: &str =
    "You do not have permission to perform this action. Please sign in again.";
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";

/// Performs the side effects of a session ending.
///
/// Every step is best-effort: a failing store or navigator is logged and
/// the remaining steps still run.
#[derive(Clone)]
pub struct SessionTerminator {
    credentials: CredentialStore,
    navigator: Arc<dyn SessionNavigator>,
    events: EventBus,
    login_route: String,
}

impl SessionTerminator {
    pub fn new(
        credentials: CredentialStore,
        navigator: Arc<dyn SessionNavigator>,
        events: EventBus,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            navigator,
            events,
            login_route: login_route.into(),
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Message shown to the user when the session ends for `reason`.
    /// Users who sign out themselves get no notice.
    pub fn notice_for(reason: SignOutReason) -> Option<Notice> {
        match reason {
            SignOutReason::AccessDenied => Some(Notice::error(ACCESS_DENIED_NOTICE)),
            SignOutReason::SessionExpired => Some(Notice::error(SESSION_EXPIRED_NOTICE)),
            SignOutReason::UserInitiated => None,
        }
    }

    pub async fn terminate(&self, reason: SignOutReason) {
        info!(%reason, "Ending session");

        if let Err(e) = self.credentials.clear().await {
            warn!(error = %e, "Failed to clear stored credential");
        }

        let _ = self
            .events
            .emit(CoreEvent::Auth(AuthEvent::SignedOut { reason }));

        if !reason.is_forced() {
            return;
        }

        if let Some(notice) = Self::notice_for(reason) {
            if let Err(e) = self.navigator.notify(notice).await {
                warn!(error = %e, "Failed to show session notice");
            }
        }

        if let Err(e) = self.navigator.navigate_to_login(&self.login_route).await {
            warn!(error = %e, route = %self.login_route, "Failed to navigate to sign-in");
        }
    }
}
