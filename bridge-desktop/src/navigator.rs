//! Session navigator for headless and terminal hosts

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    navigation::{Notice, NoticeLevel, SessionNavigator},
};
use std::sync::{Mutex, PoisonError};
use tracing::{error, info, warn};

/// [`SessionNavigator`] that reports notices through `tracing` and remembers
/// the last sign-in route it was asked to show.
///
/// GUI hosts replace this with an adapter that drives their router.
#[derive(Default)]
pub struct ConsoleNavigator {
    last_route: Mutex<Option<String>>,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route passed to the most recent `navigate_to_login` call.
    pub fn last_route(&self) -> Option<String> {
        self.last_route
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionNavigator for ConsoleNavigator {
    async fn notify(&self, notice: Notice) -> Result<()> {
        match notice.level {
            NoticeLevel::Info => info!(target: "bookstore::notice", "{}", notice.message),
            NoticeLevel::Warning => warn!(target: "bookstore::notice", "{}", notice.message),
            NoticeLevel::Error => error!(target: "bookstore::notice", "{}", notice.message),
        }
        Ok(())
    }

    async fn navigate_to_login(&self, route: &str) -> Result<()> {
        info!(route, "Redirecting to sign-in");
        *self.last_route.lock().unwrap_or_else(PoisonError::into_inner) = Some(route.to_string());
        Ok(())
    }
}
