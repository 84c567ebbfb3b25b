//! Navigation and Notification Abstraction
//!
//! When the session ends involuntarily the core has to tell the user and send
//! them back to the sign-in surface. Both are host concerns:
//! - Web: toast + `window.location` change
//! - Desktop: notification + switching to the login view
//! - TUI: status line + login screen

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How prominently a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A short, transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Host surface for user notices and the redirect to sign-in.
///
/// Both calls are fire-and-forget from the core's point of view: failures are
/// logged by the caller and never change the outcome of the request that
/// triggered them.
#[async_trait]
pub trait SessionNavigator: Send + Sync {
    /// Show a transient message to the user.
    async fn notify(&self, notice: Notice) -> Result<()>;

    /// Leave the current view and present the sign-in surface at `route`.
    async fn navigate_to_login(&self, route: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_constructors() {
        assert_eq!(Notice::info("hi").level, NoticeLevel::Info);
        assert_eq!(Notice::warning("hm").level, NoticeLevel::Warning);

        let notice = Notice::error("Session expired");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Session expired");
    }
}
