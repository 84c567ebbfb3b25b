//! # Session Authentication
//!
//! Bearer-credential handling for the bookstore client core.
//!
//! ## Overview
//!
//! - [`AuthGateway`] stamps outgoing requests with the stored credential and
//!   recovers from expiry with a single shared refresh
//! - [`RefreshCoordinator`] keeps at most one refresh in flight and settles
//!   every waiting request, in arrival order, with the same outcome
//! - [`CredentialStore`] persists the credential through the host
//!   `KeyValueStore`
//! - [`SessionTerminator`] clears the session, tells the user why, and sends
//!   them back to the sign-in route
//!
//! Credential values never appear in logs, events or `Debug` output.

pub mod coordinator;
pub mod credential_store;
pub mod error;
pub mod gateway;
pub mod refresh;
pub mod session;
pub mod types;

pub use coordinator::{RefreshCoordinator, RefreshLease, Ticket};
pub use core_runtime::events::SignOutReason;
pub use credential_store::CredentialStore;
pub use error::{AuthError, Result};
pub use gateway::{AuthGateway, GatewaySettings};
pub use refresh::RefreshClient;
pub use session::{SessionTerminator, ACCESS_DENIED_NOTICE, SESSION_EXPIRED_NOTICE};
pub use types::{AuthSignal, Credential, RefreshFailure, RefreshOutcome};
