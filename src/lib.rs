//! Workspace entry crate.
//!
//! Host applications depend on `bookstore-client` and enable the documented
//! features instead of wiring each workspace crate (`core-service`,
//! `core-auth`, `core-api`, ...) individually.
//!
//! - `desktop-shims` (default): reqwest transport, file-backed credential
//!   storage and a console navigator are injected when the host provides none.
//! - `secure-store`: keyring-backed credential storage on desktop.

#[cfg(any(feature = "desktop-shims", feature = "secure-store"))]
pub use core_service::*;
