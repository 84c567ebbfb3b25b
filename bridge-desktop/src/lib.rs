//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop and terminal
//! hosts (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest` with a cookie jar
//! - `KeyValueStore` as a JSON file in the user data directory
//! - `KeyValueStore` backed by the OS keychain (`secure-store` feature)
//! - `SessionNavigator` that reports through `tracing`
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ConsoleNavigator, FileKeyValueStore, ReqwestHttpClient};
//!
//! let http = ReqwestHttpClient::new()?;
//! let store = FileKeyValueStore::new();
//! let navigator = ConsoleNavigator::new();
//! ```

mod file_store;
mod http;
mod navigator;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use file_store::FileKeyValueStore;
pub use http::ReqwestHttpClient;
pub use navigator::ConsoleNavigator;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringStore;
