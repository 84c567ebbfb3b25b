//! # Host Bridge Traits
//!
//! Capabilities the bookstore client core needs from its host, expressed as
//! traits so the core stays independent of any particular platform.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Raw HTTP transport with a cookie jar
//! - [`KeyValueStore`](storage::KeyValueStore) - Durable storage for the credential
//! - [`SessionNavigator`](navigation::SessionNavigator) - User notices and the redirect to sign-in
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Adapters
//!
//! | Platform | Implementation Crate |
//! |----------|----------------------|
//! | Desktop  | `bridge-desktop`     |
//! | Tests    | [`MemoryStore`](storage::MemoryStore) plus scripted transports |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters convert
//! platform errors into it with an actionable message and never include
//! stored values in error text.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync`; the core shares a single instance of
//! each capability across all in-flight requests.

pub mod error;
pub mod http;
pub mod logging;
pub mod navigation;
pub mod storage;

pub use error::{BridgeError, Result};

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy, AUTHORIZATION};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use navigation::{Notice, NoticeLevel, SessionNavigator};
pub use storage::{KeyValueStore, MemoryStore};
