//! # Core Runtime
//!
//! Shared runtime infrastructure for the bookstore client core:
//! - [`config`]: validated client configuration and capability injection
//! - [`events`]: typed event bus for session, cart and order changes
//! - [`logging`]: `tracing` subscriber setup and redaction helpers

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
