//! Integration tests for logging setup

use async_trait::async_trait;
use bridge_traits::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, entry: LogEntry) -> bridge_traits::Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

// The global subscriber can only be installed once per process, so every
// assertion about the installed pipeline lives in this one test.
#[test]
fn test_global_init_mirrors_to_sink_once() {
    let sink = Arc::new(RecordingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).expect("first init succeeds");

    tracing::info!(target: "core_auth::gateway", email = "reader@example.com", "Signed in");
    tracing::debug!(target: "hyper::client", "Below the dependency threshold");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Signed in");
        assert_eq!(
            entries[0].fields.get("email"),
            Some(&"r***@[REDACTED]".to_string())
        );
    }

    let second = init_logging(config);
    assert!(second.is_err());
}

#[test]
fn test_redaction_of_session_fields() {
    for field in ["accessToken", "refresh_token", "password", "Authorization", "set-cookie"] {
        assert_eq!(redact_if_sensitive(field, "value"), "[REDACTED]", "{field}");
    }

    let email = redact_if_sensitive("email", "reader@example.com");
    assert!(email.starts_with('r'));
    assert!(!email.contains("example.com"));

    assert_eq!(redact_if_sensitive("book_id", "9780441013593"), "9780441013593");
    assert_eq!(redact_if_sensitive("status", "401"), "401");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/var/lib/bookstore/store.json"), "store.json");
    assert_eq!(strip_path("D:\\data\\store.json"), "store.json");
    assert_eq!(strip_path("store.json"), "store.json");
    assert_eq!(strip_path("/var/log/"), "");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_default_format_follows_build_profile() {
    let config = LoggingConfig::default();
    if cfg!(debug_assertions) {
        assert_eq!(config.format, LogFormat::Pretty);
    } else {
        assert_eq!(config.format, LogFormat::Json);
    }
    assert!(config.redact_pii);
    assert_eq!(config.level, LogLevel::Info);
}
