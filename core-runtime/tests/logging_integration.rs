//! Integration tests for logging system

use bridge_traits::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};

#[test]
fn test_logging_initialization() {
    // Only one subscriber can be installed per process
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_pii_redaction(true);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());

    tracing::debug!(target: "core_batch", requests = 3, "Draining batch");
}

#[test]
fn test_invalid_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_batch=verbose");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_pii_redaction_tokens() {
    assert_eq!(redact_if_sensitive("access_token", "ya29.a0Af"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer ya29"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("client_secret", "s3cr3t"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_emails() {
    let redacted = redact_if_sensitive("owner", "someone@example.com");

    assert!(redacted.starts_with('s'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_pii_redaction_normal_values() {
    assert_eq!(redact_if_sensitive("file_id", "1AbCdEf"), "1AbCdEf");
    assert_eq!(redact_if_sensitive("name", "Summer 2023"), "Summer 2023");
}

#[test]
fn test_pii_redaction_keeps_char_boundaries() {
    assert_eq!(
        redact_if_sensitive("error", "Éclair@example.com is over quota"),
        "É***@[REDACTED]"
    );
    assert_eq!(redact_if_sensitive("owner", "日本@example.jp"), "日***@[REDACTED]");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_filter("provider_google_drive=trace")
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.filter.as_deref(), Some("provider_google_drive=trace"));
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
