//! # Gallery Configuration Module
//!
//! Provides configuration management for the Drive gallery core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `GalleryConfig` instance that holds the HTTP bridge, credentials and the
//! tuning knobs of the batching engine. It enforces fail-fast validation so a
//! misconfigured core never reaches the network.
//!
//! ## Required Dependencies
//!
//! - `access_token` - OAuth bearer token for the Drive API
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//!
//! When the `desktop-shims` feature is enabled, the reqwest-backed
//! `HttpClient` is injected automatically if none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::GalleryConfig;
//!
//! let config = GalleryConfig::builder()
//!     .access_token("ya29.token")
//!     .file_page_size(500)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! Missing capabilities produce actionable messages:
//!
//! ```should_panic
//! use core_runtime::config::GalleryConfig;
//!
//! let config = GalleryConfig::builder()
//!     .build()
//!     .expect("Should fail - missing access token");
//! ```

use crate::error::{Error, Result};
use crate::logging::redact_if_sensitive;
use bridge_traits::{HttpClient, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Endpoint accepting `multipart/mixed` batch calls for Drive v3.
pub const DEFAULT_BATCH_ENDPOINT: &str = "https://www.googleapis.com/batch/drive/v3";

/// Path prefix of every request embedded in a batch.
pub const DEFAULT_API_ROOT: &str = "/drive/v3";

/// Attempts per dispatch before a rate-limited batch is given up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Largest `pageSize` Drive accepts for `files.list`.
pub const MAX_FILE_PAGE_SIZE: u32 = 1000;

/// Largest `pageSize` Drive accepts for `drives.list`.
pub const MAX_DRIVE_PAGE_SIZE: u32 = 100;

/// Parts per HTTP batch call Drive documents as its limit.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

const MAX_BATCH_SIZE_LIMIT: usize = 1000;

/// Core configuration for the gallery.
///
/// Use [`GalleryConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct GalleryConfig {
    /// HTTP client carrying batch calls
    pub http_client: Arc<dyn HttpClient>,

    /// OAuth bearer token
    pub access_token: String,

    /// Absolute URL batch calls are POSTed to
    pub batch_endpoint: String,

    /// Path prefix for requests embedded in a batch
    pub api_root: String,

    /// Retry ceiling for rate-limited dispatches
    pub max_attempts: u32,

    /// Delay schedule between rate-limited attempts
    pub backoff: RetryPolicy,

    /// Upper bound for `files.list` page sizes
    pub file_page_size: u32,

    /// Upper bound for `drives.list` page sizes
    pub drive_page_size: u32,

    /// Requests per HTTP batch call
    pub max_batch_size: usize,
}

impl std::fmt::Debug for GalleryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryConfig")
            .field("http_client", &"HttpClient { ... }")
            .field(
                "access_token",
                &redact_if_sensitive("access_token", &self.access_token),
            )
            .field("batch_endpoint", &self.batch_endpoint)
            .field("api_root", &self.api_root)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("file_page_size", &self.file_page_size)
            .field("drive_page_size", &self.drive_page_size)
            .field("max_batch_size", &self.max_batch_size)
            .finish()
    }
}

/// Default backoff between rate-limited dispatches: 1s doubling up to 60s.
///
/// The batch executor only reads the delay schedule. The retry ceiling is
/// [`GalleryConfig::max_attempts`].
pub fn default_backoff() -> RetryPolicy {
    RetryPolicy {
        max_attempts: DEFAULT_MAX_ATTEMPTS,
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(60),
        use_exponential_backoff: true,
    }
}

impl GalleryConfig {
    /// Creates a new builder for constructing a `GalleryConfig`.
    pub fn builder() -> GalleryConfigBuilder {
        GalleryConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The access token is not blank
    /// - The batch endpoint is an absolute http(s) URL
    /// - The API root starts with `/`
    /// - The retry ceiling allows at least one attempt
    /// - Page and batch sizes are within what Drive accepts
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::Config("Access token cannot be empty".to_string()));
        }

        if !(self.batch_endpoint.starts_with("https://")
            || self.batch_endpoint.starts_with("http://"))
        {
            return Err(Error::Config(format!(
                "Batch endpoint must be an absolute http(s) URL, got '{}'",
                self.batch_endpoint
            )));
        }

        if !self.api_root.starts_with('/') {
            return Err(Error::Config(format!(
                "API root must start with '/', got '{}'",
                self.api_root
            )));
        }

        if self.max_attempts == 0 {
            return Err(Error::Config(
                "Max attempts must be at least 1".to_string(),
            ));
        }

        if !(1..=MAX_FILE_PAGE_SIZE).contains(&self.file_page_size) {
            return Err(Error::Config(format!(
                "File page size must be between 1 and {}",
                MAX_FILE_PAGE_SIZE
            )));
        }

        if !(1..=MAX_DRIVE_PAGE_SIZE).contains(&self.drive_page_size) {
            return Err(Error::Config(format!(
                "Drive page size must be between 1 and {}",
                MAX_DRIVE_PAGE_SIZE
            )));
        }

        if !(1..=MAX_BATCH_SIZE_LIMIT).contains(&self.max_batch_size) {
            return Err(Error::Config(format!(
                "Max batch size must be between 1 and {}",
                MAX_BATCH_SIZE_LIMIT
            )));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the Drive API. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Other hosts: inject a platform HTTP client."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

/// Builder for constructing [`GalleryConfig`] instances.
///
/// Set options incrementally, then call
/// [`build()`](GalleryConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct GalleryConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    access_token: Option<String>,
    batch_endpoint: Option<String>,
    api_root: Option<String>,
    max_attempts: Option<u32>,
    backoff: Option<RetryPolicy>,
    file_page_size: Option<u32>,
    drive_page_size: Option<u32>,
    max_batch_size: Option<usize>,
}

impl GalleryConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the OAuth bearer token (required).
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::GalleryConfig;
    ///
    /// let builder = GalleryConfig::builder()
    ///     .access_token("ya29.token");
    /// ```
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the batch endpoint URL.
    ///
    /// Default: `https://www.googleapis.com/batch/drive/v3`
    pub fn batch_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.batch_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the path prefix for embedded requests.
    ///
    /// Default: `/drive/v3`
    pub fn api_root(mut self, root: impl Into<String>) -> Self {
        self.api_root = Some(root.into());
        self
    }

    /// Sets the retry ceiling for rate-limited dispatches.
    ///
    /// Default: 100
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the delay schedule between rate-limited attempts.
    ///
    /// Default: 1s base delay, doubling, capped at 60s
    pub fn backoff(mut self, policy: RetryPolicy) -> Self {
        self.backoff = Some(policy);
        self
    }

    /// Sets the largest page requested from `files.list`.
    ///
    /// Default: 1000
    pub fn file_page_size(mut self, size: u32) -> Self {
        self.file_page_size = Some(size);
        self
    }

    /// Sets the largest page requested from `drives.list`.
    ///
    /// Default: 100
    pub fn drive_page_size(mut self, size: u32) -> Self {
        self.drive_page_size = Some(size);
        self
    }

    /// Sets how many requests go into one HTTP batch call.
    ///
    /// Default: 100
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = Some(size);
        self
    }

    /// Builds the final `GalleryConfig` instance.
    ///
    /// Returns an error if:
    /// - The access token is missing or blank
    /// - No HttpClient is available
    /// - Any value is out of range
    pub fn build(self) -> Result<GalleryConfig> {
        let access_token = self.access_token.ok_or_else(|| {
            Error::Config("Access token is required. Use .access_token() to set it.".to_string())
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = GalleryConfig {
            http_client,
            access_token,
            batch_endpoint: self
                .batch_endpoint
                .unwrap_or_else(|| DEFAULT_BATCH_ENDPOINT.to_string()),
            api_root: self
                .api_root
                .unwrap_or_else(|| DEFAULT_API_ROOT.to_string()),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            backoff: self.backoff.unwrap_or_else(default_backoff),
            file_page_size: self.file_page_size.unwrap_or(MAX_FILE_PAGE_SIZE),
            drive_page_size: self.drive_page_size.unwrap_or(MAX_DRIVE_PAGE_SIZE),
            max_batch_size: self.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("offline".to_string()))
        }
    }

    fn builder() -> GalleryConfigBuilder {
        GalleryConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .access_token("ya29.test-token")
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.batch_endpoint, DEFAULT_BATCH_ENDPOINT);
        assert_eq!(config.api_root, "/drive/v3");
        assert_eq!(config.max_attempts, 100);
        assert_eq!(config.backoff, default_backoff());
        assert_eq!(config.file_page_size, 1000);
        assert_eq!(config.drive_page_size, 100);
        assert_eq!(config.max_batch_size, 100);
    }

    #[test]
    fn test_builder_requires_access_token() {
        let result = GalleryConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Access token is required"));
    }

    #[test]
    fn test_validate_rejects_blank_token() {
        let result = GalleryConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .access_token("   ")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client() {
        let result = GalleryConfig::builder().access_token("token").build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("HttpClient"));
        assert!(err_msg.contains("desktop-shims"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = GalleryConfig::builder()
            .access_token("token")
            .build()
            .expect("desktop defaults should succeed");
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let result = builder().max_attempts(0).build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Max attempts must be at least 1"));
    }

    #[test]
    fn test_validate_page_size_ranges() {
        assert!(builder().file_page_size(0).build().is_err());
        assert!(builder().file_page_size(1001).build().is_err());
        assert!(builder().file_page_size(1000).build().is_ok());

        assert!(builder().drive_page_size(101).build().is_err());
        assert!(builder().drive_page_size(1).build().is_ok());

        assert!(builder().max_batch_size(0).build().is_err());
        assert!(builder().max_batch_size(1001).build().is_err());
    }

    #[test]
    fn test_validate_endpoint_shape() {
        assert!(builder().batch_endpoint("googleapis.com/batch").build().is_err());
        assert!(builder().api_root("drive/v3").build().is_err());
        assert!(builder()
            .batch_endpoint("http://127.0.0.1:8080/batch")
            .build()
            .is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = builder().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("ya29.test-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = builder().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.access_token, config.access_token);
        assert!(Arc::ptr_eq(&cloned.http_client, &config.http_client));
    }
}
