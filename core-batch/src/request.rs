//! Request descriptors, batches and raw per-item replies.

use bridge_traits::HttpMethod;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BatchError;

/// Identifier linking a dispatched request to its registered handler.
///
/// Keys are handed out by a [`BatchCollector`](crate::BatchCollector) from a
/// monotonically increasing counter, so they are unique for the collector's
/// whole lifetime, not just within one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationKey(u64);

impl CorrelationKey {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An outbound call, relative to the API root of the remote service.
///
/// The descriptor is opaque to the collector; only the transport turns it
/// into bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Resource path, e.g. `files` or `drives/0AExample`
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present.
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// First value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path plus percent-encoded query string, without a leading slash.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.path, query)
    }
}

/// A request registered with a collector, owned by it until dispatch.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub key: CorrelationKey,
    pub request: ApiRequest,
}

/// Requests accumulated since the last drain.
#[derive(Debug, Default)]
pub struct Batch {
    requests: Vec<PendingRequest>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: CorrelationKey, request: ApiRequest) {
        self.requests.push(PendingRequest { key, request });
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[PendingRequest] {
        &self.requests
    }

    pub fn keys(&self) -> impl Iterator<Item = CorrelationKey> + '_ {
        self.requests.iter().map(|pending| pending.key)
    }
}

/// One structured reason attached to a remote error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Raw error reported by the remote service for one request (or for a
/// whole dispatch).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

impl RawError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.errors.push(ErrorDetail {
            reason: reason.into(),
            ..ErrorDetail::default()
        });
        self
    }

    pub fn reasons(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|detail| detail.reason.as_str())
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.reasons().any(|r| r == reason)
    }

    /// Whether the remote asked us to slow down (global or per-user quota).
    pub fn is_rate_limit(&self) -> bool {
        self.has_reason("rateLimitExceeded") || self.has_reason("userRateLimitExceeded")
    }
}

impl fmt::Display for RawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.code)?;
        let reasons: Vec<&str> = self.reasons().collect();
        if !reasons.is_empty() {
            write!(f, " [{}]", reasons.join(", "))?;
        }
        Ok(())
    }
}

/// Successful raw reply for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl RawResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: serde_json::Value) -> Self {
        Self::new(200, body)
    }

    /// Deserialize the body into a typed resource.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BatchError> {
        T::deserialize(&self.body).map_err(|e| BatchError::Decode(e.to_string()))
    }

    /// Continuation token of a paged listing; `None` on the last page.
    pub fn next_page_token(&self) -> Option<String> {
        self.body
            .get("nextPageToken")
            .and_then(serde_json::Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }
}

/// What the transport reports for one correlation key.
pub type RawResult = std::result::Result<RawResponse, RawError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_and_query_encodes_values() {
        let request = ApiRequest::get("files")
            .query("q", "\"root\" in parents and trashed = false")
            .query("pageSize", 2)
            .query_opt("pageToken", None::<String>);

        assert_eq!(
            request.path_and_query(),
            "files?q=%22root%22%20in%20parents%20and%20trashed%20%3D%20false&pageSize=2"
        );
        assert_eq!(request.query_value("pageSize"), Some("2"));
        assert_eq!(request.query_value("pageToken"), None);
    }

    #[test]
    fn test_path_without_query() {
        assert_eq!(ApiRequest::get("drives/abc").path_and_query(), "drives/abc");
    }

    #[test]
    fn test_next_page_token() {
        let page = RawResponse::ok(json!({ "files": [], "nextPageToken": "tok" }));
        assert_eq!(page.next_page_token(), Some("tok".to_string()));

        let last = RawResponse::ok(json!({ "files": [] }));
        assert_eq!(last.next_page_token(), None);

        let empty = RawResponse::ok(json!({ "nextPageToken": "" }));
        assert_eq!(empty.next_page_token(), None);
    }

    #[test]
    fn test_raw_error_reasons() {
        let error = RawError::new(403, "Quota").with_reason("userRateLimitExceeded");
        assert!(error.is_rate_limit());
        assert!(error.has_reason("userRateLimitExceeded"));
        assert_eq!(
            error.to_string(),
            "Quota (status 403) [userRateLimitExceeded]"
        );

        let not_found = RawError::new(404, "File not found").with_reason("notFound");
        assert!(!not_found.is_rate_limit());
    }

    #[test]
    fn test_batch_keeps_registration_order() {
        let mut batch = Batch::new();
        batch.push(CorrelationKey::new(3), ApiRequest::get("files/a"));
        batch.push(CorrelationKey::new(1), ApiRequest::get("files/b"));

        assert_eq!(batch.len(), 2);
        let keys: Vec<u64> = batch.keys().map(CorrelationKey::value).collect();
        assert_eq!(keys, vec![3, 1]);
    }
}
