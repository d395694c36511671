//! Drive batch transport
//!
//! Carries drained batches to the Drive batch endpoint as `multipart/mixed`
//! POSTs, one per `max_batch_size` chunk, and merges the per-item replies.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use core_batch::{BatchTransport, DispatchError, DispatchReply, PendingRequest, RawError};
use core_runtime::logging::redact_if_sensitive;
use core_runtime::GalleryConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::multipart;
use crate::types::ErrorEnvelope;

/// Timeout for one batch POST
const BATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// [`BatchTransport`] over the Drive v3 batch endpoint.
pub struct DriveBatchTransport {
    http_client: Arc<dyn HttpClient>,
    access_token: String,
    endpoint: String,
    api_root: String,
    max_batch_size: usize,
}

impl DriveBatchTransport {
    /// Create a transport
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `access_token` - OAuth 2.0 access token with a Drive read scope
    /// * `endpoint` - absolute URL of the batch endpoint
    /// * `api_root` - path prefix of the embedded requests, e.g. `/drive/v3`
    /// * `max_batch_size` - requests per POST (at least 1)
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        access_token: impl Into<String>,
        endpoint: impl Into<String>,
        api_root: impl Into<String>,
        max_batch_size: usize,
    ) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
            endpoint: endpoint.into(),
            api_root: api_root.into(),
            max_batch_size: max_batch_size.max(1),
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Self {
        Self::new(
            Arc::clone(&config.http_client),
            config.access_token.clone(),
            config.batch_endpoint.clone(),
            config.api_root.clone(),
            config.max_batch_size,
        )
    }

    async fn send_chunk(&self, chunk: &[PendingRequest]) -> Result<DispatchReply, DispatchError> {
        let boundary = multipart::new_boundary();
        let request = HttpRequest::new(HttpMethod::Post, self.endpoint.as_str())
            .header("Content-Type", multipart::content_type(&boundary))
            .bearer_token(self.access_token.as_str())
            .body(multipart::encode(&boundary, &self.api_root, chunk))
            .timeout(BATCH_TIMEOUT);

        debug!(
            endpoint = %self.endpoint,
            requests = chunk.len(),
            access_token = %redact_if_sensitive("access_token", &self.access_token),
            "Sending batch"
        );

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::default())
            .await?;

        if !response.is_success() {
            let error = Self::batch_error(&response);
            warn!(status = response.status, error = %error, "Batch call rejected");
            return Err(DispatchError::Api(error));
        }

        let boundary = response
            .header("Content-Type")
            .and_then(multipart::boundary_from_content_type)
            .ok_or_else(|| {
                DispatchError::Decode("batch reply without a multipart boundary".to_string())
            })?;

        multipart::decode(&boundary, &response.text()?)
    }

    fn batch_error(response: &HttpResponse) -> RawError {
        response
            .json::<ErrorEnvelope>()
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| {
                let text = String::from_utf8_lossy(&response.body);
                RawError::new(response.status, text.trim())
            })
    }
}

#[async_trait]
impl BatchTransport for DriveBatchTransport {
    #[instrument(skip_all, fields(requests = requests.len()))]
    async fn dispatch(&self, requests: &[PendingRequest]) -> Result<DispatchReply, DispatchError> {
        let mut reply = DispatchReply::with_capacity(requests.len());

        for chunk in requests.chunks(self.max_batch_size) {
            reply.extend(self.send_chunk(chunk).await?);
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result};
    use bytes::Bytes;
    use core_batch::{ApiRequest, CorrelationKey, RawResponse};
    use mockall::mock;
    use serde_json::json;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn pending(keys: &[u64]) -> Vec<PendingRequest> {
        keys.iter()
            .map(|&key| PendingRequest {
                key: CorrelationKey::new(key),
                request: ApiRequest::get(format!("files/f{}", key)).query("fields", "name"),
            })
            .collect()
    }

    fn response(status: u16, content_type: &str, body: impl Into<Bytes>) -> HttpResponse {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        HttpResponse {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Answers every part of a batch request with `{"name": "file-{key}"}`.
    fn echo_batch(request: &HttpRequest) -> HttpResponse {
        let body = String::from_utf8_lossy(request.body.as_deref().unwrap_or_default()).to_string();
        let mut reply = String::new();
        for line in body.lines() {
            if let Some(key) = line
                .strip_prefix("Content-ID: <item-")
                .and_then(|rest| rest.strip_suffix('>'))
            {
                reply.push_str(&format!(
                    "--reply\r\nContent-Type: application/http\r\nContent-ID: <response-item-{key}>\r\n\r\n\
                     HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{{\"name\": \"file-{key}\"}}\r\n"
                ));
            }
        }
        reply.push_str("--reply--\r\n");
        response(200, "multipart/mixed; boundary=reply", reply)
    }

    fn transport(client: MockHttpClient, max_batch_size: usize) -> DriveBatchTransport {
        DriveBatchTransport::new(
            Arc::new(client),
            "secret-token",
            "https://www.googleapis.com/batch/drive/v3",
            "/drive/v3",
            max_batch_size,
        )
    }

    #[tokio::test]
    async fn test_dispatch_posts_one_multipart_request() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .withf(|request| {
                let body = String::from_utf8_lossy(request.body.as_deref().unwrap_or_default());
                request.method == HttpMethod::Post
                    && request.url == "https://www.googleapis.com/batch/drive/v3"
                    && request.headers.get("Authorization") == Some(&"Bearer secret-token".to_string())
                    && request
                        .headers
                        .get("Content-Type")
                        .is_some_and(|ct| ct.starts_with("multipart/mixed; boundary=batch_"))
                    && body.contains("GET /drive/v3/files/f1?fields=name\r\n")
                    && body.contains("Content-ID: <item-2>")
            })
            .times(1)
            .returning(|request| Ok(echo_batch(&request)));

        let reply = transport(client, 100).dispatch(&pending(&[1, 2])).await.unwrap();

        assert_eq!(reply.len(), 2);
        assert_eq!(
            reply[&CorrelationKey::new(2)],
            Ok(RawResponse::ok(json!({ "name": "file-2" })))
        );
    }

    #[tokio::test]
    async fn test_dispatch_chunks_by_max_batch_size() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .times(3)
            .returning(|request| Ok(echo_batch(&request)));

        let reply = transport(client, 2)
            .dispatch(&pending(&[0, 1, 2, 3, 4]))
            .await
            .unwrap();

        let mut keys: Vec<u64> = reply.keys().map(|key| key.value()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_rejected_batch_becomes_api_error() {
        let mut client = MockHttpClient::new();
        client.expect_execute().times(1).returning(|_| {
            Ok(response(
                403,
                "application/json",
                r#"{"error": {"code": 403, "message": "Rate Limit Exceeded", "errors": [{"reason": "rateLimitExceeded"}]}}"#,
            ))
        });

        let error = transport(client, 100).dispatch(&pending(&[1])).await.unwrap_err();

        match error {
            DispatchError::Api(raw) => {
                assert_eq!(raw.code, 403);
                assert!(raw.is_rate_limit());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_batch_with_plain_body() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .returning(|_| Ok(response(401, "text/plain", "Unauthorized\n")));

        let error = transport(client, 100).dispatch(&pending(&[1])).await.unwrap_err();
        assert!(matches!(
            error,
            DispatchError::Api(raw) if raw == RawError::new(401, "Unauthorized")
        ));
    }

    #[tokio::test]
    async fn test_reply_without_boundary_is_decode_error() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .returning(|_| Ok(response(200, "application/json", "{}")));

        let error = transport(client, 100).dispatch(&pending(&[1])).await.unwrap_err();
        assert!(matches!(error, DispatchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_client_failure_is_transport_error() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".to_string())));

        let error = transport(client, 100).dispatch(&pending(&[1])).await.unwrap_err();
        assert!(matches!(error, DispatchError::Transport(_)));
    }
}
