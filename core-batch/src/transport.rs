//! The batched-dispatch boundary.
//!
//! Any service that can carry several requests in one round trip and answer
//! each of them individually can sit behind [`BatchTransport`]. The Drive
//! implementation lives in `provider-google-drive`; tests use in-memory
//! transports.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::DispatchError;
use crate::request::{CorrelationKey, PendingRequest, RawResult};

/// One raw result per correlation key of the dispatched requests.
pub type DispatchReply = HashMap<CorrelationKey, RawResult>;

#[async_trait]
pub trait BatchTransport: Send + Sync {
    /// Send every request in one logical dispatch.
    ///
    /// Individual items may fail independently; those failures belong in the
    /// reply. An `Err` means the dispatch as a whole failed.
    async fn dispatch(
        &self,
        requests: &[PendingRequest],
    ) -> std::result::Result<DispatchReply, DispatchError>;
}
