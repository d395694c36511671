//! Error types for the batching core

use bridge_traits::BridgeError;
use thiserror::Error;

use crate::request::{CorrelationKey, RawError};

/// Classified failure attached to a rejected [`Deferred`](crate::Deferred).
///
/// `Clone` because a single failed dispatch is fanned out to every handler of
/// the batch it carried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Remote quota exceeded; retried automatically up to the ceiling
    #[error("Rate limit exceeded: {0}")]
    RateLimited(RawError),

    /// The requested resource does not exist. Operations refine this into a
    /// specific not-found kind before it reaches their callers.
    #[error("Resource not found")]
    NotFound,

    /// Any other error reported by the remote service
    #[error("Remote API error: {0}")]
    Api(RawError),

    /// The dispatch never produced per-item replies
    #[error("Transport error: {0}")]
    Transport(String),

    /// A reply could not be decoded
    #[error("Failed to decode API response: {0}")]
    Decode(String),

    /// The transport replied without an entry for this request
    #[error("No response received for request {key}")]
    MissingResponse { key: CorrelationKey },

    /// A result was requested from a cell no drain cycle settled
    #[error("Result requested before it was settled")]
    Unsettled,
}

impl BatchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, BatchError::RateLimited(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BatchError::NotFound)
    }
}

/// Failure of a whole dispatch, as reported by a
/// [`BatchTransport`](crate::BatchTransport).
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The remote rejected the batch call itself
    #[error("Batch request rejected: {0}")]
    Api(RawError),

    /// The host HTTP client failed
    #[error(transparent)]
    Transport(#[from] BridgeError),

    /// The batch reply could not be decoded
    #[error("Malformed batch response: {0}")]
    Decode(String),
}

impl From<DispatchError> for BatchError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Api(raw) if raw.is_rate_limit() => BatchError::RateLimited(raw),
            DispatchError::Api(raw) => BatchError::Api(raw),
            DispatchError::Transport(e) => BatchError::Transport(e.to_string()),
            DispatchError::Decode(msg) => BatchError::Decode(msg),
        }
    }
}

/// Result type for batching operations
pub type Result<T> = std::result::Result<T, BatchError>;
