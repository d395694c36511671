//! # Request Batching Core
//!
//! Mediates every call to the remote storage API.
//!
//! ## Overview
//!
//! Callers register many logically independent requests with a
//! [`BatchCollector`] and get a [`Deferred`] back for each. Nothing touches
//! the network until [`BatchCollector::flush`] drains the collector:
//!
//! 1. The current [`Batch`] is swapped for an empty one.
//! 2. The [`RetryingExecutor`] dispatches it through a [`BatchTransport`] in a
//!    single round trip, replaying the whole dispatch while the remote
//!    reports a rate limit (up to a fixed ceiling).
//! 3. Each per-item reply goes through [`classify`] and then to the handler
//!    registered for its correlation key, settling its `Deferred`.
//! 4. Handlers may register follow-up requests (next page of a listing,
//!    chained lookups); those land in the fresh batch and trigger another
//!    drain cycle before `flush` returns.
//!
//! Multi-page listings are driven by a [`PaginationPolicy`], which decides
//! page sizes, whether to request another page, and how many items of a page
//! to keep.
//!
//! ## Components
//!
//! - **Deferred** (`deferred`): single-assignment result cells with
//!   attach-on-settle transformations
//! - **Requests** (`request`): request descriptors, batches, raw replies
//! - **Error Classifier** (`classifier`): raw reply to [`BatchError`]
//! - **Transport** (`transport`): the batched-dispatch boundary
//! - **Retrying Executor** (`executor`): bounded, classification-gated retry
//! - **Pagination** (`pagination`): infinite and bounded policies
//! - **Batch Collector** (`collector`): registration and drain cycles

pub mod classifier;
pub mod collector;
pub mod deferred;
pub mod error;
pub mod executor;
pub mod pagination;
pub mod request;
pub mod transport;

pub use classifier::classify;
pub use collector::BatchCollector;
pub use deferred::{propagate, Deferred, Outstanding, Settler};
pub use error::{BatchError, DispatchError, Result};
pub use executor::{ExecutorConfig, RetryingExecutor, DEFAULT_MAX_ATTEMPTS};
pub use pagination::{Admission, BoundedPagination, InfinitePagination, PaginationPolicy};
pub use request::{
    ApiRequest, Batch, CorrelationKey, ErrorDetail, PendingRequest, RawError, RawResponse,
    RawResult,
};
pub use transport::{BatchTransport, DispatchReply};
