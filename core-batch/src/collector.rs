//! Batch Collector
//!
//! Accumulates requests and their completion handlers, then drains them in
//! cycles. One cycle is exactly one executor dispatch; a cycle's handlers may
//! register more work (the next page of a listing, a chained lookup), which
//! is picked up by the following cycle of the same [`BatchCollector::flush`].

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

use crate::classifier::classify;
use crate::deferred::{Deferred, Outstanding, Settler};
use crate::error::BatchError;
use crate::executor::{ExecutorConfig, RetryingExecutor};
use crate::pagination::PaginationPolicy;
use crate::request::{ApiRequest, Batch, CorrelationKey, RawResponse};
use crate::transport::BatchTransport;

type ResponseHandler = Box<dyn FnOnce(&BatchCollector, Result<RawResponse, BatchError>) + Send>;

type PageRequest = Box<dyn Fn(Option<&str>) -> ApiRequest + Send>;

type PageTransform<T, E> = Box<dyn Fn(RawResponse) -> Result<Vec<T>, E> + Send>;

#[derive(Default)]
struct CollectorState {
    batch: Batch,
    handlers: HashMap<CorrelationKey, ResponseHandler>,
    next_key: u64,
}

/// Registers requests and settles their [`Deferred`] results on flush.
pub struct BatchCollector {
    executor: RetryingExecutor,
    state: Mutex<CollectorState>,
}

impl BatchCollector {
    pub fn new(transport: Arc<dyn BatchTransport>, config: ExecutorConfig) -> Self {
        Self::with_executor(RetryingExecutor::new(transport, config))
    }

    pub fn with_executor(executor: RetryingExecutor) -> Self {
        Self {
            executor,
            state: Mutex::new(CollectorState::default()),
        }
    }

    /// Number of requests waiting for the next drain cycle.
    pub fn pending(&self) -> usize {
        self.state.lock().batch.len()
    }

    /// Register one request.
    ///
    /// On a successful reply `on_success` produces the value. Failures
    /// (classified, then converted into `E`) go to `on_failure`, which may
    /// recover or remap the error; pass [`propagate`](crate::propagate) to
    /// keep it as is. `on_failure` also sees errors returned by `on_success`.
    pub fn register<T, E, S, F>(&self, request: ApiRequest, on_success: S, on_failure: F) -> Deferred<T, E>
    where
        T: Send + 'static,
        E: From<BatchError> + Send + 'static,
        S: FnOnce(RawResponse) -> Result<T, E> + Send + 'static,
        F: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        let (deferred, settler) = Deferred::pending();
        self.enqueue(
            request,
            Box::new(move |_, raw| {
                settler.settle(
                    raw.map_err(E::from)
                        .and_then(on_success)
                        .or_else(on_failure),
                );
            }),
        );
        deferred
    }

    /// Register a multi-page listing.
    ///
    /// `request` builds the request for a page from the previous page's
    /// continuation token (`None` for the first page). `transform` turns one
    /// page into items. Pages are appended in order; the listing ends when the
    /// remote reports no further page or `policy` declines to continue.
    pub fn register_paginated<T, E, R, X>(
        &self,
        request: R,
        transform: X,
        policy: Arc<dyn PaginationPolicy>,
    ) -> Deferred<Vec<T>, E>
    where
        T: Send + 'static,
        E: From<BatchError> + Send + 'static,
        R: Fn(Option<&str>) -> ApiRequest + Send + 'static,
        X: Fn(RawResponse) -> Result<Vec<T>, E> + Send + 'static,
    {
        let (deferred, settler) = Deferred::pending();
        let state = PaginationState {
            request: Box::new(request),
            transform: Box::new(transform),
            policy,
            accumulated: Vec::new(),
            pages: 0,
            settler,
        };
        state.request_page(self, None);
        deferred
    }

    /// Drain every pending request, then collect `outstanding`.
    ///
    /// The returned value mirrors the shape of `outstanding`. With nothing
    /// pending no dispatch happens and the cells are collected as they are.
    #[instrument(skip_all)]
    pub async fn flush<O: Outstanding>(&self, outstanding: O) -> Result<O::Output, O::Error> {
        self.drain().await;
        outstanding.collect()
    }

    fn enqueue(&self, request: ApiRequest, handler: ResponseHandler) {
        let mut state = self.state.lock();
        let key = CorrelationKey::new(state.next_key);
        state.next_key += 1;

        trace!(key = %key, path = %request.path, "Registering request");
        state.batch.push(key, request);
        state.handlers.insert(key, handler);
    }

    async fn drain(&self) {
        let mut cycle = 0u32;

        loop {
            let (batch, mut handlers) = {
                let mut state = self.state.lock();
                if state.batch.is_empty() {
                    break;
                }
                let batch = std::mem::take(&mut state.batch);
                let handlers: HashMap<CorrelationKey, ResponseHandler> = batch
                    .keys()
                    .filter_map(|key| state.handlers.remove(&key).map(|handler| (key, handler)))
                    .collect();
                (batch, handlers)
            };

            cycle += 1;
            debug!(cycle, requests = batch.len(), "Draining batch");

            match self.executor.execute(&batch).await {
                Ok(mut reply) => {
                    for key in batch.keys() {
                        let Some(handler) = handlers.remove(&key) else {
                            continue;
                        };
                        let result = match reply.remove(&key) {
                            Some(raw) => classify(raw),
                            None => {
                                warn!(key = %key, "No response for request");
                                Err(BatchError::MissingResponse { key })
                            }
                        };
                        handler(self, result);
                    }

                    if !reply.is_empty() {
                        warn!(count = reply.len(), "Discarding responses for unknown requests");
                    }
                }
                Err(error) => {
                    warn!(error = %error, requests = batch.len(), "Failing every request of the batch");
                    for key in batch.keys() {
                        if let Some(handler) = handlers.remove(&key) {
                            handler(self, Err(error.clone()));
                        }
                    }
                }
            }
        }

        if cycle > 0 {
            debug!(cycles = cycle, "Collector drained");
        }
    }
}

/// Progress of one paginated listing between drain cycles.
struct PaginationState<T, E> {
    request: PageRequest,
    transform: PageTransform<T, E>,
    policy: Arc<dyn PaginationPolicy>,
    accumulated: Vec<T>,
    pages: u32,
    settler: Settler<Vec<T>, E>,
}

impl<T, E> PaginationState<T, E>
where
    T: Send + 'static,
    E: From<BatchError> + Send + 'static,
{
    fn request_page(self, collector: &BatchCollector, token: Option<String>) {
        let request = (self.request)(token.as_deref());
        collector.enqueue(
            request,
            Box::new(move |collector, raw| self.on_page(collector, raw)),
        );
    }

    fn on_page(mut self, collector: &BatchCollector, raw: Result<RawResponse, BatchError>) {
        let response = match raw {
            Ok(response) => response,
            Err(error) => return self.settler.reject(E::from(error)),
        };

        let token = response.next_page_token();
        match (self.transform)(response) {
            Ok(items) => self.accumulated.extend(items),
            Err(error) => return self.settler.reject(error),
        }
        self.pages += 1;

        match token {
            Some(token) if self.policy.should_continue() => {
                trace!(pages = self.pages, items = self.accumulated.len(), "Requesting next page");
                self.request_page(collector, Some(token));
            }
            _ => {
                trace!(pages = self.pages, items = self.accumulated.len(), "Listing complete");
                self.settler.resolve(self.accumulated);
            }
        }
    }
}
