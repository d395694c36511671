//! # Host Bridge Traits
//!
//! Platform abstraction traits the gallery core depends on but does not
//! implement itself.
//!
//! ## Overview
//!
//! The batching engine in `core-batch` and the Drive provider never open a
//! socket directly. They talk to the remote service through an
//! [`HttpClient`](http::HttpClient) injected by the host, and they forward
//! structured logs through an optional [`LoggerSink`](log::LoggerSink).
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | Tests    | in-memory mocks (`mockall`) |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific failures into it with an actionable
//! message.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` so a single client can be shared by
//! every batch dispatch of a session.

pub mod error;
pub mod http;
pub mod log;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use log::{LogEntry, LogLevel, LoggerSink};
