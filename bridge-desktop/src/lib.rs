//! # Desktop Bridge Implementations
//!
//! Desktop-ready adapters for the traits in `bridge-traits`. The gallery core
//! only needs network access, so this crate ships a single adapter:
//!
//! - [`ReqwestHttpClient`] implements [`HttpClient`](bridge_traits::HttpClient)
//!   on top of `reqwest` with rustls.

pub mod http;

pub use http::ReqwestHttpClient;
