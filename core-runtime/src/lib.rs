//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the gallery core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate holds the ambient utilities every other crate relies on. It
//! decides how a session is configured (credentials, endpoints, page and
//! batch sizes, retry ceiling) and how `tracing` events are rendered and
//! forwarded to the host.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{GalleryConfig, GalleryConfigBuilder};
pub use error::{Error, Result};
