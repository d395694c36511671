//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-runtime`, `core-batch`, `provider-google-drive`).
//! Host applications can depend on `drive-gallery-workspace` and enable the
//! documented features without needing to wire each crate individually.
//!
//! ## Features
//!
//! - `desktop-shims` (default): injects the `reqwest`-backed HTTP client when
//!   the configuration does not provide one.

pub use core_batch;
pub use core_runtime;
pub use provider_google_drive;
