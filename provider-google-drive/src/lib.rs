//! # Google Drive Provider
//!
//! Drive v3 operations for the gallery, built on the batching core.
//!
//! ## Overview
//!
//! This crate provides:
//! - Caller-facing lookups and listings ([`DriveFacade`]) returning
//!   [`Deferred`](core_batch::Deferred) results
//! - Field selections validated against an allow-list ([`ApiFields`])
//! - Shortcut resolution for directories and listings
//! - A [`BatchTransport`](core_batch::BatchTransport) over the Drive batch
//!   endpoint ([`DriveBatchTransport`]) speaking `multipart/mixed`
//! - A [`DriveSession`] tying a collector to a configuration
//!
//! ## Example
//!
//! ```ignore
//! use provider_google_drive::{ApiFields, DriveSession};
//!
//! let session = DriveSession::from_config(&config);
//! let drive = session.facade();
//! let images = drive.list_images(&folder_id, &ApiFields::simple(["id", "name"]), None, None);
//! let images = session.flush(images).await?;
//! ```

pub mod error;
pub mod facade;
pub mod fields;
pub mod multipart;
pub mod requests;
pub mod session;
pub mod transport;
pub mod types;

pub use error::{GoogleDriveError, Result};
pub use facade::{DriveDeferred, DriveFacade};
pub use fields::{ApiFields, FieldSpec, FileRecord};
pub use session::DriveSession;
pub use transport::DriveBatchTransport;
pub use types::{Drive, DriveFile, MediaKind, ShortcutDetails};
