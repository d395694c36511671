//! Drive session
//!
//! Owns the batch collector for one logical session and hands out facades
//! bound to it.

use core_batch::{BatchCollector, BatchTransport, ExecutorConfig, Outstanding};
use core_runtime::config::{MAX_DRIVE_PAGE_SIZE, MAX_FILE_PAGE_SIZE};
use core_runtime::GalleryConfig;
use std::sync::Arc;
use tracing::info;

use crate::facade::DriveFacade;
use crate::transport::DriveBatchTransport;

/// One collector plus the page-size limits of its listings.
///
/// # Example
///
/// ```ignore
/// let session = DriveSession::from_config(&config);
/// let drive = session.facade();
///
/// let name = drive.resolve_drive_name("0AExample");
/// let folders = drive.list_directories("root", &ApiFields::simple(["id", "name"]), None, None);
///
/// let (name, folders) = session.flush((name, folders)).await?;
/// ```
pub struct DriveSession {
    collector: BatchCollector,
    file_page_size: u32,
    drive_page_size: u32,
}

impl DriveSession {
    /// Session over `collector` with the largest page sizes Drive accepts.
    pub fn new(collector: BatchCollector) -> Self {
        Self {
            collector,
            file_page_size: MAX_FILE_PAGE_SIZE,
            drive_page_size: MAX_DRIVE_PAGE_SIZE,
        }
    }

    /// Session dispatching through `transport`.
    pub fn with_transport(transport: Arc<dyn BatchTransport>, executor: ExecutorConfig) -> Self {
        Self::new(BatchCollector::new(transport, executor))
    }

    /// Session talking to the Drive batch endpoint described by `config`.
    pub fn from_config(config: &GalleryConfig) -> Self {
        info!(
            endpoint = %config.batch_endpoint,
            max_attempts = config.max_attempts,
            max_batch_size = config.max_batch_size,
            "Creating Drive session"
        );

        let executor = ExecutorConfig::from_config(config);
        let transport: Arc<dyn BatchTransport> = Arc::new(DriveBatchTransport::from_config(config));

        Self::with_transport(transport, executor)
            .with_page_sizes(config.file_page_size, config.drive_page_size)
    }

    pub fn with_page_sizes(mut self, file_page_size: u32, drive_page_size: u32) -> Self {
        self.file_page_size = file_page_size;
        self.drive_page_size = drive_page_size;
        self
    }

    pub fn collector(&self) -> &BatchCollector {
        &self.collector
    }

    pub fn facade(&self) -> DriveFacade<'_> {
        DriveFacade::new(&self.collector, self.file_page_size, self.drive_page_size)
    }

    /// Run every registered request, then collect `outstanding`.
    pub async fn flush<O: Outstanding>(&self, outstanding: O) -> Result<O::Output, O::Error> {
        self.collector.flush(outstanding).await
    }
}
