//! Caller-facing Drive operations.
//!
//! Every operation registers its requests with the session's
//! [`BatchCollector`] and returns a [`Deferred`] right away. Nothing is sent
//! until the collector is flushed, so lookups issued together share one
//! round trip.

use core_batch::{
    ApiRequest, BatchCollector, BatchError, Deferred, InfinitePagination, PaginationPolicy,
    RawResponse,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::GoogleDriveError;
use crate::fields::{ApiFields, FileRecord};
use crate::requests::{self, FileListing};
use crate::types::{Drive, DriveFile, DriveList, FileList, FilePage, MediaKind};

/// Result handle of a Drive operation.
pub type DriveDeferred<T> = Deferred<T, GoogleDriveError>;

/// Default `orderBy` of media listings
const DEFAULT_ORDER_BY: &str = "name";

/// Drive operations bound to one collector.
#[derive(Clone, Copy)]
pub struct DriveFacade<'a> {
    collector: &'a BatchCollector,
    file_page_size: u32,
    drive_page_size: u32,
}

impl<'a> DriveFacade<'a> {
    pub fn new(collector: &'a BatchCollector, file_page_size: u32, drive_page_size: u32) -> Self {
        Self {
            collector,
            file_page_size: file_page_size.max(1),
            drive_page_size: drive_page_size.max(1),
        }
    }

    /// ID of the live directory named `name` directly under `parent_id`.
    ///
    /// Exactly one folder, or shortcut to a folder, must match. A shortcut
    /// resolves to its target.
    pub fn resolve_directory_id(&self, parent_id: &str, name: &str) -> DriveDeferred<String> {
        let on_success = not_found_directory(name);
        let on_failure = not_found_directory(name);

        self.collector.register(
            requests::directory_lookup(parent_id, name),
            move |response: RawResponse| -> Result<String, GoogleDriveError> {
                let list: FileList = response.json()?;
                match list.files.as_slice() {
                    [only] => only
                        .effective_id()
                        .map(str::to_string)
                        .ok_or_else(&on_success),
                    matches => {
                        debug!(matches = matches.len(), "Directory lookup is not unique");
                        Err(on_success())
                    }
                }
            },
            move |error: GoogleDriveError| Err(error.refine_not_found(on_failure)),
        )
    }

    /// Name of the shared drive `drive_id`.
    pub fn resolve_drive_name(&self, drive_id: &str) -> DriveDeferred<String> {
        let drive_id = drive_id.to_string();

        self.collector.register(
            requests::drive_get(&drive_id),
            |response: RawResponse| -> Result<String, GoogleDriveError> {
                Ok(response.json::<Drive>()?.name)
            },
            move |error: GoogleDriveError| {
                Err(error.refine_not_found(|| GoogleDriveError::DriveNotFound { drive_id }))
            },
        )
    }

    /// Name of the file `file_id`. A trashed file counts as missing.
    pub fn resolve_file_name(&self, file_id: &str) -> DriveDeferred<String> {
        let missing = {
            let file_id = file_id.to_string();
            move || GoogleDriveError::FileNotFound { file_id }
        };
        let on_failure = missing.clone();

        self.collector.register(
            requests::file_get(file_id, "name, trashed"),
            move |response: RawResponse| -> Result<String, GoogleDriveError> {
                let file: DriveFile = response.json()?;
                if file.trashed {
                    return Err(missing());
                }
                file.name
                    .ok_or_else(|| BatchError::Decode("file resource without a name".to_string()).into())
            },
            move |error: GoogleDriveError| Err(error.refine_not_found(on_failure)),
        )
    }

    /// Succeeds when `directory_id` is a live folder (or folder shortcut)
    /// listing `parent_id` among its parents.
    pub fn validate_directory_membership(
        &self,
        directory_id: &str,
        parent_id: &str,
    ) -> DriveDeferred<()> {
        let on_success = not_found_directory(directory_id);
        let on_failure = not_found_directory(directory_id);
        let parent_id = parent_id.to_string();

        self.collector.register(
            requests::file_get(directory_id, requests::MEMBERSHIP_FIELDS),
            move |response: RawResponse| -> Result<(), GoogleDriveError> {
                let file: DriveFile = response.json()?;
                if !file.trashed && file.is_directory() && file.parents.contains(&parent_id) {
                    Ok(())
                } else {
                    Err(on_success())
                }
            },
            move |error: GoogleDriveError| Err(error.refine_not_found(on_failure)),
        )
    }

    /// Shared drives visible to the user, following every page unless a
    /// `policy` says otherwise.
    pub fn list_drives(&self, policy: Option<Arc<dyn PaginationPolicy>>) -> DriveDeferred<Vec<Drive>> {
        let policy = policy.unwrap_or_else(|| Arc::new(InfinitePagination::new()));
        let request_policy = Arc::clone(&policy);
        let transform_policy = Arc::clone(&policy);
        let max = self.drive_page_size;

        self.collector.register_paginated(
            move |token: Option<&str>| {
                requests::drives_list(token, request_policy.next_list_size(max).max(1))
            },
            move |response: RawResponse| -> Result<Vec<Drive>, GoogleDriveError> {
                let page: DriveList = response.json()?;
                let mut drives = Vec::with_capacity(page.drives.len());
                transform_policy.iterate(page.drives, |drive| drives.push(drive));
                Ok(drives)
            },
            policy,
        )
    }

    /// Folders (and folder shortcuts) directly under `parent_id`.
    pub fn list_directories(
        &self,
        parent_id: &str,
        fields: &ApiFields,
        order_by: Option<&str>,
        policy: Option<Arc<dyn PaginationPolicy>>,
    ) -> DriveDeferred<Vec<FileRecord>> {
        self.list_files(parent_id, MediaKind::Directory, fields, order_by, policy)
    }

    /// Images directly under `parent_id`.
    pub fn list_images(
        &self,
        parent_id: &str,
        fields: &ApiFields,
        order_by: Option<&str>,
        policy: Option<Arc<dyn PaginationPolicy>>,
    ) -> DriveDeferred<Vec<FileRecord>> {
        self.list_files(parent_id, MediaKind::Image, fields, order_by, policy)
    }

    /// Videos directly under `parent_id`.
    pub fn list_videos(
        &self,
        parent_id: &str,
        fields: &ApiFields,
        order_by: Option<&str>,
        policy: Option<Arc<dyn PaginationPolicy>>,
    ) -> DriveDeferred<Vec<FileRecord>> {
        self.list_files(parent_id, MediaKind::Video, fields, order_by, policy)
    }

    /// Listing of one media kind.
    ///
    /// Unsupported fields reject immediately without registering anything.
    /// Shortcuts are only matched when `fields` asks for nothing beyond
    /// `id` and `name`, since other fields would describe the shortcut
    /// rather than its target.
    fn list_files(
        &self,
        parent_id: &str,
        kind: MediaKind,
        fields: &ApiFields,
        order_by: Option<&str>,
        policy: Option<Arc<dyn PaginationPolicy>>,
    ) -> DriveDeferred<Vec<FileRecord>> {
        if !fields.check(&ApiFields::listing_prototype()) {
            return Deferred::rejected(GoogleDriveError::UnsupportedField {
                fields: fields.to_string(),
                operation: "list_files".to_string(),
            });
        }

        let include_shortcuts = fields.check(&ApiFields::simple(["id", "name"]));
        let page = ListingPage {
            parent_id: parent_id.to_string(),
            mime_type_check: requests::mime_type_check(kind, include_shortcuts),
            order_by: order_by.unwrap_or(DEFAULT_ORDER_BY).to_string(),
            file_fields: fields.format(),
            max_page_size: self.file_page_size,
        };

        let policy = policy.unwrap_or_else(|| Arc::new(InfinitePagination::new()));
        let request_policy = Arc::clone(&policy);
        let transform_policy = Arc::clone(&policy);
        let fields = fields.clone();

        self.collector.register_paginated(
            move |token: Option<&str>| page.request(request_policy.as_ref(), token),
            move |response: RawResponse| -> Result<Vec<FileRecord>, GoogleDriveError> {
                let listed: FilePage = response.json()?;
                let mut records = Vec::with_capacity(listed.files.len());
                transform_policy.iterate(listed.files, |file| {
                    records.push(fields.parse_response(&file))
                });
                Ok(records)
            },
            policy,
        )
    }
}

/// Owned parameters of a media listing, rebuilt into a request per page.
struct ListingPage {
    parent_id: String,
    mime_type_check: String,
    order_by: String,
    file_fields: String,
    max_page_size: u32,
}

impl ListingPage {
    fn request(&self, policy: &dyn PaginationPolicy, page_token: Option<&str>) -> ApiRequest {
        let listing = FileListing {
            parent_id: &self.parent_id,
            mime_type_check: &self.mime_type_check,
            order_by: &self.order_by,
            page_size: policy.next_list_size(self.max_page_size).max(1),
            file_fields: &self.file_fields,
        };
        requests::files_list(&listing, page_token)
    }
}

fn not_found_directory(name: &str) -> impl Fn() -> GoogleDriveError + Clone + Send + 'static {
    let name = name.to_string();
    move || GoogleDriveError::DirectoryNotFound { name: name.clone() }
}
