//! Drive v3 request builders.
//!
//! Each builder returns an [`ApiRequest`] relative to the API root; the
//! transport prefixes the root when it encodes the batch.

use core_batch::ApiRequest;

use crate::types::{MediaKind, FOLDER_MIME_TYPE, SHORTCUT_MIME_TYPE};

/// Fields requested when resolving a directory by name.
pub const DIRECTORY_LOOKUP_FIELDS: &str = "files(id, name, mimeType, shortcutDetails(targetId))";

/// Fields requested when checking where a directory lives.
pub const MEMBERSHIP_FIELDS: &str =
    "trashed, parents, mimeType, shortcutDetails(targetId, targetMimeType)";

/// Escape a value for embedding between double quotes in a `q` expression.
pub fn escape_name(name: &str) -> String {
    name.replace('"', "\\\"")
}

/// `mimeType` condition for a listing of `kind`.
///
/// With `include_shortcuts` the condition also matches shortcuts whose
/// target has the wanted type.
pub fn mime_type_check(kind: MediaKind, include_shortcuts: bool) -> String {
    let prefix = kind.mime_type_prefix();
    if include_shortcuts {
        format!(
            "(mimeType contains \"{prefix}\" or (mimeType contains \"{SHORTCUT_MIME_TYPE}\" and shortcutDetails.targetMimeType contains \"{prefix}\"))"
        )
    } else {
        format!("mimeType contains \"{prefix}\"")
    }
}

/// `files.list` looking for a live folder (or folder shortcut) named `name`
/// directly under `parent_id`.
///
/// Two results are enough to tell a unique match from an ambiguous one.
pub fn directory_lookup(parent_id: &str, name: &str) -> ApiRequest {
    let q = format!(
        "\"{parent_id}\" in parents and name = \"{}\" and (mimeType = \"{FOLDER_MIME_TYPE}\" or (mimeType = \"{SHORTCUT_MIME_TYPE}\" and shortcutDetails.targetMimeType = \"{FOLDER_MIME_TYPE}\")) and trashed = false",
        escape_name(name)
    );

    ApiRequest::get("files")
        .query("q", q)
        .query("supportsAllDrives", true)
        .query("includeItemsFromAllDrives", true)
        .query("pageSize", 2)
        .query("fields", DIRECTORY_LOOKUP_FIELDS)
}

/// `drives.get` for the name of a shared drive.
pub fn drive_get(drive_id: &str) -> ApiRequest {
    ApiRequest::get(format!("drives/{}", urlencoding::encode(drive_id))).query("fields", "name")
}

/// `files.get` with the given field selector.
pub fn file_get(file_id: &str, fields: &str) -> ApiRequest {
    ApiRequest::get(format!("files/{}", urlencoding::encode(file_id)))
        .query("supportsAllDrives", true)
        .query("fields", fields)
}

/// One page of `drives.list`.
pub fn drives_list(page_token: Option<&str>, page_size: u32) -> ApiRequest {
    ApiRequest::get("drives")
        .query_opt("pageToken", page_token)
        .query("pageSize", page_size)
        .query("fields", "nextPageToken, drives(id, name)")
}

/// Parameters of one `files.list` page of a media listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListing<'a> {
    pub parent_id: &'a str,
    pub mime_type_check: &'a str,
    pub order_by: &'a str,
    pub page_size: u32,
    /// Selector placed inside `files(...)`
    pub file_fields: &'a str,
}

/// One page of `files.list` for a media listing.
pub fn files_list(listing: &FileListing<'_>, page_token: Option<&str>) -> ApiRequest {
    let q = format!(
        "\"{}\" in parents and {} and trashed = false",
        listing.parent_id, listing.mime_type_check
    );

    ApiRequest::get("files")
        .query("q", q)
        .query("supportsAllDrives", true)
        .query("includeItemsFromAllDrives", true)
        .query("orderBy", listing.order_by)
        .query_opt("pageToken", page_token)
        .query("pageSize", listing.page_size)
        .query("fields", format!("nextPageToken, files({})", listing.file_fields))
}
