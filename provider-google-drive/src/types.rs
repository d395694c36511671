//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses. Every
//! field is optional on the wire because requests only ever ask for a
//! partial resource through `fields`.

use core_batch::RawError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MIME type Drive assigns to folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type Drive assigns to shortcuts.
pub const SHORTCUT_MIME_TYPE: &str = "application/vnd.google-apps.shortcut";

/// Families of items a listing can be filtered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Directory,
    Image,
    Video,
}

impl MediaKind {
    /// Prefix matched against `mimeType` with the `contains` operator.
    pub fn mime_type_prefix(&self) -> &'static str {
        match self {
            MediaKind::Directory => FOLDER_MIME_TYPE,
            MediaKind::Image => "image/",
            MediaKind::Video => "video/",
        }
    }
}

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriveFile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub trashed: bool,
    pub parents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_details: Option<ShortcutDetails>,
}

/// Target of a shortcut file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShortcutDetails {
    pub target_id: Option<String>,
    pub target_mime_type: Option<String>,
}

impl DriveFile {
    pub fn is_shortcut(&self) -> bool {
        self.mime_type.as_deref() == Some(SHORTCUT_MIME_TYPE)
    }

    /// ID of the item itself, or of the shortcut's target.
    pub fn effective_id(&self) -> Option<&str> {
        if self.is_shortcut() {
            self.shortcut_details
                .as_ref()
                .and_then(|details| details.target_id.as_deref())
        } else {
            self.id.as_deref()
        }
    }

    /// A folder, or a shortcut pointing at one.
    pub fn is_directory(&self) -> bool {
        match self.mime_type.as_deref() {
            Some(FOLDER_MIME_TYPE) => true,
            Some(SHORTCUT_MIME_TYPE) => self
                .shortcut_details
                .as_ref()
                .and_then(|details| details.target_mime_type.as_deref())
                == Some(FOLDER_MIME_TYPE),
            _ => false,
        }
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileList {
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

/// One `files.list` page kept as raw objects, so a caller-chosen field
/// selection can be cut out of each file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilePage {
    pub files: Vec<Map<String, Value>>,
}

/// Shared drive resource
///
/// See: https://developers.google.com/drive/api/v3/reference/drives#resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Drive {
    pub id: String,
    pub name: String,
}

/// Google Drive API drives.list response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriveList {
    pub drives: Vec<Drive>,
    pub next_page_token: Option<String>,
}

/// Error body returned for a failed request: `{"error": {...}}`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: RawError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_file() {
        let json = r#"{ "name": "Holiday", "trashed": true }"#;

        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.name.as_deref(), Some("Holiday"));
        assert!(file.trashed);
        assert!(file.parents.is_empty());
        assert_eq!(file.id, None);
    }

    #[test]
    fn test_shortcut_resolution() {
        let json = r#"{
            "id": "shortcut1",
            "mimeType": "application/vnd.google-apps.shortcut",
            "shortcutDetails": {
                "targetId": "folder9",
                "targetMimeType": "application/vnd.google-apps.folder"
            }
        }"#;

        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert!(file.is_shortcut());
        assert!(file.is_directory());
        assert_eq!(file.effective_id(), Some("folder9"));
    }

    #[test]
    fn test_shortcut_to_file_is_not_directory() {
        let file = DriveFile {
            mime_type: Some(SHORTCUT_MIME_TYPE.to_string()),
            shortcut_details: Some(ShortcutDetails {
                target_id: Some("img".to_string()),
                target_mime_type: Some("image/jpeg".to_string()),
            }),
            ..DriveFile::default()
        };
        assert!(!file.is_directory());

        let folder = DriveFile {
            id: Some("f".to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            ..DriveFile::default()
        };
        assert!(folder.is_directory());
        assert_eq!(folder.effective_id(), Some("f"));
    }

    #[test]
    fn test_deserialize_drive_list() {
        let json = r#"{
            "drives": [{ "id": "0A1", "name": "Team" }],
            "nextPageToken": "next"
        }"#;

        let list: DriveList = serde_json::from_str(json).unwrap();
        assert_eq!(list.drives, vec![Drive { id: "0A1".to_string(), name: "Team".to_string() }]);
        assert_eq!(list.next_page_token.as_deref(), Some("next"));
    }

    #[test]
    fn test_deserialize_error_envelope() {
        let json = r#"{
            "error": {
                "code": 404,
                "message": "File not found: abc.",
                "errors": [{ "domain": "global", "reason": "notFound", "message": "File not found: abc." }]
            }
        }"#;

        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.error.code, 404);
        assert!(envelope.error.has_reason("notFound"));
    }

    #[test]
    fn test_media_kind_prefixes() {
        assert_eq!(MediaKind::Directory.mime_type_prefix(), FOLDER_MIME_TYPE);
        assert_eq!(MediaKind::Image.mime_type_prefix(), "image/");
        assert_eq!(MediaKind::Video.mime_type_prefix(), "video/");
    }
}
