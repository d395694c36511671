//! Error types for Google Drive provider

use core_batch::BatchError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GoogleDriveError {
    /// No single live directory matched, or the directory is not where the
    /// caller expected it
    #[error("Directory not found: {name}")]
    DirectoryNotFound { name: String },

    /// File missing or trashed
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Shared drive missing or not accessible
    #[error("Drive not found: {drive_id}")]
    DriveNotFound { drive_id: String },

    /// A requested field is outside what the operation supports
    #[error("Unsupported fields for {operation}: {fields}")]
    UnsupportedField { fields: String, operation: String },

    /// Failure from the batching layer (rate limit, API, transport, decode)
    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl GoogleDriveError {
    /// Replace a generic not-found with an operation-specific error.
    pub(crate) fn refine_not_found(self, refined: impl FnOnce() -> GoogleDriveError) -> Self {
        match self {
            GoogleDriveError::Batch(BatchError::NotFound) => refined(),
            other => other,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GoogleDriveError::Batch(e) if e.is_rate_limited())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GoogleDriveError::DirectoryNotFound { .. }
                | GoogleDriveError::FileNotFound { .. }
                | GoogleDriveError::DriveNotFound { .. }
                | GoogleDriveError::Batch(BatchError::NotFound)
        )
    }
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use core_batch::RawError;

    #[test]
    fn test_error_display() {
        let error = GoogleDriveError::UnsupportedField {
            fields: "id, bogusField".to_string(),
            operation: "list_files".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Unsupported fields for list_files: id, bogusField"
        );
    }

    #[test]
    fn test_refine_not_found() {
        let refined = GoogleDriveError::from(BatchError::NotFound).refine_not_found(|| {
            GoogleDriveError::DriveNotFound {
                drive_id: "0A1".to_string(),
            }
        });
        assert_eq!(
            refined,
            GoogleDriveError::DriveNotFound {
                drive_id: "0A1".to_string()
            }
        );

        let untouched = GoogleDriveError::from(BatchError::Api(RawError::new(500, "Backend")))
            .refine_not_found(|| GoogleDriveError::DriveNotFound {
                drive_id: "0A1".to_string(),
            });
        assert!(matches!(untouched, GoogleDriveError::Batch(BatchError::Api(_))));
    }

    #[test]
    fn test_classification_helpers() {
        let limited = GoogleDriveError::from(BatchError::RateLimited(RawError::new(403, "Slow")));
        assert!(limited.is_rate_limited());
        assert!(!limited.is_not_found());

        let missing = GoogleDriveError::FileNotFound {
            file_id: "x".to_string(),
        };
        assert!(missing.is_not_found());
    }
}
