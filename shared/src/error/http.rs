//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound | Self::OrderNotFound | Self::ExportEmpty | Self::BackupNotFound => {
                StatusCode::NOT_FOUND
            }

            Self::InternalError
            | Self::DatabaseError
            | Self::StorageError
            | Self::BackupInvalid
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (validation and malformed input)
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::UploadMissingFile
            | Self::UploadInvalidName => StatusCode::BAD_REQUEST,
        }
    }
}
