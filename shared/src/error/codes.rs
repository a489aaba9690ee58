//! Unified error codes for the order tracker
//!
//! Codes are shared by the server's error bodies and the client's error
//! mapping. They are grouped by range:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Upload errors
//! - 6xxx: Export errors
//! - 7xxx: Backup errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as its `u16` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,

    // ==================== 5xxx: Upload ====================
    /// Multipart body had no `image` field
    UploadMissingFile = 5001,
    /// Requested upload name is not a plain file name
    UploadInvalidName = 5002,

    // ==================== 6xxx: Export ====================
    /// No orders in the requested period
    ExportEmpty = 6001,

    // ==================== 7xxx: Backup ====================
    /// No backup file available
    BackupNotFound = 7001,
    /// Backup file could not be read or has an unsupported version
    BackupInvalid = 7002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Local file storage error
    StorageError = 9003,
}

impl ErrorCode {
    /// Numeric value of this code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default human-readable message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::UploadMissingFile => "No file uploaded",
            ErrorCode::UploadInvalidName => "Invalid filename",
            ErrorCode::ExportEmpty => "No orders found for the selected period",
            ErrorCode::BackupNotFound => "No backup found",
            ErrorCode::BackupInvalid => "Invalid backup file",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StorageError => "Storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            4001 => Ok(ErrorCode::OrderNotFound),
            5001 => Ok(ErrorCode::UploadMissingFile),
            5002 => Ok(ErrorCode::UploadInvalidName),
            6001 => Ok(ErrorCode::ExportEmpty),
            7001 => Ok(ErrorCode::BackupNotFound),
            7002 => Ok(ErrorCode::BackupInvalid),
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::StorageError),
            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
