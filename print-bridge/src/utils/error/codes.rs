//! Error codes for the print bridge
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Request shape errors
//! - 2xxx: Label content errors
//! - 9xxx: System / device errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error category, derived from the code range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    General,
    Request,
    Label,
    System,
}

/// Error codes returned in the `code` field of every envelope.
///
/// Serialized as a plain number so the kiosk can switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    Success = 0,
    /// No such route
    NotFound = 1,
    /// Body is not valid JSON for the endpoint
    InvalidFormat = 2,
    RequiredField = 3,

    // ==================== 1xxx: Request shape ====================
    /// Batch has no labels
    BatchEmpty = 1001,
    /// Batch exceeds the maximum size
    BatchTooLarge = 1002,
    /// Copies outside the accepted range
    CopiesOutOfRange = 1003,
    /// Request body exceeds the body limit
    BodyTooLarge = 1004,

    // ==================== 2xxx: Label content ====================
    /// Label content is empty
    LabelEmpty = 2001,
    /// Label content exceeds the size ceiling
    LabelTooLarge = 2002,
    /// Label is missing the ^XA/^XZ envelope
    LabelMissingEnvelope = 2003,
    /// Label contains a forbidden device command
    LabelForbiddenCommand = 2004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Printer not available (no explicit printer and no default)
    PrinterNotAvailable = 9201,
    /// Print operation failed
    PrintFailed = 9202,
    /// Print job cancelled before completion
    PrintCancelled = 9203,
}

impl ErrorCode {
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Fallback message when the error carries no specific reason
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::NotFound => "Route not found",
            ErrorCode::InvalidFormat => "Malformed request body",
            ErrorCode::RequiredField => "Required field missing",
            ErrorCode::BatchEmpty => "Batch contains no labels",
            ErrorCode::BatchTooLarge => "Batch contains too many labels",
            ErrorCode::CopiesOutOfRange => "Copies out of range",
            ErrorCode::BodyTooLarge => "Request body is too large",
            ErrorCode::LabelEmpty => "Label content is empty",
            ErrorCode::LabelTooLarge => "Label content is too large",
            ErrorCode::LabelMissingEnvelope => "Label content must start with ^XA and end with ^XZ",
            ErrorCode::LabelForbiddenCommand => "Label content contains a forbidden command",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::PrinterNotAvailable => "Printer is not available",
            ErrorCode::PrintFailed => "Print operation failed",
            ErrorCode::PrintCancelled => "Print job cancelled",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            1000..=1999 => ErrorCategory::Request,
            2000..=2999 => ErrorCategory::Label,
            9000..=9999 => ErrorCategory::System,
            _ => ErrorCategory::General,
        }
    }

    /// HTTP status for this code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound => StatusCode::NOT_FOUND,

            Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 503 Service Unavailable (shutdown in progress, client can retry)
            Self::PrintCancelled => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::PrinterNotAvailable | Self::PrintFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (request shape and label content)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Unknown numeric error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::NotFound),
            2 => Ok(ErrorCode::InvalidFormat),
            3 => Ok(ErrorCode::RequiredField),
            1001 => Ok(ErrorCode::BatchEmpty),
            1002 => Ok(ErrorCode::BatchTooLarge),
            1003 => Ok(ErrorCode::CopiesOutOfRange),
            1004 => Ok(ErrorCode::BodyTooLarge),
            2001 => Ok(ErrorCode::LabelEmpty),
            2002 => Ok(ErrorCode::LabelTooLarge),
            2003 => Ok(ErrorCode::LabelMissingEnvelope),
            2004 => Ok(ErrorCode::LabelForbiddenCommand),
            9001 => Ok(ErrorCode::InternalError),
            9201 => Ok(ErrorCode::PrinterNotAvailable),
            9202 => Ok(ErrorCode::PrintFailed),
            9203 => Ok(ErrorCode::PrintCancelled),
            other => Err(InvalidErrorCode(other)),
        }
    }
}
