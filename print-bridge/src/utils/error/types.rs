//! `AppError` and the JSON envelope every endpoint except `/health` answers with

use super::codes::{ErrorCategory, ErrorCode};
use axum::extract::rejection::JsonRejection;
use http::StatusCode;
use kiosk_printer::LabelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned by handlers
///
/// `message` is shown to the kiosk operator as-is, so it names the field,
/// label index or printer involved.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    /// Machine-readable context: `field`, `index`, `printerName`, limits
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's fallback message
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach one `details` entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn not_found(path: &str) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("No route for {}", path))
    }

    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidFormat, msg)
    }

    pub fn required_field(field: &str) -> Self {
        Self::with_message(ErrorCode::RequiredField, format!("{} is required", field))
            .with_detail("field", field)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// No printer named and no default printer installed
    pub fn printer_not_available() -> Self {
        Self::with_message(
            ErrorCode::PrinterNotAvailable,
            "No printer specified and no default printer found",
        )
    }

    /// Device write failed on the named printer
    pub fn print_failed(printer: &str) -> Self {
        Self::with_message(
            ErrorCode::PrintFailed,
            format!("Failed to send label to printer '{}'", printer),
        )
        .with_detail("printerName", printer)
    }
}

impl From<LabelError> for AppError {
    fn from(err: LabelError) -> Self {
        let code = match &err {
            LabelError::Empty => ErrorCode::LabelEmpty,
            LabelError::TooLarge { .. } => ErrorCode::LabelTooLarge,
            LabelError::MissingEnvelope => ErrorCode::LabelMissingEnvelope,
            LabelError::ForbiddenCommand { .. } => ErrorCode::LabelForbiddenCommand,
        };
        let app = Self::with_message(code, err.to_string());
        match err {
            LabelError::TooLarge { actual, max } => {
                app.with_detail("actual", actual).with_detail("max", max)
            }
            LabelError::ForbiddenCommand { command } => app.with_detail("command", command),
            _ => app,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(ErrorCode::BodyTooLarge);
        }
        Self::invalid_format(rejection.body_text())
    }
}

/// Response envelope
///
/// ```json
/// { "code": 0, "message": "OK", "data": { "printerName": "Front Desk", "copies": 1 } }
/// { "code": 2004, "message": "Label content contains forbidden command ~JR", "details": { "command": "~JR" } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: ErrorCode::Success.code(),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();

        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "Print request failed");
        } else {
            tracing::debug!(code = %self.code, message = %self.message, "Request rejected");
        }

        (status, axum::Json(ApiResponse::<()>::error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_message() {
        let err = AppError::new(ErrorCode::PrintFailed);
        assert_eq!(err.message, "Print operation failed");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::invalid_format("bad body")
            .with_detail("index", 3)
            .with_detail("reason", "empty");

        let details = err.details.unwrap();
        assert_eq!(details["index"], 3);
        assert_eq!(details["reason"], "empty");
    }

    #[test]
    fn test_label_error_conversion() {
        let err = AppError::from(LabelError::TooLarge {
            actual: 200_000,
            max: 102_400,
        });
        assert_eq!(err.code, ErrorCode::LabelTooLarge);
        assert!(err.message.contains("200000"));
        assert_eq!(err.details.unwrap()["max"], 102_400);

        let err = AppError::from(LabelError::ForbiddenCommand { command: "~JR" });
        assert_eq!(err.code, ErrorCode::LabelForbiddenCommand);
        assert!(err.message.contains("~JR"));
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_print_failed_carries_printer() {
        let err = AppError::print_failed("Front Desk");
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("Front Desk"));
        assert_eq!(err.details.unwrap()["printerName"], "Front Desk");
    }

    #[test]
    fn test_success_envelope_omits_details() {
        let json = serde_json::to_value(ApiResponse::success("hello")).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["message"], "OK");
        assert_eq!(json["data"], "hello");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let response = ApiResponse::<()>::error(&AppError::required_field("labelContent"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], 3);
        assert_eq!(json["message"], "labelContent is required");
        assert!(json.get("data").is_none());
        assert_eq!(json["details"]["field"], "labelContent");
    }
}
