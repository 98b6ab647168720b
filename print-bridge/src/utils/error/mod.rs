//! Unified error handling
//!
//! - [`ErrorCode`] - numeric codes grouped by category and mapped to HTTP status
//! - [`AppError`] - error carried through handlers
//! - [`ApiResponse`] - `{ code, message, data?, details? }` envelope

mod codes;
mod types;

pub use codes::{ErrorCategory, ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};

use axum::Json;

/// Wrap data in a success envelope
pub fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}
