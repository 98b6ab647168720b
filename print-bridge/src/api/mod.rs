//! API routes
//!
//! - [`health`] - liveness and default printer
//! - [`printers`] - printer listing and refresh
//! - [`print`] - single, batch and test printing

pub mod health;
pub mod print;
pub mod printers;

pub use crate::utils::{ApiResponse, AppResult};

/// Unknown routes answer with the error envelope rather than an empty 404
pub async fn fallback(uri: http::Uri) -> crate::utils::AppError {
    crate::utils::AppError::not_found(uri.path())
}
