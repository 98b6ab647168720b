//! Utility module - shared types and helpers
//!
//! - [`AppError`] / [`ApiResponse`] - error envelope
//! - [`logger`] - tracing setup
//! - [`result`] - result aliases

pub mod error;
pub mod logger;
pub mod result;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use error::ok;
