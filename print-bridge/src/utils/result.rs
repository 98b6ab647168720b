//! Unified Result Types

pub use super::error::AppResult;

/// Startup-level Result type, used by `main` and environment setup
pub type BoxResult<T> = Result<T, Box<dyn std::error::Error>>;
