//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// IO error while talking to the spooler
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Printer is not installed or cannot be opened
    #[error("Printer not found: {0}")]
    NotFound(String),

    /// Printer enumeration failed as a whole
    #[error("Printer enumeration failed: {0}")]
    Enumeration(String),

    /// A spooler call for a specific printer failed
    #[error("Spooler error on {printer}: {message}")]
    Spooler { printer: String, message: String },

    /// Windows-specific printing error
    #[cfg(windows)]
    #[error("Windows printer error: {0}")]
    WindowsPrinter(String),
}

impl PrintError {
    /// Spooler failure attributed to one printer
    pub fn spooler(printer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spooler {
            printer: printer.into(),
            message: message.into(),
        }
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
