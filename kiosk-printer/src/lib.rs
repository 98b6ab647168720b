//! # kiosk-printer
//!
//! Label printer plumbing for the check-in kiosk bridge - everything between
//! "here is a ZPL string" and "the bytes reached the spooler".
//!
//! ## Scope
//!
//! This crate handles HOW labels reach hardware:
//! - ZPL safety validation (envelope, size ceiling, dangerous commands)
//! - Printer discovery with a TTL snapshot cache
//! - Raw (pass-through) job submission through the OS spooler
//! - Native backends: Win32 spooler on Windows, CUPS elsewhere
//!
//! HTTP, request shapes and batching stay in `print-bridge`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use kiosk_printer::{DiscoveryService, NativeSpooler, RawDeviceWriter, SpoolWriter, zpl};
//!
//! let spooler = Arc::new(NativeSpooler::new());
//! let discovery = DiscoveryService::new(spooler.clone());
//! let writer = SpoolWriter::new(spooler);
//!
//! let label = "^XA^FO50,50^A0N,40,40^FDHello^FS^XZ";
//! zpl::security_valid(label)?;
//!
//! if let Some(printer) = discovery.default_printer().await {
//!     writer.write(&printer.name, label.as_bytes());
//! }
//! ```

mod discovery;
mod error;
mod spooler;
mod writer;
pub mod zpl;

#[cfg(not(windows))]
mod cups;
#[cfg(windows)]
mod win32;

// Re-exports
pub use discovery::{
    DEFAULT_TTL, DiscoveryService, DiscoverySnapshot, PrinterInfo, PrinterStatus, is_label_printer,
};
pub use error::{PrintError, PrintResult};
pub use spooler::{PrinterDetails, SpoolSession, Spooler, SpoolerEntry};
pub use writer::{JobBuffer, RAW_DOC_NAME, RawDeviceWriter, SpoolWriter};
pub use zpl::LabelError;

#[cfg(not(windows))]
pub use cups::CupsSpooler;
#[cfg(windows)]
pub use win32::WindowsSpooler;

/// Spooler backend for the host operating system.
#[cfg(windows)]
pub type NativeSpooler = WindowsSpooler;

/// Spooler backend for the host operating system.
#[cfg(not(windows))]
pub type NativeSpooler = CupsSpooler;
