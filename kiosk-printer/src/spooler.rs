//! OS print spooler abstraction
//!
//! Two seams, both implemented by every native backend:
//!
//! - [`Spooler`] - enumeration side (installed printers, default, metadata)
//! - [`SpoolSession`] - raw job primitives (open, doc, page, write, close)
//!
//! Discovery and validation only ever see these traits, so a backend can be
//! swapped without touching either.

use crate::error::PrintResult;

/// One installed printer as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolerEntry {
    pub name: String,
    pub offline: bool,
}

impl SpoolerEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offline: false,
        }
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

/// Per-printer metadata looked up after enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrinterDetails {
    pub driver_name: String,
    pub port_name: String,
    /// Status reported by the printer itself, if the backend knows it
    pub offline: Option<bool>,
}

/// Enumeration side of the spooler. All calls block.
pub trait Spooler: Send + Sync + 'static {
    /// Installed printers, in spooler order
    fn enumerate(&self) -> PrintResult<Vec<SpoolerEntry>>;

    /// Name of the system default printer, if any
    fn default_printer(&self) -> PrintResult<Option<String>>;

    /// Driver and port for one printer
    fn printer_details(&self, name: &str) -> PrintResult<PrinterDetails>;
}

/// Raw job primitives of the spooler. All calls block.
///
/// `SpoolWriter` sequences these and guarantees that every successful
/// `open`/`start_doc`/`start_page` is paired with `close`/`end_doc`/`end_page`.
pub trait SpoolSession: Send + Sync + 'static {
    /// Open printer handle
    type Handle: Send;

    fn open(&self, printer_name: &str) -> PrintResult<Self::Handle>;

    /// Begin a pass-through (`RAW` datatype) job
    fn start_doc(&self, handle: &mut Self::Handle, doc_name: &str) -> PrintResult<()>;

    fn start_page(&self, handle: &mut Self::Handle) -> PrintResult<()>;

    /// Write once, returning the number of bytes the spooler accepted
    fn write(&self, handle: &mut Self::Handle, data: &[u8]) -> PrintResult<usize>;

    fn end_page(&self, handle: &mut Self::Handle) -> PrintResult<()>;

    fn end_doc(&self, handle: &mut Self::Handle) -> PrintResult<()>;

    /// Release the handle; called exactly once per successful `open`
    fn close(&self, handle: &mut Self::Handle) -> PrintResult<()>;
}
