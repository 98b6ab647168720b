//! Raw device writer
//!
//! Pushes label bytes through the spooler as a pass-through job:
//! open -> start doc (RAW) -> start page -> write -> end page -> end doc -> close.
//!
//! Every acquired step is owned by a guard whose `Drop` runs the matching
//! release, so a failure anywhere still ends the page, ends the job, closes
//! the handle and frees the job buffer.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::error::PrintResult;
use crate::spooler::SpoolSession;

/// Document name shown in the spooler queue
pub const RAW_DOC_NAME: &str = "Kiosk Label";

/// Sends raw bytes to a named printer.
///
/// Returns `true` only if the spooler accepted exactly `data.len()` bytes.
/// Blocking; call it from a blocking context.
pub trait RawDeviceWriter: Send + Sync + 'static {
    fn write(&self, printer_name: &str, data: &[u8]) -> bool;
}

/// Heap buffer holding one job's bytes, released on drop
#[derive(Debug)]
pub struct JobBuffer {
    bytes: Box<[u8]>,
}

impl JobBuffer {
    /// Allocate a buffer sized to `data` and copy it in
    pub fn copy_from(data: &[u8]) -> Self {
        Self {
            bytes: Box::from(data),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// [`RawDeviceWriter`] over any [`SpoolSession`] backend
pub struct SpoolWriter<S> {
    session: Arc<S>,
    doc_name: String,
}

impl<S: SpoolSession> SpoolWriter<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self {
            session,
            doc_name: RAW_DOC_NAME.to_string(),
        }
    }

    /// Override the document name shown in the queue
    pub fn with_doc_name(mut self, doc_name: impl Into<String>) -> Self {
        self.doc_name = doc_name.into();
        self
    }

    /// Run the full job sequence and return the byte count the spooler accepted.
    pub fn submit(&self, printer_name: &str, data: &[u8]) -> PrintResult<usize> {
        let mut printer = OpenPrinter::open(self.session.as_ref(), printer_name)?;

        let written = {
            let mut doc = printer.start_doc(&self.doc_name)?;
            let written = {
                let mut page = doc.start_page()?;
                let buffer = JobBuffer::copy_from(data);
                let written = page.write(&buffer)?;
                page.finish()?;
                written
            };
            doc.finish()?;
            written
        };

        printer.close()?;
        Ok(written)
    }
}

impl<S: SpoolSession> RawDeviceWriter for SpoolWriter<S> {
    #[instrument(skip(self, data), fields(printer = %printer_name, data_len = data.len()))]
    fn write(&self, printer_name: &str, data: &[u8]) -> bool {
        match self.submit(printer_name, data) {
            Ok(written) if written == data.len() => {
                info!("Raw job accepted");
                true
            }
            Ok(written) => {
                warn!(written, "Incomplete write");
                false
            }
            Err(e) => {
                error!(error = %e, "Raw job failed");
                false
            }
        }
    }
}

/// Open printer handle; closes on drop unless closed explicitly
struct OpenPrinter<'a, S: SpoolSession> {
    session: &'a S,
    printer: &'a str,
    handle: S::Handle,
    closed: bool,
}

impl<'a, S: SpoolSession> OpenPrinter<'a, S> {
    fn open(session: &'a S, printer: &'a str) -> PrintResult<Self> {
        let handle = session.open(printer)?;
        debug!(printer, "Printer handle opened");
        Ok(Self {
            session,
            printer,
            handle,
            closed: false,
        })
    }

    fn start_doc(&mut self, doc_name: &str) -> PrintResult<DocScope<'_, S>> {
        self.session.start_doc(&mut self.handle, doc_name)?;
        Ok(DocScope {
            session: self.session,
            printer: self.printer,
            handle: &mut self.handle,
            open: true,
        })
    }

    fn close(mut self) -> PrintResult<()> {
        self.closed = true;
        self.session.close(&mut self.handle)
    }
}

impl<S: SpoolSession> Drop for OpenPrinter<'_, S> {
    fn drop(&mut self) {
        if !self.closed
            && let Err(e) = self.session.close(&mut self.handle)
        {
            warn!(printer = self.printer, error = %e, "ClosePrinter failed during cleanup");
        }
    }
}

/// Started job; ends on drop unless finished explicitly
struct DocScope<'a, S: SpoolSession> {
    session: &'a S,
    printer: &'a str,
    handle: &'a mut S::Handle,
    open: bool,
}

impl<S: SpoolSession> DocScope<'_, S> {
    fn start_page(&mut self) -> PrintResult<PageScope<'_, S>> {
        self.session.start_page(self.handle)?;
        Ok(PageScope {
            session: self.session,
            printer: self.printer,
            handle: &mut *self.handle,
            open: true,
        })
    }

    fn finish(mut self) -> PrintResult<()> {
        self.open = false;
        self.session.end_doc(self.handle)
    }
}

impl<S: SpoolSession> Drop for DocScope<'_, S> {
    fn drop(&mut self) {
        if self.open
            && let Err(e) = self.session.end_doc(self.handle)
        {
            warn!(printer = self.printer, error = %e, "EndDocPrinter failed during cleanup");
        }
    }
}

/// Started page; ends on drop unless finished explicitly
struct PageScope<'a, S: SpoolSession> {
    session: &'a S,
    printer: &'a str,
    handle: &'a mut S::Handle,
    open: bool,
}

impl<S: SpoolSession> PageScope<'_, S> {
    fn write(&mut self, buffer: &JobBuffer) -> PrintResult<usize> {
        self.session.write(self.handle, buffer.as_slice())
    }

    fn finish(mut self) -> PrintResult<()> {
        self.open = false;
        self.session.end_page(self.handle)
    }
}

impl<S: SpoolSession> Drop for PageScope<'_, S> {
    fn drop(&mut self) {
        if self.open
            && let Err(e) = self.session.end_page(self.handle)
        {
            warn!(printer = self.printer, error = %e, "EndPagePrinter failed during cleanup");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrintError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Script {
        fail_open: bool,
        fail_start_doc: bool,
        fail_start_page: bool,
        fail_write: bool,
        short_by: usize,
        fail_end_doc: bool,
    }

    #[derive(Default)]
    struct MockSession {
        script: Script,
        calls: Mutex<Vec<String>>,
        written: Mutex<Vec<u8>>,
    }

    impl MockSession {
        fn with(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                ..Default::default()
            })
        }

        fn record(&self, call: &str) {
            self.calls.lock().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    fn fail(step: &str) -> PrintError {
        PrintError::spooler("mock", format!("{} failed", step))
    }

    impl SpoolSession for MockSession {
        type Handle = u32;

        fn open(&self, printer_name: &str) -> PrintResult<u32> {
            self.record("open");
            if self.script.fail_open {
                return Err(PrintError::NotFound(printer_name.to_string()));
            }
            Ok(7)
        }

        fn start_doc(&self, handle: &mut u32, doc_name: &str) -> PrintResult<()> {
            assert_eq!(*handle, 7);
            assert_eq!(doc_name, RAW_DOC_NAME);
            self.record("start_doc");
            if self.script.fail_start_doc {
                return Err(fail("start_doc"));
            }
            Ok(())
        }

        fn start_page(&self, _handle: &mut u32) -> PrintResult<()> {
            self.record("start_page");
            if self.script.fail_start_page {
                return Err(fail("start_page"));
            }
            Ok(())
        }

        fn write(&self, _handle: &mut u32, data: &[u8]) -> PrintResult<usize> {
            self.record("write");
            if self.script.fail_write {
                return Err(fail("write"));
            }
            let accepted = data.len() - self.script.short_by;
            self.written.lock().extend_from_slice(&data[..accepted]);
            Ok(accepted)
        }

        fn end_page(&self, _handle: &mut u32) -> PrintResult<()> {
            self.record("end_page");
            Ok(())
        }

        fn end_doc(&self, _handle: &mut u32) -> PrintResult<()> {
            self.record("end_doc");
            if self.script.fail_end_doc {
                return Err(fail("end_doc"));
            }
            Ok(())
        }

        fn close(&self, _handle: &mut u32) -> PrintResult<()> {
            self.record("close");
            Ok(())
        }
    }

    const LABEL: &[u8] = b"^XA^FDHello^FS^XZ";

    #[test]
    fn test_successful_job_sequence() {
        let session = MockSession::with(Script::default());
        let writer = SpoolWriter::new(session.clone());

        assert!(writer.write("ZDesigner GK420d", LABEL));
        assert_eq!(
            session.calls(),
            vec!["open", "start_doc", "start_page", "write", "end_page", "end_doc", "close"]
        );
        assert_eq!(session.written.lock().as_slice(), LABEL);
    }

    #[test]
    fn test_short_write_is_failure_and_still_cleans_up() {
        let session = MockSession::with(Script {
            short_by: 3,
            ..Default::default()
        });
        let writer = SpoolWriter::new(session.clone());

        assert_eq!(writer.submit("p", LABEL).unwrap(), LABEL.len() - 3);
        assert!(!writer.write("p", LABEL));
        assert_eq!(
            session.calls()[7..],
            ["open", "start_doc", "start_page", "write", "end_page", "end_doc", "close"]
        );
    }

    #[test]
    fn test_open_failure_fails_fast() {
        let session = MockSession::with(Script {
            fail_open: true,
            ..Default::default()
        });
        let writer = SpoolWriter::new(session.clone());

        assert!(!writer.write("missing", LABEL));
        assert_eq!(session.calls(), vec!["open"]);
    }

    #[test]
    fn test_start_doc_failure_closes_handle() {
        let session = MockSession::with(Script {
            fail_start_doc: true,
            ..Default::default()
        });
        let writer = SpoolWriter::new(session.clone());

        assert!(!writer.write("p", LABEL));
        assert_eq!(session.calls(), vec!["open", "start_doc", "close"]);
    }

    #[test]
    fn test_start_page_failure_ends_doc_and_closes() {
        let session = MockSession::with(Script {
            fail_start_page: true,
            ..Default::default()
        });
        let writer = SpoolWriter::new(session.clone());

        assert!(!writer.write("p", LABEL));
        assert_eq!(
            session.calls(),
            vec!["open", "start_doc", "start_page", "end_doc", "close"]
        );
    }

    #[test]
    fn test_write_error_runs_all_cleanup() {
        let session = MockSession::with(Script {
            fail_write: true,
            ..Default::default()
        });
        let writer = SpoolWriter::new(session.clone());

        assert!(!writer.write("p", LABEL));
        assert_eq!(
            session.calls(),
            vec!["open", "start_doc", "start_page", "write", "end_page", "end_doc", "close"]
        );
    }

    #[test]
    fn test_end_doc_failure_reports_failure_once() {
        let session = MockSession::with(Script {
            fail_end_doc: true,
            ..Default::default()
        });
        let writer = SpoolWriter::new(session.clone());

        assert!(!writer.write("p", LABEL));
        let calls = session.calls();
        assert_eq!(calls.iter().filter(|c| *c == "end_doc").count(), 1);
        assert_eq!(calls.last().map(String::as_str), Some("close"));
    }

    #[test]
    fn test_job_buffer_copies_bytes() {
        let buffer = JobBuffer::copy_from(LABEL);
        assert_eq!(buffer.len(), LABEL.len());
        assert!(!buffer.is_empty());
        assert_eq!(buffer.as_slice(), LABEL);
    }
}
