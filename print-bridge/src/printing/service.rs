//! Print service
//!
//! Resolves the target printer and writes labels one at a time through the
//! raw device writer, pausing between jobs so the printer's input buffer
//! keeps up.

use std::sync::Arc;
use std::time::Duration;

use kiosk_printer::{DiscoveryService, RawDeviceWriter};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::utils::{AppError, ErrorCode};

#[derive(Debug, Error)]
pub enum PrintJobError {
    #[error("No printer specified and no default printer found")]
    NoPrinter,

    #[error("Failed to send label {printed} to printer '{printer}'")]
    WriteFailed { printer: String, printed: usize },

    #[error("Print job cancelled after {printed} of {total} labels")]
    Cancelled {
        printer: String,
        printed: usize,
        total: usize,
    },

    #[error("Print task failed: {0}")]
    Join(String),
}

impl From<PrintJobError> for AppError {
    fn from(err: PrintJobError) -> Self {
        let message = err.to_string();
        match err {
            PrintJobError::NoPrinter => AppError::printer_not_available(),
            PrintJobError::WriteFailed { printer, printed } => {
                AppError::print_failed(&printer).with_detail("printed", printed)
            }
            PrintJobError::Cancelled {
                printer,
                printed,
                total,
            } => AppError::with_message(ErrorCode::PrintCancelled, message)
                .with_detail("printerName", printer)
                .with_detail("printed", printed)
                .with_detail("total", total),
            PrintJobError::Join(msg) => AppError::internal(msg),
        }
    }
}

/// Sequential label printing over a shared writer
#[derive(Clone)]
pub struct PrintService {
    discovery: DiscoveryService,
    writer: Arc<dyn RawDeviceWriter>,
    item_delay: Duration,
}

impl PrintService {
    pub fn new(
        discovery: DiscoveryService,
        writer: Arc<dyn RawDeviceWriter>,
        item_delay: Duration,
    ) -> Self {
        Self {
            discovery,
            writer,
            item_delay,
        }
    }

    pub fn item_delay(&self) -> Duration {
        self.item_delay
    }

    /// Explicit printer name, or the snapshot default when absent or blank.
    ///
    /// An explicit name is passed through untouched; the spooler decides
    /// whether it exists.
    pub async fn resolve_printer(&self, requested: Option<&str>) -> Result<String, PrintJobError> {
        if let Some(name) = requested
            && !name.trim().is_empty()
        {
            return Ok(name.to_string());
        }

        match self.discovery.default_printer().await {
            Some(printer) => {
                debug!(printer = %printer.name, "Resolved default printer");
                Ok(printer.name)
            }
            None => Err(PrintJobError::NoPrinter),
        }
    }

    /// Write labels to one printer in order, returning how many were printed.
    ///
    /// Stops at the first failed write. Cancellation is honoured between
    /// labels; a write already handed to the spooler always completes.
    #[instrument(skip(self, labels, cancel), fields(total = labels.len()))]
    pub async fn print_sequence(
        &self,
        printer: &str,
        labels: Vec<Arc<str>>,
        cancel: &CancellationToken,
    ) -> Result<usize, PrintJobError> {
        let total = labels.len();
        let cancelled = |printed| PrintJobError::Cancelled {
            printer: printer.to_string(),
            printed,
            total,
        };

        if cancel.is_cancelled() {
            return Err(cancelled(0));
        }

        for (printed, label) in labels.into_iter().enumerate() {
            if printed > 0 && !self.item_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        warn!(printed, total, "Print sequence cancelled");
                        return Err(cancelled(printed));
                    }
                    _ = tokio::time::sleep(self.item_delay) => {}
                }
            } else if printed > 0 && cancel.is_cancelled() {
                warn!(printed, total, "Print sequence cancelled");
                return Err(cancelled(printed));
            }

            if !self.write_one(printer, label).await? {
                return Err(PrintJobError::WriteFailed {
                    printer: printer.to_string(),
                    printed,
                });
            }
        }

        info!(total, "Print sequence completed");
        Ok(total)
    }

    async fn write_one(&self, printer: &str, label: Arc<str>) -> Result<bool, PrintJobError> {
        let writer = self.writer.clone();
        let printer = printer.to_string();
        tokio::task::spawn_blocking(move || writer.write(&printer, label.as_bytes()))
            .await
            .map_err(|e| PrintJobError::Join(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_printer::{PrintResult, PrinterDetails, Spooler, SpoolerEntry};
    use parking_lot::Mutex;

    const LABEL: &str = "^XA^FO50,50^FDHello^FS^XZ";

    struct OnePrinter(Option<&'static str>);

    impl Spooler for OnePrinter {
        fn enumerate(&self) -> PrintResult<Vec<SpoolerEntry>> {
            Ok(self.0.into_iter().map(SpoolerEntry::new).collect())
        }

        fn default_printer(&self) -> PrintResult<Option<String>> {
            Ok(self.0.map(String::from))
        }

        fn printer_details(&self, _name: &str) -> PrintResult<PrinterDetails> {
            Ok(PrinterDetails {
                driver_name: "ZDesigner GK420d".into(),
                port_name: "USB001".into(),
                offline: None,
            })
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        jobs: Mutex<Vec<(String, Vec<u8>)>>,
        fail_on: Option<usize>,
        cancel_after_first: Option<CancellationToken>,
    }

    impl RecordingWriter {
        fn count(&self) -> usize {
            self.jobs.lock().len()
        }
    }

    impl RawDeviceWriter for RecordingWriter {
        fn write(&self, printer_name: &str, data: &[u8]) -> bool {
            let mut jobs = self.jobs.lock();
            if self.fail_on == Some(jobs.len()) {
                return false;
            }
            jobs.push((printer_name.to_string(), data.to_vec()));
            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }
            true
        }
    }

    fn service(
        default: Option<&'static str>,
        writer: Arc<RecordingWriter>,
        delay: Duration,
    ) -> PrintService {
        let discovery = DiscoveryService::new(Arc::new(OnePrinter(default)));
        PrintService::new(discovery, writer, delay)
    }

    fn labels(n: usize) -> Vec<Arc<str>> {
        vec![Arc::from(LABEL); n]
    }

    #[tokio::test]
    async fn test_resolve_prefers_explicit_name() {
        let svc = service(Some("Front Desk"), Arc::default(), Duration::ZERO);
        assert_eq!(svc.resolve_printer(Some("Lobby")).await.unwrap(), "Lobby");
        assert_eq!(svc.resolve_printer(Some("  ")).await.unwrap(), "Front Desk");
        assert_eq!(svc.resolve_printer(None).await.unwrap(), "Front Desk");
    }

    #[tokio::test]
    async fn test_resolve_without_default_fails() {
        let svc = service(None, Arc::default(), Duration::ZERO);
        assert!(matches!(
            svc.resolve_printer(None).await,
            Err(PrintJobError::NoPrinter)
        ));
    }

    #[tokio::test]
    async fn test_sequence_writes_every_label_in_order() {
        let writer = Arc::new(RecordingWriter::default());
        let svc = service(None, writer.clone(), Duration::ZERO);
        let cancel = CancellationToken::new();

        let printed = svc
            .print_sequence("Front Desk", vec![Arc::from("^XA1^XZ"), Arc::from("^XA2^XZ")], &cancel)
            .await
            .unwrap();

        assert_eq!(printed, 2);
        let jobs = writer.jobs.lock();
        assert_eq!(jobs[0], ("Front Desk".to_string(), b"^XA1^XZ".to_vec()));
        assert_eq!(jobs[1].1, b"^XA2^XZ".to_vec());
    }

    #[tokio::test]
    async fn test_sequence_stops_at_first_failure() {
        let writer = Arc::new(RecordingWriter {
            fail_on: Some(1),
            ..Default::default()
        });
        let svc = service(None, writer.clone(), Duration::ZERO);

        let err = svc
            .print_sequence("Front Desk", labels(3), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PrintJobError::WriteFailed { printed: 1, .. }));
        assert_eq!(writer.count(), 1);

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::PrintFailed);
        assert!(app.message.contains("Front Desk"));
    }

    #[tokio::test]
    async fn test_cancelled_token_prints_nothing() {
        let writer = Arc::new(RecordingWriter::default());
        let svc = service(None, writer.clone(), Duration::ZERO);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = svc
            .print_sequence("Front Desk", labels(2), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, PrintJobError::Cancelled { printed: 0, total: 2, .. }));
        assert_eq!(writer.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_between_items_stops_batch() {
        let cancel = CancellationToken::new();
        let writer = Arc::new(RecordingWriter {
            cancel_after_first: Some(cancel.clone()),
            ..Default::default()
        });
        let svc = service(None, writer.clone(), Duration::from_millis(250));

        let err = svc
            .print_sequence("Front Desk", labels(5), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PrintJobError::Cancelled { printed: 1, total: 5, .. }));
        assert_eq!(writer.count(), 1);

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::PrintCancelled);
        assert_eq!(app.http_status(), http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_items() {
        let writer = Arc::new(RecordingWriter::default());
        let svc = service(None, writer.clone(), Duration::from_millis(250));
        let start = tokio::time::Instant::now();

        svc.print_sequence("Front Desk", labels(3), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(writer.count(), 3);
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
