//! Printer discovery with a TTL snapshot cache
//!
//! Enumeration goes through the spooler (blocking, so it runs on the blocking
//! pool) and produces a brand-new [`DiscoverySnapshot`]. The snapshot is
//! published by swapping an `Arc`, so readers always see one complete list.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::spooler::Spooler;

/// Snapshot time-to-live
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Vendor and model-family tokens of ZPL label printers (lowercase)
const LABEL_PRINTER_TOKENS: &[&str] = &[
    "zebra", "zdesigner", "zpl", "eltron", "gk420", "gx420", "gx430", "gc420", "zd410", "zd420",
    "zd421", "zd620", "lp 2844", "tlp 2844",
];

/// Whether a printer looks like a ZPL label printer.
///
/// Heuristic over the printer and driver names; a generic driver on a real
/// label printer will not be recognised.
pub fn is_label_printer(name: &str, driver_name: &str) -> bool {
    let name = name.to_lowercase();
    let driver = driver_name.to_lowercase();
    LABEL_PRINTER_TOKENS
        .iter()
        .any(|token| name.contains(token) || driver.contains(token))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrinterStatus {
    Ready,
    Offline,
}

/// One printer in a discovery snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterInfo {
    pub name: String,
    pub status: PrinterStatus,
    pub is_default: bool,
    pub is_capable: bool,
    pub driver_name: String,
    pub port_name: String,
}

/// Complete printer list captured at one point in time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySnapshot {
    pub printers: Vec<PrinterInfo>,
    pub captured_at: DateTime<Utc>,
    #[serde(skip)]
    taken_at: Instant,
}

impl DiscoverySnapshot {
    pub fn new(printers: Vec<PrinterInfo>) -> Self {
        Self {
            printers,
            captured_at: Utc::now(),
            taken_at: Instant::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.printers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.printers.is_empty()
    }

    pub fn default_printer(&self) -> Option<&PrinterInfo> {
        self.printers.iter().find(|p| p.is_default)
    }

    pub fn capable_count(&self) -> usize {
        self.printers.iter().filter(|p| p.is_capable).count()
    }

    pub fn get(&self, name: &str) -> Option<&PrinterInfo> {
        self.printers.iter().find(|p| p.name == name)
    }

    pub fn age(&self) -> Duration {
        self.taken_at.elapsed()
    }
}

/// Cached printer discovery
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct DiscoveryService {
    inner: Arc<DiscoveryInner>,
}

struct DiscoveryInner {
    spooler: Arc<dyn Spooler>,
    ttl: Duration,
    snapshot: RwLock<Arc<DiscoverySnapshot>>,
    /// Set by `refresh()`; the next listing bypasses the cache
    stale: AtomicBool,
    /// One enumeration at a time
    refresh_gate: Mutex<()>,
    enumerations: AtomicU64,
}

impl DiscoveryService {
    pub fn new(spooler: Arc<dyn Spooler>) -> Self {
        Self::with_ttl(spooler, DEFAULT_TTL)
    }

    pub fn with_ttl(spooler: Arc<dyn Spooler>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DiscoveryInner {
                spooler,
                ttl,
                snapshot: RwLock::new(Arc::new(DiscoverySnapshot::empty())),
                stale: AtomicBool::new(false),
                refresh_gate: Mutex::new(()),
                enumerations: AtomicU64::new(0),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Number of enumerations performed since startup
    pub fn enumeration_count(&self) -> u64 {
        self.inner.enumerations.load(Ordering::Relaxed)
    }

    /// Current snapshot, never enumerates
    pub fn cached(&self) -> Arc<DiscoverySnapshot> {
        self.inner.snapshot.read().clone()
    }

    /// Cached snapshot if still fresh, otherwise a new enumeration.
    pub async fn list_printers(&self) -> Arc<DiscoverySnapshot> {
        let current = self.cached();
        if self.is_fresh(&current) {
            debug!(age_ms = current.age().as_millis() as u64, "Serving cached printer snapshot");
            return current;
        }

        let _gate = self.inner.refresh_gate.lock().await;

        // Someone else may have enumerated while we waited for the gate
        let current = self.cached();
        if self.is_fresh(&current) {
            return current;
        }

        self.inner.stale.store(false, Ordering::SeqCst);
        let snapshot = Arc::new(self.enumerate().await);
        *self.inner.snapshot.write() = snapshot.clone();

        info!(
            total = snapshot.len(),
            capable = snapshot.capable_count(),
            default = ?snapshot.default_printer().map(|p| p.name.as_str()),
            "Printer snapshot published"
        );
        snapshot
    }

    /// Invalidate the cache and enumerate again
    pub async fn refresh(&self) -> Arc<DiscoverySnapshot> {
        self.inner.stale.store(true, Ordering::SeqCst);
        self.list_printers().await
    }

    /// Default printer of the current (possibly refreshed) snapshot
    pub async fn default_printer(&self) -> Option<PrinterInfo> {
        self.list_printers().await.default_printer().cloned()
    }

    fn is_fresh(&self, snapshot: &DiscoverySnapshot) -> bool {
        !self.inner.stale.load(Ordering::SeqCst)
            && !snapshot.is_empty()
            && snapshot.age() < self.inner.ttl
    }

    async fn enumerate(&self) -> DiscoverySnapshot {
        self.inner.enumerations.fetch_add(1, Ordering::Relaxed);
        let spooler = self.inner.spooler.clone();
        match tokio::task::spawn_blocking(move || collect_printers(spooler.as_ref())).await {
            Ok(printers) => DiscoverySnapshot::new(printers),
            Err(e) => {
                error!(error = %e, "Printer enumeration task failed");
                DiscoverySnapshot::empty()
            }
        }
    }
}

/// Enumerate the spooler into a fresh printer list (blocking).
///
/// Never fails: a total enumeration failure gives an empty list and a
/// printer whose metadata cannot be read is left out.
#[instrument(skip_all)]
fn collect_printers(spooler: &dyn Spooler) -> Vec<PrinterInfo> {
    let entries = match spooler.enumerate() {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, "Printer enumeration failed");
            return Vec::new();
        }
    };

    let default = spooler.default_printer().unwrap_or_else(|e| {
        warn!(error = %e, "Default printer lookup failed");
        None
    });

    let mut seen = HashSet::new();
    let mut printers = Vec::with_capacity(entries.len());

    for entry in entries {
        if !seen.insert(entry.name.clone()) {
            debug!(printer = %entry.name, "Duplicate printer entry ignored");
            continue;
        }

        let details = match spooler.printer_details(&entry.name) {
            Ok(details) => details,
            Err(e) => {
                warn!(printer = %entry.name, error = %e, "Printer metadata lookup failed, skipping");
                continue;
            }
        };

        let offline = entry.offline || details.offline.unwrap_or(false);
        let is_default = default.as_deref() == Some(entry.name.as_str());
        let is_capable = is_label_printer(&entry.name, &details.driver_name);

        printers.push(PrinterInfo {
            name: entry.name,
            status: if offline {
                PrinterStatus::Offline
            } else {
                PrinterStatus::Ready
            },
            is_default,
            is_capable,
            driver_name: details.driver_name,
            port_name: details.port_name,
        });
    }

    printers
}
