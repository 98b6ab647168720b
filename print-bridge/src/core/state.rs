use std::sync::Arc;

use kiosk_printer::{DiscoveryService, NativeSpooler, RawDeviceWriter, SpoolWriter, Spooler};
use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::printing::PrintService;

/// Shared handler state
///
/// Cheap to clone; every field is reference counted.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | Immutable configuration |
/// | discovery | Printer snapshot cache |
/// | print_service | Printer resolution and sequential writes |
/// | shutdown | Cancelled when the server starts shutting down |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub discovery: DiscoveryService,
    pub print_service: PrintService,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Build state over explicit backends
    ///
    /// Usually [`initialize()`](Self::initialize); tests pass mocks here.
    pub fn new(
        config: Config,
        spooler: Arc<dyn Spooler>,
        writer: Arc<dyn RawDeviceWriter>,
    ) -> Self {
        let discovery = DiscoveryService::with_ttl(spooler, config.discovery_ttl);
        let print_service =
            PrintService::new(discovery.clone(), writer, config.batch_item_delay);
        Self {
            config,
            discovery,
            print_service,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build state over the host's native spooler
    pub fn initialize(config: &Config) -> Self {
        let spooler = Arc::new(NativeSpooler::new());
        let writer = Arc::new(SpoolWriter::new(spooler.clone()));
        Self::new(config.clone(), spooler, writer)
    }

    /// Warm the printer cache so the first kiosk request does not pay for
    /// enumeration
    pub fn start_background_tasks(&self) {
        let discovery = self.discovery.clone();
        tokio::spawn(async move {
            let snapshot = discovery.list_printers().await;
            if snapshot.is_empty() {
                tracing::warn!("No printers found during startup discovery");
            }
        });
    }

    /// Token for one request, cancelled along with the server
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
