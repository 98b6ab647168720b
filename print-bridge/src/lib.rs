//! Print Bridge - loopback HTTP service between the check-in kiosk and label printers
//!
//! # Architecture
//!
//! The browser kiosk cannot reach printers, so it posts ZPL labels here.
//! Each request is checked for shape, then for label safety, then resolved
//! to a printer, and only then written through the OS spooler.
//!
//! # Module layout
//!
//! ```text
//! print-bridge/src/
//! ├── core/          # Config, state, server lifecycle, errors
//! ├── api/           # HTTP routes and handlers
//! ├── printing/      # Printer resolution, sequential writes, test label
//! ├── middleware/    # Request logging
//! └── utils/         # Error envelope, logger
//! ```

pub mod api;
pub mod core;
pub mod middleware;
pub mod printing;
pub mod utils;

pub use crate::core::{Config, MAX_BODY_BYTES, Server, ServerError, ServerState, build_app};
pub use printing::{PrintJobError, PrintService};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

use utils::result::BoxResult;

/// Load `.env` and initialise logging from the environment
pub fn setup_environment() -> BoxResult<()> {
    // A missing .env is normal; the process environment still applies
    dotenv::dotenv().ok();

    let config = Config::from_env();
    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)?;
    }
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.is_production()),
        config.log_dir.as_deref(),
    );
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____       _       __     ____       _     __
   / __ \_____(_)___  / /_   / __ )_____(_)___/ /___ ____
  / /_/ / ___/ / __ \/ __/  / __  / ___/ / __  / __ `/ _ \
 / ____/ /  / / / / / /_   / /_/ / /  / / /_/ / /_/ /  __/
/_/   /_/  /_/_/ /_/\__/  /_____/_/  /_/\__,_/\__, /\___/
                                             /____/
    "#
    );
}
