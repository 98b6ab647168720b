//! Printer discovery API
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /printers | GET | Cached snapshot |
//! | /printers/refresh | POST | Forced enumeration |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub use handler::PrinterList;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/printers", get(handler::list))
        .route("/printers/refresh", post(handler::refresh))
}
