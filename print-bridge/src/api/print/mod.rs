//! Print API
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /print | POST | One label, optional copies |
//! | /print/batch | POST | Up to 50 labels, validated as a whole |
//! | /print/test | POST | Synthesized timestamped label |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub use handler::{
    BatchOutcome, BatchPrintRequest, MAX_BATCH_SIZE, MAX_COPIES, PrintOutcome, PrintRequest,
    TestPrintRequest,
};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/print", post(handler::print))
        .route("/print/batch", post(handler::print_batch))
        .route("/print/test", post(handler::print_test))
}
