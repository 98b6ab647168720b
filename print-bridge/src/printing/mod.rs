//! Printing module
//!
//! - [`PrintService`] - printer resolution and sequential writes
//! - [`test_label`] - synthesized test label

mod service;
mod test_label;

pub use service::{PrintJobError, PrintService};
pub use test_label::{test_label, test_label_at};
