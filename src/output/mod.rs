//! Output module for run summaries and database statistics
//!
//! This module handles:
//! - Tallying the outcome of a batch run
//! - Printing price database statistics

mod report;
pub mod stats;

pub use report::BatchReport;
pub use stats::{format_batch_report, format_statistics, print_batch_report, print_statistics};
