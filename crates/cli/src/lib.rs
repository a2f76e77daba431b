#![allow(clippy::collapsible_if)]
pub mod batch;
pub mod config;
pub mod report;

pub use batch::run_batch;
pub use config::{BatchConfig, FailurePolicy, UnclassifiedPolicy};
pub use report::{BatchReport, FileOutcome};
