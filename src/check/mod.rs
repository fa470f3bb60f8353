//! Check run orchestration
//! - run.rs: Checker, drives one pass over the running containers
//! - summary.rs: per-category counts of a finished report

pub mod run;
pub mod summary;

pub use run::Checker;
pub use summary::{ReportSummary, summarize};
