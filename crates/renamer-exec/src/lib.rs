//! Applies a rename plan to a target, or prints it without touching anything.

pub mod errors;
pub mod executor;
pub mod log;
pub mod report;

pub use errors::{ExecutionError, ExecutionResult};
pub use executor::{execute, ExecuteOptions};
pub use log::PlanLog;
pub use report::{write_report, ExecutionReport};
