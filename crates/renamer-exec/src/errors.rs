use std::path::PathBuf;
use std::time::Duration;

use renamer_connect::ConnectorError;
use renamer_plan::RenameOp;
use thiserror::Error;

use crate::report::ExecutionReport;

/// Failure while applying a plan. Operation indexes are zero-based positions
/// in the plan, so a run can be resumed from `index`.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("operation #{index} ({op}) failed: {source}")]
    Operation {
        index: usize,
        op: RenameOp,
        #[source]
        source: ConnectorError,
        report: Box<ExecutionReport>,
    },
    #[error("operation #{index} ({op}) timed out after {timeout:?}")]
    Timeout {
        index: usize,
        op: RenameOp,
        timeout: Duration,
        report: Box<ExecutionReport>,
    },
    #[error("could not {stage} transaction: {source}")]
    Transaction {
        stage: &'static str,
        #[source]
        source: ConnectorError,
        report: Box<ExecutionReport>,
    },
    #[error("cannot write {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("output error: {0}")]
    Output(#[source] std::io::Error),
    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),
}

impl ExecutionError {
    /// Index of the failing operation, when an operation failed.
    pub fn op_index(&self) -> Option<usize> {
        match self {
            ExecutionError::Operation { index, .. } | ExecutionError::Timeout { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    /// Partial report for failures that happened after the run started.
    pub fn report(&self) -> Option<&ExecutionReport> {
        match self {
            ExecutionError::Operation { report, .. }
            | ExecutionError::Timeout { report, .. }
            | ExecutionError::Transaction { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Result type for executor operations.
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
