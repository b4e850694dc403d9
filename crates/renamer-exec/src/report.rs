use std::fs::{create_dir_all, OpenOptions};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use renamer_plan::RenameOp;

use crate::errors::{ExecutionError, ExecutionResult};

/// Outcome of one run, written by `--report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub run_id: String,
    pub engine: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub transactional: bool,
    pub total: usize,
    pub applied: usize,
    pub rolled_back: bool,
    pub failed_index: Option<usize>,
    pub operations: Vec<RenameOp>,
}

impl ExecutionReport {
    pub fn new(run_id: impl Into<String>, engine: impl Into<String>, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            engine: engine.into(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            transactional: false,
            total: 0,
            applied: 0,
            rolled_back: false,
            failed_index: None,
            operations: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn succeeded(&self) -> bool {
        self.failed_index.is_none() && (self.dry_run || self.applied == self.total)
    }
}

/// Write `report` as pretty JSON, creating parent directories.
pub fn write_report(path: &Path, report: &ExecutionReport) -> ExecutionResult<()> {
    let wrap = |source| ExecutionError::File {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(wrap)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)
        .map_err(wrap)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let mut report = ExecutionReport::new("run-1", "memory", true);
        report.finish();

        write_report(&path, &report).unwrap();
        let loaded: ExecutionReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
        assert!(loaded.succeeded());
    }
}
