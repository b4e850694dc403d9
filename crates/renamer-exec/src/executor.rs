use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use renamer_connect::{Connector, ConnectorError, ConnectorResult};
use renamer_plan::{RenameOp, RenamePlan};
use uuid::Uuid;

use crate::errors::{ExecutionError, ExecutionResult};
use crate::log::PlanLog;
use crate::report::ExecutionReport;

/// How a plan is applied.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub run_id: String,
    pub dry_run: bool,
    pub log_file: Option<PathBuf>,
    /// Limit for each rename statement.
    pub op_timeout: Option<Duration>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            dry_run: false,
            log_file: None,
            op_timeout: None,
        }
    }
}

enum OpFailure {
    Connector(ConnectorError),
    Timeout(Duration),
}

/// Apply `plan` to `connector`, or print it to `out` on a dry run.
///
/// Live runs use one transaction when the backend has them and roll back on
/// the first failure. Backends without transactions stop at the first
/// failure, leaving earlier renames in place and in the log.
pub async fn execute(
    connector: &mut dyn Connector,
    plan: &RenamePlan,
    options: &ExecuteOptions,
    out: &mut dyn Write,
) -> ExecutionResult<ExecutionReport> {
    let log = options.log_file.as_ref().map(PlanLog::new);
    let mut report = ExecutionReport::new(&options.run_id, connector.engine(), options.dry_run);
    report.total = plan.len();
    report.operations = plan.ops.clone();

    if options.dry_run {
        dry_run(plan, log.as_ref(), out)?;
        report.finish();
        tracing::info!(
            event = "dry_run_finished",
            run_id = %options.run_id,
            operations = plan.len()
        );
        return Ok(report);
    }

    let transactional = connector.supports_transactions();
    report.transactional = transactional;

    if transactional {
        if let Err(source) = connector.begin().await {
            report.finish();
            return Err(ExecutionError::Transaction {
                stage: "begin",
                source,
                report: Box::new(report),
            });
        }
    }

    tracing::info!(
        event = "execution_started",
        run_id = %options.run_id,
        engine = connector.engine(),
        transactional,
        operations = plan.len()
    );

    for (index, op) in plan.iter().enumerate() {
        match apply(connector, op, options.op_timeout).await {
            Ok(()) => {
                report.applied += 1;
                tracing::debug!(event = "op_applied", index, op = %op);
                if !transactional {
                    if let Some(log) = &log {
                        log.append([op.log_line()])?;
                    }
                }
            }
            Err(failure) => {
                report.failed_index = Some(index);
                if transactional {
                    match connector.rollback().await {
                        Ok(()) => report.rolled_back = true,
                        Err(err) => tracing::error!(
                            event = "rollback_failed",
                            index,
                            error = %err
                        ),
                    }
                }
                report.finish();
                tracing::error!(
                    event = "op_failed",
                    index,
                    op = %op,
                    applied = report.applied,
                    rolled_back = report.rolled_back
                );

                let report = Box::new(report);
                return Err(match failure {
                    OpFailure::Connector(source) => ExecutionError::Operation {
                        index,
                        op: op.clone(),
                        source,
                        report,
                    },
                    OpFailure::Timeout(timeout) => ExecutionError::Timeout {
                        index,
                        op: op.clone(),
                        timeout,
                        report,
                    },
                });
            }
        }
    }

    if transactional {
        if let Err(source) = connector.commit().await {
            report.finish();
            return Err(ExecutionError::Transaction {
                stage: "commit",
                source,
                report: Box::new(report),
            });
        }
        if let Some(log) = &log {
            log.append(plan.log_lines())?;
        }
    }

    report.finish();
    tracing::info!(
        event = "execution_finished",
        run_id = %options.run_id,
        applied = report.applied
    );
    Ok(report)
}

fn dry_run(plan: &RenamePlan, log: Option<&PlanLog>, out: &mut dyn Write) -> ExecutionResult<()> {
    for op in plan {
        writeln!(out, "{op}").map_err(ExecutionError::Output)?;
    }
    out.flush().map_err(ExecutionError::Output)?;

    if let Some(log) = log {
        log.append(plan.log_lines())?;
    }
    Ok(())
}

async fn apply(
    connector: &mut dyn Connector,
    op: &RenameOp,
    limit: Option<Duration>,
) -> Result<(), OpFailure> {
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, rename(connector, op))
            .await
            .map_err(|_| OpFailure::Timeout(limit))?,
        None => rename(connector, op).await,
    };
    result.map_err(OpFailure::Connector)
}

async fn rename(connector: &mut dyn Connector, op: &RenameOp) -> ConnectorResult<()> {
    match op {
        RenameOp::Table { schema, from, to } => connector.rename_table(schema, from, to).await,
        RenameOp::Column {
            schema,
            table,
            from,
            to,
            ..
        } => connector.rename_column(schema, table, from, to).await,
    }
}
