use std::path::Path;
use std::time::Duration;

use renamer_core::redact_connection_string;

use crate::adapter::Connector;
use crate::csv_dir::CsvDirConnector;
use crate::errors::SchemaReadError;
use crate::postgres::PostgresConnector;
use crate::snapshot::SnapshotConnector;
use crate::sqlite::SqliteConnector;

/// Backend selected for a target string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Postgres,
    SqliteUrl,
    SqliteFile,
    Snapshot,
    CsvDir,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Postgres => "postgres",
            TargetKind::SqliteUrl | TargetKind::SqliteFile => "sqlite",
            TargetKind::Snapshot => "snapshot",
            TargetKind::CsvDir => "csv",
        }
    }
}

/// Decide which backend serves `target`.
///
/// URLs are recognized by scheme; anything else must be an existing path.
pub fn detect_target(target: &str) -> Result<TargetKind, SchemaReadError> {
    if target.starts_with("postgres://") || target.starts_with("postgresql://") {
        return Ok(TargetKind::Postgres);
    }
    if target.starts_with("sqlite:") {
        return Ok(TargetKind::SqliteUrl);
    }
    if target.contains("://") {
        return Err(SchemaReadError::UnsupportedFormat(
            redact_connection_string(target).redacted,
        ));
    }

    let path = Path::new(target);
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if !path.exists() {
        return Err(SchemaReadError::Unreachable {
            target: target.to_string(),
            reason: "no such file or directory".to_string(),
        });
    }
    if path.is_dir() {
        return Ok(TargetKind::CsvDir);
    }
    if !path.is_file() {
        return Err(SchemaReadError::UnsupportedFormat(format!(
            "{target} is not a regular file"
        )));
    }

    if is_json {
        Ok(TargetKind::Snapshot)
    } else {
        Ok(TargetKind::SqliteFile)
    }
}

/// Open the connector for `target`, failing before any schema is read.
pub async fn open_target(
    target: &str,
    acquire_timeout: Duration,
) -> Result<Box<dyn Connector>, SchemaReadError> {
    let kind = detect_target(target)?;
    let redacted = redact_connection_string(target).redacted;

    tracing::info!(event = "target_detected", kind = kind.as_str(), target = %redacted);

    let unreachable = |err: crate::errors::ConnectorError| SchemaReadError::Unreachable {
        target: redacted.clone(),
        reason: err.to_string(),
    };

    let connector: Box<dyn Connector> = match kind {
        TargetKind::Postgres => Box::new(
            PostgresConnector::connect(target, acquire_timeout)
                .await
                .map_err(unreachable)?,
        ),
        TargetKind::SqliteUrl => Box::new(
            SqliteConnector::connect(target, acquire_timeout)
                .await
                .map_err(unreachable)?,
        ),
        TargetKind::SqliteFile => Box::new(
            SqliteConnector::open(Path::new(target), acquire_timeout)
                .await
                .map_err(unreachable)?,
        ),
        TargetKind::Snapshot => Box::new(SnapshotConnector::open(Path::new(target))?),
        TargetKind::CsvDir => Box::new(CsvDirConnector::open(Path::new(target))?),
    };

    Ok(connector)
}
