use std::time::Duration;

use thiserror::Error;

/// Failure reported by a target backend.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("name already taken: {0}")]
    Conflict(String),
    #[error("malformed target: {0}")]
    Malformed(String),
    #[error("transaction error: {0}")]
    Transaction(String),
}

/// Errors raised while building the schema model; always fatal for the run.
#[derive(Debug, Error)]
pub enum SchemaReadError {
    #[error("target unreachable: {target}: {reason}")]
    Unreachable { target: String, reason: String },
    #[error("unsupported target format: {0}")]
    UnsupportedFormat(String),
    #[error("malformed schema: {0}")]
    Malformed(String),
    #[error("schema read timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Connector(ConnectorError),
}

impl From<ConnectorError> for SchemaReadError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::Malformed(message) => SchemaReadError::Malformed(message),
            other => SchemaReadError::Connector(other),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;
