use thiserror::Error;

/// Core error type shared across dm-renamer crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results returned by dm-renamer crates.
pub type Result<T> = std::result::Result<T, Error>;
