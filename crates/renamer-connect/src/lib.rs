//! Rename targets and the schema reader.
//!
//! Every backend implements the narrow [`Connector`] interface: list tables,
//! columns and foreign keys, rename a table, rename a column, and optional
//! transaction control. [`read_schema`] turns the listings into the canonical
//! schema model.

pub mod adapter;
pub mod atomic;
pub mod csv_dir;
pub mod errors;
pub mod ident;
pub mod memory;
pub mod options;
pub mod postgres;
pub mod reader;
pub mod snapshot;
pub mod sqlite;
pub mod target;

pub use adapter::{Connector, TableRef};
pub use csv_dir::CsvDirConnector;
pub use errors::{ConnectorError, ConnectorResult, SchemaReadError};
pub use memory::MemoryConnector;
pub use options::ReadOptions;
pub use postgres::PostgresConnector;
pub use reader::{read_schema, read_schema_with_timeout};
pub use snapshot::{snapshot_json_schema, validate_snapshot_json, SnapshotConnector};
pub use sqlite::SqliteConnector;
pub use target::{detect_target, open_target, TargetKind};

pub use renamer_core::DatabaseSchema;
