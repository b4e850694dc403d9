//! Core contracts and helpers for dm-renamer.
//!
//! This crate defines the canonical schema model, the run configuration, and
//! the validation and graph helpers shared by the connectors, the planner and
//! the CLI.

pub mod config;
pub mod constraints;
pub mod error;
pub mod graph;
pub mod redaction;
pub mod schema;
pub mod validation;

pub use config::{
    is_valid_identifier, ConventionKind, RenameConfig, DEFAULT_PREFIX_COLUMN, DEFAULT_PREFIX_TABLE,
};
pub use constraints::{Constraint, FkAction, ForeignKey, PrimaryKey, UniqueConstraint};
pub use error::{Error, Result};
pub use graph::{build_fk_graph_report, dependency_order, toposort, FkGraphReport, FkGraphSummary};
pub use redaction::{redact_connection_string, RedactedConnection};
pub use schema::{Column, DatabaseSchema, Schema, Table};
pub use validation::validate_schema;

/// Current contract version for schema snapshot files.
pub const SCHEMA_VERSION: &str = "0.1";

/// Join identifier parts into a dotted qualified name (`public.users.id`).
pub fn qualified_name(parts: &[&str]) -> String {
    parts.join(".")
}
