//! Schema snapshot files: a `DatabaseSchema` serialized as JSON.
//!
//! Renaming a snapshot rewrites the file, so a schema exported from one
//! environment can be anonymized before it is shared.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jsonschema::JSONSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde_json::Value;

use renamer_core::{Column, DatabaseSchema, ForeignKey, UniqueConstraint};

use crate::adapter::{Connector, TableRef};
use crate::atomic::write_json_atomic;
use crate::errors::{ConnectorResult, SchemaReadError};
use crate::memory::MemoryConnector;
use crate::options::ReadOptions;

/// Emit the JSON Schema for snapshot files.
pub fn snapshot_json_schema() -> RootSchema {
    schema_for!(DatabaseSchema)
}

/// Validate a snapshot document against [`snapshot_json_schema`].
///
/// Returns one message per violation, prefixed with its JSON pointer.
pub fn validate_snapshot_json(document: &Value) -> Result<(), Vec<String>> {
    let schema = serde_json::to_value(snapshot_json_schema())
        .map_err(|err| vec![format!("snapshot schema: {err}")])?;
    let compiled = JSONSchema::compile(&schema).map_err(|err| vec![err.to_string()])?;

    let result = compiled.validate(document);
    match result {
        Ok(()) => Ok(()),
        Err(errors) => Err(errors
            .map(|error| {
                let pointer = error.instance_path.to_string();
                let pointer = if pointer.is_empty() { "/".to_string() } else { pointer };
                format!("{pointer}: {error}")
            })
            .collect()),
    }
}

/// Connector backed by a JSON snapshot file.
#[derive(Debug)]
pub struct SnapshotConnector {
    path: PathBuf,
    inner: MemoryConnector,
}

impl SnapshotConnector {
    /// Load and validate a snapshot file.
    pub fn open(path: &Path) -> Result<Self, SchemaReadError> {
        let contents = std::fs::read_to_string(path).map_err(|err| SchemaReadError::Unreachable {
            target: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let document: Value = serde_json::from_str(&contents)
            .map_err(|err| SchemaReadError::Malformed(format!("{}: {err}", path.display())))?;

        validate_snapshot_json(&document).map_err(|issues| {
            SchemaReadError::Malformed(format!("{}: {}", path.display(), issues.join("; ")))
        })?;

        let schema: DatabaseSchema = serde_json::from_value(document)
            .map_err(|err| SchemaReadError::Malformed(format!("{}: {err}", path.display())))?;

        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryConnector::new(schema),
        })
    }

    pub fn schema(&self) -> &DatabaseSchema {
        self.inner.schema()
    }

    fn persist_unless_staged(&self) -> ConnectorResult<()> {
        if self.inner.in_transaction() {
            return Ok(());
        }
        write_json_atomic(&self.path, self.inner.schema())
    }
}

#[async_trait]
impl Connector for SnapshotConnector {
    fn engine(&self) -> &'static str {
        "snapshot"
    }

    fn database(&self) -> Option<String> {
        self.inner.database()
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    async fn list_tables(&mut self, opts: &ReadOptions) -> ConnectorResult<Vec<TableRef>> {
        self.inner.list_tables(opts).await
    }

    async fn list_columns(&mut self, table: &TableRef) -> ConnectorResult<Vec<Column>> {
        self.inner.list_columns(table).await
    }

    async fn list_foreign_keys(&mut self, table: &TableRef) -> ConnectorResult<Vec<ForeignKey>> {
        self.inner.list_foreign_keys(table).await
    }

    async fn list_unique_constraints(
        &mut self,
        table: &TableRef,
    ) -> ConnectorResult<Vec<UniqueConstraint>> {
        self.inner.list_unique_constraints(table).await
    }

    async fn rename_table(&mut self, schema: &str, from: &str, to: &str) -> ConnectorResult<()> {
        self.inner.rename_table(schema, from, to).await?;
        self.persist_unless_staged()
    }

    async fn rename_column(
        &mut self,
        schema: &str,
        table: &str,
        from: &str,
        to: &str,
    ) -> ConnectorResult<()> {
        self.inner.rename_column(schema, table, from, to).await?;
        self.persist_unless_staged()
    }

    async fn begin(&mut self) -> ConnectorResult<()> {
        self.inner.begin().await
    }

    async fn commit(&mut self) -> ConnectorResult<()> {
        self.inner.commit().await?;
        write_json_atomic(&self.path, self.inner.schema())
    }

    async fn rollback(&mut self) -> ConnectorResult<()> {
        self.inner.rollback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_documents_missing_required_fields() {
        let document = serde_json::json!({
            "schema_version": "0.1",
            "engine": "postgres",
            "schemas": [{ "name": "public", "tables": [{ "name": "users" }] }]
        });
        let issues = validate_snapshot_json(&document).unwrap_err();
        assert!(issues.iter().any(|issue| issue.contains("columns")));
    }

    #[test]
    fn accepts_minimal_snapshot() {
        let document = serde_json::json!({
            "schema_version": "0.1",
            "engine": "postgres",
            "database": null,
            "schemas": []
        });
        assert!(validate_snapshot_json(&document).is_ok());
    }
}
