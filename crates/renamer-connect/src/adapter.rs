use async_trait::async_trait;

use renamer_core::{Column, ForeignKey, UniqueConstraint};

use crate::errors::ConnectorResult;
use crate::options::ReadOptions;

/// A table as listed by a connector, before its columns are read.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// Narrow interface every rename target implements.
///
/// Listing methods are read-only. Rename methods mutate the target; inside
/// `begin`/`commit` they are applied atomically when the backend supports
/// transactions.
#[async_trait]
pub trait Connector: Send {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Database name when the backend has one.
    fn database(&self) -> Option<String> {
        None
    }

    fn supports_transactions(&self) -> bool {
        false
    }

    /// Longest identifier the backend accepts.
    fn max_identifier_len(&self) -> Option<usize> {
        None
    }

    async fn list_tables(&mut self, opts: &ReadOptions) -> ConnectorResult<Vec<TableRef>>;

    /// Columns in ordinal order, with primary-key membership flagged.
    async fn list_columns(&mut self, table: &TableRef) -> ConnectorResult<Vec<Column>>;

    async fn list_foreign_keys(&mut self, table: &TableRef) -> ConnectorResult<Vec<ForeignKey>>;

    async fn list_unique_constraints(
        &mut self,
        _table: &TableRef,
    ) -> ConnectorResult<Vec<UniqueConstraint>> {
        Ok(Vec::new())
    }

    async fn rename_table(&mut self, schema: &str, from: &str, to: &str) -> ConnectorResult<()>;

    async fn rename_column(
        &mut self,
        schema: &str,
        table: &str,
        from: &str,
        to: &str,
    ) -> ConnectorResult<()>;

    async fn begin(&mut self) -> ConnectorResult<()> {
        Ok(())
    }

    async fn commit(&mut self) -> ConnectorResult<()> {
        Ok(())
    }

    async fn rollback(&mut self) -> ConnectorResult<()> {
        Ok(())
    }
}
