use async_trait::async_trait;

use renamer_core::{Column, Constraint, DatabaseSchema, ForeignKey, Table, UniqueConstraint};

use crate::adapter::{Connector, TableRef};
use crate::errors::{ConnectorError, ConnectorResult};
use crate::options::ReadOptions;

/// Connector over an in-memory schema model.
///
/// Renames rewrite the model the way a database catalog would: foreign keys
/// that point at a renamed table or column follow the new name.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    schema: DatabaseSchema,
    checkpoint: Option<DatabaseSchema>,
}

impl MemoryConnector {
    pub fn new(schema: DatabaseSchema) -> Self {
        Self {
            schema,
            checkpoint: None,
        }
    }

    pub fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    pub fn into_schema(self) -> DatabaseSchema {
        self.schema
    }

    pub fn in_transaction(&self) -> bool {
        self.checkpoint.is_some()
    }

    fn table_mut(&mut self, schema: &str, table: &str) -> ConnectorResult<&mut Table> {
        self.schema
            .schemas
            .iter_mut()
            .find(|item| item.name == schema)
            .and_then(|item| item.tables.iter_mut().find(|t| t.name == table))
            .ok_or_else(|| ConnectorError::NotFound(format!("table {schema}.{table}")))
    }

    fn referencing_keys_mut<'a>(
        &'a mut self,
        schema: &'a str,
        table: &'a str,
    ) -> impl Iterator<Item = &'a mut ForeignKey> + 'a {
        self.schema
            .schemas
            .iter_mut()
            .flat_map(|item| item.tables.iter_mut())
            .flat_map(|t| t.constraints.iter_mut())
            .filter_map(move |constraint| match constraint {
                Constraint::ForeignKey(fk)
                    if fk.referenced_schema == schema && fk.referenced_table == table =>
                {
                    Some(fk)
                }
                _ => None,
            })
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    fn engine(&self) -> &'static str {
        "memory"
    }

    fn database(&self) -> Option<String> {
        self.schema.database.clone()
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    async fn list_tables(&mut self, opts: &ReadOptions) -> ConnectorResult<Vec<TableRef>> {
        Ok(self
            .schema
            .tables()
            .filter(|(schema, _)| opts.allows_schema(schema, false))
            .map(|(schema, table)| TableRef::new(schema, &table.name))
            .collect())
    }

    async fn list_columns(&mut self, table: &TableRef) -> ConnectorResult<Vec<Column>> {
        Ok(self.table_mut(&table.schema, &table.name)?.columns.clone())
    }

    async fn list_foreign_keys(&mut self, table: &TableRef) -> ConnectorResult<Vec<ForeignKey>> {
        Ok(self
            .table_mut(&table.schema, &table.name)?
            .foreign_keys()
            .cloned()
            .collect())
    }

    async fn list_unique_constraints(
        &mut self,
        table: &TableRef,
    ) -> ConnectorResult<Vec<UniqueConstraint>> {
        Ok(self
            .table_mut(&table.schema, &table.name)?
            .constraints
            .iter()
            .filter_map(|constraint| match constraint {
                Constraint::Unique(unique) => Some(unique.clone()),
                _ => None,
            })
            .collect())
    }

    async fn rename_table(&mut self, schema: &str, from: &str, to: &str) -> ConnectorResult<()> {
        if self.schema.table(schema, to).is_some() {
            return Err(ConnectorError::Conflict(format!("table {schema}.{to}")));
        }

        self.table_mut(schema, from)?.name = to.to_string();
        for fk in self.referencing_keys_mut(schema, from) {
            fk.referenced_table = to.to_string();
        }

        Ok(())
    }

    async fn rename_column(
        &mut self,
        schema: &str,
        table: &str,
        from: &str,
        to: &str,
    ) -> ConnectorResult<()> {
        let target = self.table_mut(schema, table)?;
        if target.column(to).is_some() {
            return Err(ConnectorError::Conflict(format!("column {schema}.{table}.{to}")));
        }

        let column = target
            .columns
            .iter_mut()
            .find(|column| column.name == from)
            .ok_or_else(|| ConnectorError::NotFound(format!("column {schema}.{table}.{from}")))?;
        column.name = to.to_string();

        for constraint in &mut target.constraints {
            replace_name(constraint.columns_mut(), from, to);
        }
        for fk in self.referencing_keys_mut(schema, table) {
            replace_name(&mut fk.referenced_columns, from, to);
        }

        Ok(())
    }

    async fn begin(&mut self) -> ConnectorResult<()> {
        if self.checkpoint.is_some() {
            return Err(ConnectorError::Transaction(
                "transaction already open".to_string(),
            ));
        }
        self.checkpoint = Some(self.schema.clone());
        Ok(())
    }

    async fn commit(&mut self) -> ConnectorResult<()> {
        self.checkpoint
            .take()
            .map(|_| ())
            .ok_or_else(|| ConnectorError::Transaction("no open transaction".to_string()))
    }

    async fn rollback(&mut self) -> ConnectorResult<()> {
        let checkpoint = self
            .checkpoint
            .take()
            .ok_or_else(|| ConnectorError::Transaction("no open transaction".to_string()))?;
        self.schema = checkpoint;
        Ok(())
    }
}

fn replace_name(names: &mut [String], from: &str, to: &str) {
    for name in names.iter_mut().filter(|name| name.as_str() == from) {
        *name = to.to_string();
    }
}
