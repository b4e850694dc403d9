use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use renamer_core::{
    validate_schema, Constraint, DatabaseSchema, PrimaryKey, Schema, Table, SCHEMA_VERSION,
};

use crate::adapter::Connector;
use crate::errors::SchemaReadError;
use crate::options::ReadOptions;

/// Build the schema model through the connector's listing operations.
///
/// Tables are sorted by name within each namespace and constraints follow a
/// fixed order, so two reads of an unchanged target compare equal.
pub async fn read_schema(
    connector: &mut dyn Connector,
    opts: &ReadOptions,
) -> Result<DatabaseSchema, SchemaReadError> {
    let mut by_schema: BTreeMap<String, Vec<Table>> = BTreeMap::new();

    for table_ref in connector.list_tables(opts).await? {
        let mut columns = connector.list_columns(&table_ref).await?;
        columns.sort_by_key(|column| column.ordinal_position);

        let mut constraints = Vec::new();
        let pk_columns: Vec<String> = columns
            .iter()
            .filter(|column| column.is_primary_key)
            .map(|column| column.name.clone())
            .collect();
        if !pk_columns.is_empty() {
            constraints.push(Constraint::PrimaryKey(PrimaryKey {
                name: None,
                columns: pk_columns,
            }));
        }
        constraints.extend(
            connector
                .list_unique_constraints(&table_ref)
                .await?
                .into_iter()
                .map(Constraint::Unique),
        );
        constraints.extend(
            connector
                .list_foreign_keys(&table_ref)
                .await?
                .into_iter()
                .map(Constraint::ForeignKey),
        );
        constraints.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));

        tracing::debug!(
            event = "table_read",
            schema = %table_ref.schema,
            table = %table_ref.name,
            columns = columns.len(),
            constraints = constraints.len()
        );

        by_schema.entry(table_ref.schema).or_default().push(Table {
            name: table_ref.name,
            columns,
            constraints,
        });
    }

    drop_unread_references(&mut by_schema);

    let schemas = by_schema
        .into_iter()
        .map(|(name, mut tables)| {
            tables.sort_by(|left, right| left.name.cmp(&right.name));
            Schema { name, tables }
        })
        .collect();

    let schema = DatabaseSchema {
        schema_version: SCHEMA_VERSION.to_string(),
        engine: connector.engine().to_string(),
        database: connector.database(),
        schemas,
    };

    validate_schema(&schema).map_err(|err| SchemaReadError::Malformed(err.to_string()))?;
    Ok(schema)
}

/// Remove foreign keys whose referenced table lies outside the read set.
///
/// A namespace filter can leave a key pointing at a table that was never
/// listed; such keys cannot take part in renaming.
fn drop_unread_references(by_schema: &mut BTreeMap<String, Vec<Table>>) {
    let read: BTreeSet<(String, String)> = by_schema
        .iter()
        .flat_map(|(schema, tables)| {
            tables
                .iter()
                .map(move |table| (schema.clone(), table.name.clone()))
        })
        .collect();

    for (schema, tables) in by_schema.iter_mut() {
        for table in tables.iter_mut() {
            table.constraints.retain(|constraint| {
                let Constraint::ForeignKey(fk) = constraint else {
                    return true;
                };
                let key = (fk.referenced_schema.clone(), fk.referenced_table.clone());
                if read.contains(&key) {
                    return true;
                }
                tracing::debug!(
                    event = "foreign_key_outside_read",
                    schema = %schema,
                    table = %table.name,
                    referenced_schema = %fk.referenced_schema,
                    referenced_table = %fk.referenced_table,
                    "foreign key references an unread table, ignored"
                );
                false
            });
        }
    }
}

/// [`read_schema`] bounded by an optional caller timeout.
pub async fn read_schema_with_timeout(
    connector: &mut dyn Connector,
    opts: &ReadOptions,
    timeout: Option<Duration>,
) -> Result<DatabaseSchema, SchemaReadError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, read_schema(connector, opts))
            .await
            .map_err(|_| SchemaReadError::Timeout(limit))?,
        None => read_schema(connector, opts).await,
    }
}
