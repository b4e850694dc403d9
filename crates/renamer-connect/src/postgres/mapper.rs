use renamer_core::{Column, FkAction, ForeignKey, UniqueConstraint};

use crate::adapter::TableRef;
use crate::options::ReadOptions;

use super::queries::{RawColumn, RawForeignKey, RawTable, RawUniqueConstraint};

pub fn is_system_schema(schema: &str) -> bool {
    schema.starts_with("pg_") || schema == "information_schema"
}

pub fn filter_tables(raw: Vec<RawTable>, opts: &ReadOptions) -> Vec<TableRef> {
    raw.into_iter()
        .filter(|table| opts.allows_schema(&table.schema, is_system_schema(&table.schema)))
        .map(|table| TableRef::new(table.schema, table.name))
        .collect()
}

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<Column> {
    raw.into_iter()
        .map(|col| Column {
            ordinal_position: col.ordinal_position,
            name: col.name,
            data_type: col.data_type,
            is_nullable: col.is_nullable,
            is_primary_key: col.is_primary_key,
        })
        .collect()
}

pub fn map_unique_constraints(raw: Vec<RawUniqueConstraint>) -> Vec<UniqueConstraint> {
    raw.into_iter()
        .map(|uc| UniqueConstraint {
            name: Some(uc.name),
            columns: uc.columns,
        })
        .collect()
}

pub fn map_foreign_keys(raw: Vec<RawForeignKey>) -> Vec<ForeignKey> {
    raw.into_iter()
        .map(|fk| ForeignKey {
            name: Some(fk.name),
            columns: fk.columns,
            referenced_schema: fk.referenced_schema,
            referenced_table: fk.referenced_table,
            referenced_columns: fk.referenced_columns,
            on_update: FkAction::from_pg_code(fk.on_update_code),
            on_delete: FkAction::from_pg_code(fk.on_delete_code),
        })
        .collect()
}
