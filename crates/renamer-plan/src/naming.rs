use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use renamer_core::{dependency_order, qualified_name, DatabaseSchema, RenameConfig};

use crate::errors::{PlanConflict, Result};
use crate::resolver::{GroupId, RelationshipGraph};

/// Generated name for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableName {
    pub schema: String,
    pub original: String,
    pub generated: String,
    /// Letter suffix shared with same-table collision names (`a` in `table_a`).
    pub suffix: String,
}

/// Generated name for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnName {
    pub schema: String,
    /// Original name of the owning table.
    pub table: String,
    pub original: String,
    pub generated: String,
    /// Name shared by the whole naming group; differs from `generated` only
    /// when the group occurs twice in one table.
    pub base: String,
    #[serde(skip)]
    pub group: GroupId,
}

/// Original to generated identifiers, in generation order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RenameMapping {
    pub tables: Vec<TableName>,
    pub columns: Vec<ColumnName>,
    /// Identifier limit the planner enforces.
    pub max_identifier_len: Option<usize>,
}

impl RenameMapping {
    pub fn table(&self, schema: &str, original: &str) -> Option<&TableName> {
        self.tables
            .iter()
            .find(|table| table.schema == schema && table.original == original)
    }

    pub fn column(&self, schema: &str, table: &str, original: &str) -> Option<&ColumnName> {
        self.columns.iter().find(|column| {
            column.schema == schema && column.table == table && column.original == original
        })
    }
}

/// Bijective base-26 suffix: 1 -> `a`, 26 -> `z`, 27 -> `aa`.
pub fn alpha_suffix(mut n: usize) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'a' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Tables in naming order: referenced tables before the tables that point
/// at them, alphabetical on ties, cycle members last.
pub fn table_order(schema: &DatabaseSchema, graph: &RelationshipGraph) -> Vec<(String, String)> {
    let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut keys: HashMap<String, (String, String)> = HashMap::new();

    for (schema_name, table) in schema.tables() {
        let key = qualified_name(&[schema_name, &table.name]);
        dependencies.entry(key.clone()).or_default();
        keys.insert(key, (schema_name.to_string(), table.name.clone()));
    }

    for rel in graph.relationships() {
        let referencing = graph.column(rel.source).qualified_table();
        let referenced = graph.column(rel.target).qualified_table();
        // Self references do not constrain the order.
        if referencing != referenced {
            dependencies
                .entry(referenced)
                .or_default()
                .insert(referencing);
        }
    }

    dependency_order(&dependencies)
        .into_iter()
        .filter_map(|key| keys.remove(&key))
        .collect()
}

/// Assign generic names to every table and column not excluded by `config`.
pub fn generate_names(
    schema: &DatabaseSchema,
    graph: &RelationshipGraph,
    config: &RenameConfig,
) -> Result<RenameMapping> {
    let existing_tables: HashSet<String> = schema
        .tables()
        .map(|(_, table)| table.name.to_ascii_lowercase())
        .collect();
    let existing_columns: HashSet<String> = schema
        .tables()
        .flat_map(|(_, table)| table.columns.iter())
        .map(|column| column.name.to_ascii_lowercase())
        .collect();

    let order: Vec<(String, String)> = table_order(schema, graph)
        .into_iter()
        .filter(|(schema_name, table)| !config.is_excluded(schema_name, table))
        .collect();

    let mut mapping = RenameMapping {
        max_identifier_len: config.max_identifier_len,
        ..RenameMapping::default()
    };

    let mut table_counter = 0usize;
    for (schema_name, table) in &order {
        let (generated, suffix) = loop {
            table_counter += 1;
            let suffix = alpha_suffix(table_counter);
            let candidate = format!("{}_{suffix}", config.prefix_table);
            if !existing_tables.contains(&candidate.to_ascii_lowercase()) {
                break (candidate, suffix);
            }
        };
        mapping.tables.push(TableName {
            schema: schema_name.clone(),
            original: table.clone(),
            generated,
            suffix,
        });
    }

    let mut bases: HashMap<GroupId, String> = HashMap::new();
    let mut column_counter = 0usize;

    for table_name in &mapping.tables {
        let table = schema
            .table(&table_name.schema, &table_name.original)
            .ok_or_else(|| {
                PlanConflict::UnknownEntity(qualified_name(&[
                    &table_name.schema,
                    &table_name.original,
                ]))
            })?;

        let mut columns: Vec<_> = table.columns.iter().collect();
        columns.sort_by_key(|column| column.ordinal_position);

        let mut used: HashSet<String> = HashSet::new();
        for column in columns {
            let id = graph
                .column_id(&table_name.schema, &table.name, &column.name)
                .ok_or_else(|| {
                    PlanConflict::UnknownEntity(qualified_name(&[
                        &table_name.schema,
                        &table.name,
                        &column.name,
                    ]))
                })?;
            let group = graph.group_of(id);

            let base = bases
                .entry(group)
                .or_insert_with(|| loop {
                    column_counter += 1;
                    let candidate = format!("{}{column_counter}", config.prefix_column);
                    if !existing_columns.contains(&candidate.to_ascii_lowercase()) {
                        break candidate;
                    }
                })
                .clone();

            let mut generated = base.clone();
            let mut attempt = 1usize;
            while used.contains(&generated.to_ascii_lowercase())
                || (generated != base && existing_columns.contains(&generated.to_ascii_lowercase()))
            {
                generated = if attempt == 1 {
                    format!("{base}_{}", table_name.suffix)
                } else {
                    format!("{base}_{}{attempt}", table_name.suffix)
                };
                attempt += 1;
            }
            used.insert(generated.to_ascii_lowercase());

            mapping.columns.push(ColumnName {
                schema: table_name.schema.clone(),
                table: table.name.clone(),
                original: column.name.clone(),
                generated,
                base,
                group,
            });
        }
    }

    tracing::debug!(
        event = "names_generated",
        tables = mapping.tables.len(),
        columns = mapping.columns.len(),
        groups = bases.len()
    );

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_are_bijective_base26() {
        assert_eq!(alpha_suffix(1), "a");
        assert_eq!(alpha_suffix(26), "z");
        assert_eq!(alpha_suffix(27), "aa");
        assert_eq!(alpha_suffix(52), "az");
        assert_eq!(alpha_suffix(53), "ba");
        assert_eq!(alpha_suffix(702), "zz");
        assert_eq!(alpha_suffix(703), "aaa");
    }
}
