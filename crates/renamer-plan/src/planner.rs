use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use renamer_core::{qualified_name, DatabaseSchema};

use crate::errors::{PlanConflict, Result};
use crate::naming::RenameMapping;
use crate::resolver::{GroupId, RelationshipGraph};

/// One atomic rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenameOp {
    Table {
        schema: String,
        from: String,
        to: String,
    },
    Column {
        schema: String,
        /// Table name at the time the op runs.
        table: String,
        /// Table name used when reporting the op.
        owner: String,
        from: String,
        to: String,
    },
}

impl RenameOp {
    pub fn kind(&self) -> &'static str {
        match self {
            RenameOp::Table { .. } => "table",
            RenameOp::Column { .. } => "column",
        }
    }

    /// Qualified name of the entity before the op.
    pub fn source_name(&self) -> String {
        match self {
            RenameOp::Table { schema, from, .. } => qualified_name(&[schema, from]),
            RenameOp::Column {
                schema,
                owner,
                from,
                ..
            } => qualified_name(&[schema, owner, from]),
        }
    }

    pub fn target_name(&self) -> &str {
        match self {
            RenameOp::Table { to, .. } | RenameOp::Column { to, .. } => to,
        }
    }

    /// The op that undoes this one, assuming later ops were undone first.
    pub fn inverse(&self) -> RenameOp {
        match self {
            RenameOp::Table { schema, from, to } => RenameOp::Table {
                schema: schema.clone(),
                from: to.clone(),
                to: from.clone(),
            },
            RenameOp::Column {
                schema,
                table,
                from,
                to,
                ..
            } => RenameOp::Column {
                schema: schema.clone(),
                table: table.clone(),
                owner: table.clone(),
                from: to.clone(),
                to: from.clone(),
            },
        }
    }

    /// `<kind>\t<original qualified name>\t<generated name>`.
    pub fn log_line(&self) -> String {
        format!("{}\t{}\t{}", self.kind(), self.source_name(), self.target_name())
    }
}

impl fmt::Display for RenameOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} {} -> {}",
            self.kind(),
            self.source_name(),
            self.target_name()
        )
    }
}

/// Ordered rename operations: tables first, then columns table by table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenamePlan {
    pub ops: Vec<RenameOp>,
}

impl RenamePlan {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenameOp> {
        self.ops.iter()
    }

    pub fn table_ops(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, RenameOp::Table { .. }))
            .count()
    }

    pub fn column_ops(&self) -> usize {
        self.len() - self.table_ops()
    }

    /// Plan that restores the original names when applied after this one.
    pub fn inverse(&self) -> RenamePlan {
        RenamePlan {
            ops: self.ops.iter().rev().map(RenameOp::inverse).collect(),
        }
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.ops.iter().map(RenameOp::log_line).collect()
    }
}

impl<'a> IntoIterator for &'a RenamePlan {
    type Item = &'a RenameOp;
    type IntoIter = std::slice::Iter<'a, RenameOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Turn a mapping into an ordered plan, verifying it can be applied.
///
/// Pure: the same inputs always produce the same plan.
pub fn build_plan(
    schema: &DatabaseSchema,
    graph: &RelationshipGraph,
    mapping: &RenameMapping,
) -> Result<RenamePlan> {
    check_lengths(mapping)?;
    check_tables(schema, mapping)?;
    check_columns(schema, mapping)?;
    check_groups(graph, mapping)?;

    let mut ops = Vec::with_capacity(mapping.tables.len() + mapping.columns.len());
    let mut current_names: HashMap<(&str, &str), &str> = HashMap::new();

    for table in &mapping.tables {
        current_names.insert(
            (table.schema.as_str(), table.original.as_str()),
            table.generated.as_str(),
        );
        if table.generated != table.original {
            ops.push(RenameOp::Table {
                schema: table.schema.clone(),
                from: table.original.clone(),
                to: table.generated.clone(),
            });
        }
    }

    for column in &mapping.columns {
        if column.generated == column.original {
            continue;
        }
        let table = current_names
            .get(&(column.schema.as_str(), column.table.as_str()))
            .copied()
            .unwrap_or(column.table.as_str());
        ops.push(RenameOp::Column {
            schema: column.schema.clone(),
            table: table.to_string(),
            owner: column.table.clone(),
            from: column.original.clone(),
            to: column.generated.clone(),
        });
    }

    let plan = RenamePlan { ops };
    tracing::debug!(
        event = "plan_built",
        tables = plan.table_ops(),
        columns = plan.column_ops()
    );
    Ok(plan)
}

fn check_lengths(mapping: &RenameMapping) -> Result<()> {
    let Some(max) = mapping.max_identifier_len else {
        return Ok(());
    };

    let names = mapping
        .tables
        .iter()
        .map(|table| &table.generated)
        .chain(mapping.columns.iter().map(|column| &column.generated));
    for name in names {
        if name.len() > max {
            return Err(PlanConflict::IdentifierTooLong {
                name: name.clone(),
                len: name.len(),
                max,
            });
        }
    }
    Ok(())
}

/// Final table names must stay unique inside each namespace.
fn check_tables(schema: &DatabaseSchema, mapping: &RenameMapping) -> Result<()> {
    for table in &mapping.tables {
        if schema.table(&table.schema, &table.original).is_none() {
            return Err(PlanConflict::UnknownEntity(qualified_name(&[
                &table.schema,
                &table.original,
            ])));
        }
    }

    let mut seen: HashMap<(String, String), String> = HashMap::new();
    for (schema_name, table) in schema.tables() {
        let final_name = mapping
            .table(schema_name, &table.name)
            .map(|renamed| renamed.generated.as_str())
            .unwrap_or(table.name.as_str());
        let key = (schema_name.to_string(), final_name.to_ascii_lowercase());
        let original = qualified_name(&[schema_name, &table.name]);

        if let Some(first) = seen.insert(key, original.clone()) {
            return Err(PlanConflict::DuplicateTable {
                name: final_name.to_string(),
                first,
                second: original,
            });
        }
    }
    Ok(())
}

/// Final column names must stay unique inside each table.
fn check_columns(schema: &DatabaseSchema, mapping: &RenameMapping) -> Result<()> {
    for (schema_name, table) in schema.tables() {
        let mut seen: HashSet<String> = HashSet::new();
        for column in &table.columns {
            let final_name = mapping
                .column(schema_name, &table.name, &column.name)
                .map(|renamed| renamed.generated.as_str())
                .unwrap_or(column.name.as_str());
            if !seen.insert(final_name.to_ascii_lowercase()) {
                return Err(PlanConflict::DuplicateColumn {
                    table: qualified_name(&[schema_name, &table.name]),
                    name: final_name.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Every column of one naming group carries the same base name.
fn check_groups(graph: &RelationshipGraph, mapping: &RenameMapping) -> Result<()> {
    let mut bases: HashMap<GroupId, (&str, String)> = HashMap::new();

    for column in &mapping.columns {
        let qualified = qualified_name(&[&column.schema, &column.table, &column.original]);
        let id = graph
            .column_id(&column.schema, &column.table, &column.original)
            .ok_or_else(|| PlanConflict::UnknownEntity(qualified.clone()))?;
        let group = graph.group_of(id);

        match bases.get(&group) {
            Some((base, first)) if *base != column.base => {
                return Err(PlanConflict::SplitGroup {
                    column: qualified,
                    first: format!("{first} ({base})"),
                    second: column.base.clone(),
                });
            }
            Some(_) => {}
            None => {
                bases.insert(group, (column.base.as_str(), qualified));
            }
        }
    }
    Ok(())
}
