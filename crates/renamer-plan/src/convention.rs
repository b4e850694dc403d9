//! Naming-convention matchers used to infer undeclared references.
//!
//! A matcher only proposes candidates. The resolver decides what a unique,
//! empty or ambiguous answer means, so new conventions plug in without
//! touching the graph logic.

use regex::Regex;

use renamer_core::{ConventionKind, DatabaseSchema, Error as CoreError, Table};

/// A table that may be referenced by an inferred relationship.
#[derive(Debug, Clone, Copy)]
pub struct TargetTable<'a> {
    pub schema: &'a str,
    pub table: &'a Table,
    /// Single-column primary key, when the table has one.
    pub primary_key: Option<&'a str>,
}

/// Read-only view of the schema that matchers search.
#[derive(Debug, Clone)]
pub struct SchemaIndex<'a> {
    tables: Vec<TargetTable<'a>>,
}

impl<'a> SchemaIndex<'a> {
    pub fn new(schema: &'a DatabaseSchema) -> Self {
        let tables = schema
            .tables()
            .map(|(schema, table)| TargetTable {
                schema,
                table,
                primary_key: table.single_primary_key(),
            })
            .collect();
        Self { tables }
    }

    pub fn tables(&self) -> impl Iterator<Item = &TargetTable<'a>> {
        self.tables.iter()
    }

    /// Tables whose name equals `name`, ignoring ASCII case.
    pub fn named(&self, name: &str) -> impl Iterator<Item = &TargetTable<'a>> {
        let name = name.to_string();
        self.tables
            .iter()
            .filter(move |target| target.table.name.eq_ignore_ascii_case(&name))
    }
}

/// Column a matcher believes the source column points at.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl Candidate {
    fn primary_key_of(target: &TargetTable<'_>) -> Option<Self> {
        target.primary_key.map(|column| Self {
            schema: target.schema.to_string(),
            table: target.table.name.clone(),
            column: column.to_string(),
        })
    }
}

/// One naming convention.
pub trait ConventionMatcher: Send + Sync {
    /// Stable name recorded on inferred relationships.
    fn name(&self) -> &str;

    /// Every column `column` could reference under this convention.
    fn candidates(&self, column: &str, index: &SchemaIndex<'_>) -> Vec<Candidate>;
}

/// Build the matcher list for a configuration, in order.
pub fn matchers_from_config(
    conventions: &[ConventionKind],
) -> renamer_core::Result<Vec<Box<dyn ConventionMatcher>>> {
    conventions
        .iter()
        .map(|kind| -> renamer_core::Result<Box<dyn ConventionMatcher>> {
            let matcher: Box<dyn ConventionMatcher> = match kind {
                ConventionKind::SingularTableId => Box::new(SingularTableId),
                ConventionKind::TablePrimaryKey => Box::new(TablePrimaryKey),
                ConventionKind::Pattern { regex } => Box::new(PatternMatcher::new(regex)?),
            };
            Ok(matcher)
        })
        .collect()
}

/// Names a row of `table` could be called in the singular, lowercased.
///
/// `users` -> `user`, `boxes` -> `box`, `categories` -> `category`. The table
/// name itself is always included.
pub fn singular_forms(table: &str) -> Vec<String> {
    let lower = table.to_ascii_lowercase();
    let mut forms = vec![lower.clone()];

    if let Some(stem) = lower.strip_suffix("ies") {
        forms.push(format!("{stem}y"));
    }
    if let Some(stem) = lower.strip_suffix("es") {
        forms.push(stem.to_string());
    }
    if let Some(stem) = lower.strip_suffix('s') {
        forms.push(stem.to_string());
    }

    forms.retain(|form| !form.is_empty());
    forms.dedup();
    forms
}

/// `<singular-table-name>_id` references the table's primary key.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingularTableId;

impl ConventionMatcher for SingularTableId {
    fn name(&self) -> &str {
        "singular_table_id"
    }

    fn candidates(&self, column: &str, index: &SchemaIndex<'_>) -> Vec<Candidate> {
        let lower = column.to_ascii_lowercase();
        let Some(stem) = lower.strip_suffix("_id").filter(|stem| !stem.is_empty()) else {
            return Vec::new();
        };

        index
            .tables()
            .filter(|target| singular_forms(&target.table.name).iter().any(|form| form == stem))
            .filter_map(Candidate::primary_key_of)
            .collect()
    }
}

/// `<table-name>_<pk-column>`, with the table name singular or plural.
#[derive(Debug, Clone, Copy, Default)]
pub struct TablePrimaryKey;

impl ConventionMatcher for TablePrimaryKey {
    fn name(&self) -> &str {
        "table_primary_key"
    }

    fn candidates(&self, column: &str, index: &SchemaIndex<'_>) -> Vec<Candidate> {
        let lower = column.to_ascii_lowercase();

        index
            .tables()
            .filter(|target| {
                let Some(pk) = target.primary_key else {
                    return false;
                };
                let pk = pk.to_ascii_lowercase();
                singular_forms(&target.table.name)
                    .iter()
                    .any(|form| lower == format!("{form}_{pk}"))
            })
            .filter_map(Candidate::primary_key_of)
            .collect()
    }
}

/// User-supplied regex with a named `table` capture and an optional
/// `column` capture. The whole column name must match.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    label: String,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> renamer_core::Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|err| CoreError::InvalidConfig(format!("invalid pattern '{pattern}': {err}")))?;

        if !regex.capture_names().any(|name| name == Some("table")) {
            return Err(CoreError::InvalidConfig(format!(
                "pattern '{pattern}' has no named capture 'table'"
            )));
        }

        Ok(Self {
            regex,
            label: format!("pattern:{pattern}"),
        })
    }
}

impl ConventionMatcher for PatternMatcher {
    fn name(&self) -> &str {
        &self.label
    }

    fn candidates(&self, column: &str, index: &SchemaIndex<'_>) -> Vec<Candidate> {
        let Some(captures) = self.regex.captures(column) else {
            return Vec::new();
        };
        let whole = captures.get(0);
        if whole.is_none_or(|m| m.start() != 0 || m.end() != column.len()) {
            return Vec::new();
        }
        let Some(table) = captures.name("table").map(|m| m.as_str()) else {
            return Vec::new();
        };
        let wanted_column = captures.name("column").map(|m| m.as_str());

        index
            .named(table)
            .filter_map(|target| match wanted_column {
                Some(wanted) => target
                    .table
                    .columns
                    .iter()
                    .find(|candidate| candidate.name.eq_ignore_ascii_case(wanted))
                    .map(|found| Candidate {
                        schema: target.schema.to_string(),
                        table: target.table.name.clone(),
                        column: found.name.clone(),
                    }),
                None => Candidate::primary_key_of(target),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renamer_core::{Column, Constraint, PrimaryKey, Schema};

    fn table(name: &str, pk: &str, extra: &[&str]) -> Table {
        let mut columns = vec![Column {
            ordinal_position: 1,
            name: pk.to_string(),
            data_type: "integer".to_string(),
            is_nullable: false,
            is_primary_key: true,
        }];
        for (offset, column) in extra.iter().enumerate() {
            columns.push(Column {
                ordinal_position: offset as i16 + 2,
                name: column.to_string(),
                data_type: "text".to_string(),
                is_nullable: true,
                is_primary_key: false,
            });
        }
        Table {
            name: name.to_string(),
            columns,
            constraints: vec![Constraint::PrimaryKey(PrimaryKey {
                name: None,
                columns: vec![pk.to_string()],
            })],
        }
    }

    fn schema(tables: Vec<Table>) -> DatabaseSchema {
        DatabaseSchema {
            schema_version: renamer_core::SCHEMA_VERSION.to_string(),
            engine: "memory".to_string(),
            database: None,
            schemas: vec![Schema {
                name: "public".to_string(),
                tables,
            }],
        }
    }

    #[test]
    fn singular_forms_cover_common_plurals() {
        assert!(singular_forms("users").contains(&"user".to_string()));
        assert!(singular_forms("boxes").contains(&"box".to_string()));
        assert!(singular_forms("Categories").contains(&"category".to_string()));
        assert_eq!(singular_forms("person"), vec!["person".to_string()]);
    }

    #[test]
    fn singular_table_id_targets_primary_key() {
        let schema = schema(vec![table("users", "id", &[]), table("categories", "id", &[])]);
        let index = SchemaIndex::new(&schema);

        let found = SingularTableId.candidates("user_id", &index);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].table, "users");
        assert_eq!(found[0].column, "id");

        assert_eq!(SingularTableId.candidates("category_id", &index).len(), 1);
        assert!(SingularTableId.candidates("id", &index).is_empty());
        assert!(SingularTableId.candidates("_id", &index).is_empty());
    }

    #[test]
    fn table_primary_key_uses_pk_name() {
        let schema = schema(vec![table("users", "uuid", &[])]);
        let index = SchemaIndex::new(&schema);

        assert_eq!(TablePrimaryKey.candidates("users_uuid", &index).len(), 1);
        assert_eq!(TablePrimaryKey.candidates("user_uuid", &index).len(), 1);
        assert!(TablePrimaryKey.candidates("users_id", &index).is_empty());
    }

    #[test]
    fn pattern_requires_table_capture() {
        assert!(PatternMatcher::new("^fk_(?P<table>\\w+)$").is_ok());
        assert!(PatternMatcher::new("^fk_(\\w+)$").is_err());
        assert!(PatternMatcher::new("(").is_err());
    }

    #[test]
    fn pattern_resolves_explicit_column() {
        let schema = schema(vec![table("users", "id", &["email"])]);
        let index = SchemaIndex::new(&schema);
        let matcher = PatternMatcher::new("ref_(?P<table>[a-z]+)__(?P<column>[a-z]+)").unwrap();

        let found = matcher.candidates("ref_users__email", &index);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].column, "email");

        assert!(matcher.candidates("xref_users__email", &index).is_empty());
        assert!(matcher.candidates("ref_users__missing", &index).is_empty());
    }

    #[test]
    fn builds_matchers_in_order() {
        let matchers = matchers_from_config(&[
            ConventionKind::TablePrimaryKey,
            ConventionKind::Pattern {
                regex: "(?P<table>\\w+)_ref".to_string(),
            },
            ConventionKind::SingularTableId,
        ])
        .unwrap();
        let names: Vec<&str> = matchers.iter().map(|matcher| matcher.name()).collect();
        assert_eq!(
            names,
            vec!["table_primary_key", "pattern:(?P<table>\\w+)_ref", "singular_table_id"]
        );
    }
}
