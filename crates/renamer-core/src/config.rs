use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default prefix for generated table names (`table_a`).
pub const DEFAULT_PREFIX_TABLE: &str = "table";
/// Default prefix for generated column names (`column1`).
pub const DEFAULT_PREFIX_COLUMN: &str = "column";

/// Naming conventions the resolver can use to infer undeclared relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConventionKind {
    /// `<singular-table-name>_id`, e.g. `user_id` -> `users.id`.
    SingularTableId,
    /// `<table-name>_<pk-column>`, e.g. `users_uuid` -> `users.uuid`.
    TablePrimaryKey,
    /// Regex with a named `table` capture and an optional `column` capture.
    Pattern { regex: String },
}

/// Immutable run configuration threaded through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    pub prefix_table: String,
    pub prefix_column: String,
    /// Matchers tried in order for every column without a declared foreign key.
    pub conventions: Vec<ConventionKind>,
    /// Tables (bare or `schema.table`) that keep their names.
    pub exclude_tables: Vec<String>,
    /// Longest identifier the target accepts, when it has a limit.
    pub max_identifier_len: Option<usize>,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            prefix_table: DEFAULT_PREFIX_TABLE.to_string(),
            prefix_column: DEFAULT_PREFIX_COLUMN.to_string(),
            conventions: vec![ConventionKind::SingularTableId, ConventionKind::TablePrimaryKey],
            exclude_tables: Vec::new(),
            max_identifier_len: None,
        }
    }
}

impl RenameConfig {
    /// Check prefixes and limits before the pipeline runs.
    pub fn validate(&self) -> Result<()> {
        for (label, prefix) in [
            ("prefix_table", &self.prefix_table),
            ("prefix_column", &self.prefix_column),
        ] {
            if !is_valid_identifier(prefix) {
                return Err(Error::InvalidConfig(format!(
                    "{label} must match [A-Za-z_][A-Za-z0-9_]*, got '{prefix}'"
                )));
            }
        }

        if self.max_identifier_len == Some(0) {
            return Err(Error::InvalidConfig(
                "max_identifier_len must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether a table keeps its original name.
    pub fn is_excluded(&self, schema: &str, table: &str) -> bool {
        self.exclude_tables.iter().any(|item| match item.split_once('.') {
            Some((item_schema, item_table)) => item_schema == schema && item_table == table,
            None => item == table,
        })
    }
}

/// Plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = RenameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.prefix_table, "table");
        assert_eq!(config.prefix_column, "column");
    }

    #[test]
    fn rejects_bad_prefixes() {
        let config = RenameConfig {
            prefix_table: "1abc".to_string(),
            ..RenameConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = RenameConfig {
            prefix_column: "col-".to_string(),
            ..RenameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RenameConfig {
            prefix_column: String::new(),
            ..RenameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn exclusion_accepts_bare_and_qualified_names() {
        let config = RenameConfig {
            exclude_tables: vec!["audit".to_string(), "billing.invoices".to_string()],
            ..RenameConfig::default()
        };
        assert!(config.is_excluded("public", "audit"));
        assert!(config.is_excluded("billing", "invoices"));
        assert!(!config.is_excluded("public", "invoices"));
    }
}
