use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Primary key definition preserving column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Unique constraint definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UniqueConstraint {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Foreign key action semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    Unknown,
}

impl FkAction {
    /// Parse the textual form used by SQLite pragmas (`SET NULL`, `CASCADE`, ...).
    pub fn from_sql(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "NO ACTION" => Self::NoAction,
            "RESTRICT" => Self::Restrict,
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            _ => Self::Unknown,
        }
    }

    /// Parse the single-letter codes stored in `pg_constraint`.
    pub fn from_pg_code(code: i8) -> Self {
        match code as u8 {
            b'a' => Self::NoAction,
            b'r' => Self::Restrict,
            b'c' => Self::Cascade,
            b'n' => Self::SetNull,
            b'd' => Self::SetDefault,
            _ => Self::Unknown,
        }
    }
}

/// Foreign key definition preserving column ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_update: FkAction,
    pub on_delete: FkAction,
}

/// Table-level constraint definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    PrimaryKey(PrimaryKey),
    ForeignKey(ForeignKey),
    Unique(UniqueConstraint),
}

impl Constraint {
    /// Deterministic sort key: primary key, unique constraints, then foreign keys.
    pub fn sort_key(&self) -> (u8, String, String) {
        match self {
            Constraint::PrimaryKey(pk) => {
                (0, pk.name.clone().unwrap_or_default(), pk.columns.join("|"))
            }
            Constraint::Unique(unique) => (
                1,
                unique.name.clone().unwrap_or_default(),
                unique.columns.join("|"),
            ),
            Constraint::ForeignKey(fk) => {
                (2, fk.name.clone().unwrap_or_default(), fk.columns.join("|"))
            }
        }
    }

    /// Every local column name this constraint refers to.
    pub fn columns_mut(&mut self) -> &mut Vec<String> {
        match self {
            Constraint::PrimaryKey(pk) => &mut pk.columns,
            Constraint::Unique(unique) => &mut unique.columns,
            Constraint::ForeignKey(fk) => &mut fk.columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_actions() {
        assert_eq!(FkAction::from_sql("set null"), FkAction::SetNull);
        assert_eq!(FkAction::from_sql("NO ACTION"), FkAction::NoAction);
        assert_eq!(FkAction::from_sql("whatever"), FkAction::Unknown);
    }

    #[test]
    fn parses_pg_codes() {
        assert_eq!(FkAction::from_pg_code(b'c' as i8), FkAction::Cascade);
        assert_eq!(FkAction::from_pg_code(b'x' as i8), FkAction::Unknown);
    }
}
