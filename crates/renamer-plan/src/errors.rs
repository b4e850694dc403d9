use thiserror::Error;

/// A convention matcher found more than one plausible target for a column.
///
/// Not fatal: the column gets no inferred edge and the record is kept on the
/// graph so a dry run can show it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{column}: {matcher} matches {} candidates ({})", .candidates.len(), .candidates.join(", "))]
pub struct ResolutionAmbiguity {
    /// Qualified source column (`schema.table.column`).
    pub column: String,
    pub matcher: String,
    /// Qualified candidate target columns, sorted.
    pub candidates: Vec<String>,
}

/// The generated names cannot be applied safely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanConflict {
    #[error("generated table name {name} is assigned to both {first} and {second}")]
    DuplicateTable {
        name: String,
        first: String,
        second: String,
    },
    #[error("generated column name {name} is assigned twice in table {table}")]
    DuplicateColumn { table: String, name: String },
    #[error("generated name {name} is {len} bytes, the target accepts at most {max}")]
    IdentifierTooLong { name: String, len: usize, max: usize },
    #[error("naming group of {column} was split across {first} and {second}")]
    SplitGroup {
        column: String,
        first: String,
        second: String,
    },
    #[error("mapping references unknown {0}")]
    UnknownEntity(String),
}

/// Result type for plan construction.
pub type Result<T> = std::result::Result<T, PlanConflict>;
