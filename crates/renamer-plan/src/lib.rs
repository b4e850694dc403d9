//! Relationship resolution, name generation and rename planning.
//!
//! The pipeline is pure: [`resolve`] links columns that must share a name,
//! [`generate_names`] assigns generic identifiers and [`build_plan`] orders
//! the renames. Nothing here touches a target.

pub mod convention;
pub mod errors;
pub mod naming;
pub mod planner;
pub mod resolver;
pub mod unionfind;

pub use convention::{
    matchers_from_config, singular_forms, Candidate, ConventionMatcher, PatternMatcher,
    SchemaIndex, SingularTableId, TablePrimaryKey,
};
pub use errors::{PlanConflict, ResolutionAmbiguity};
pub use naming::{alpha_suffix, generate_names, table_order, ColumnName, RenameMapping, TableName};
pub use planner::{build_plan, RenameOp, RenamePlan};
pub use resolver::{
    resolve, resolve_with, ColumnId, ColumnNode, GroupId, Relationship, RelationshipGraph,
    RelationshipOrigin,
};
pub use unionfind::UnionFind;

use renamer_core::{DatabaseSchema, RenameConfig};

/// Everything planning produced for one run.
#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub graph: RelationshipGraph,
    pub mapping: RenameMapping,
    pub plan: RenamePlan,
}

/// Failure anywhere in [`plan_renames`].
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error(transparent)]
    Config(#[from] renamer_core::Error),
    #[error(transparent)]
    Conflict(#[from] PlanConflict),
}

/// Resolve, name and plan in one step.
pub fn plan_renames(
    schema: &DatabaseSchema,
    config: &RenameConfig,
) -> Result<PlanOutput, PlanningError> {
    let graph = resolve(schema, config)?;
    let mapping = generate_names(schema, &graph, config)?;
    let plan = build_plan(schema, &graph, &mapping)?;
    Ok(PlanOutput {
        graph,
        mapping,
        plan,
    })
}
