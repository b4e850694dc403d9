use std::collections::{BTreeMap, HashMap, HashSet};

use renamer_core::{qualified_name, DatabaseSchema, RenameConfig};

use crate::convention::{matchers_from_config, Candidate, ConventionMatcher, SchemaIndex};
use crate::errors::ResolutionAmbiguity;
use crate::unionfind::UnionFind;

/// Index of a column in the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(pub usize);

/// Naming group label: the smallest [`ColumnId`] in the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub usize);

/// A column as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNode {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub ordinal_position: i16,
}

impl ColumnNode {
    pub fn qualified(&self) -> String {
        qualified_name(&[&self.schema, &self.table, &self.name])
    }

    pub fn qualified_table(&self) -> String {
        qualified_name(&[&self.schema, &self.table])
    }
}

/// Where an edge came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipOrigin {
    Declared { constraint: Option<String> },
    Inferred { matcher: String },
}

/// Source column references target column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub source: ColumnId,
    pub target: ColumnId,
    pub origin: RelationshipOrigin,
}

/// Columns linked by declared or inferred references, grouped for naming.
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    columns: Vec<ColumnNode>,
    lookup: HashMap<(String, String, String), ColumnId>,
    relationships: Vec<Relationship>,
    ambiguities: Vec<ResolutionAmbiguity>,
    groups: Vec<GroupId>,
}

impl RelationshipGraph {
    pub fn columns(&self) -> &[ColumnNode] {
        &self.columns
    }

    pub fn column(&self, id: ColumnId) -> &ColumnNode {
        &self.columns[id.0]
    }

    pub fn column_id(&self, schema: &str, table: &str, column: &str) -> Option<ColumnId> {
        self.lookup
            .get(&(schema.to_string(), table.to_string(), column.to_string()))
            .copied()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn ambiguities(&self) -> &[ResolutionAmbiguity] {
        &self.ambiguities
    }

    pub fn group_of(&self, id: ColumnId) -> GroupId {
        self.groups[id.0]
    }

    /// Members of every naming group, in arena order.
    pub fn groups(&self) -> BTreeMap<GroupId, Vec<ColumnId>> {
        let mut groups: BTreeMap<GroupId, Vec<ColumnId>> = BTreeMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            groups.entry(*group).or_default().push(ColumnId(index));
        }
        groups
    }

    pub fn inferred_count(&self) -> usize {
        self.relationships
            .iter()
            .filter(|rel| matches!(rel.origin, RelationshipOrigin::Inferred { .. }))
            .count()
    }
}

/// Build the relationship graph using the conventions named in `config`.
///
/// Fails only when a configured pattern does not compile.
pub fn resolve(
    schema: &DatabaseSchema,
    config: &RenameConfig,
) -> renamer_core::Result<RelationshipGraph> {
    let matchers = matchers_from_config(&config.conventions)?;
    Ok(resolve_with(schema, &matchers))
}

/// Build the relationship graph with an explicit matcher list.
pub fn resolve_with(
    schema: &DatabaseSchema,
    matchers: &[Box<dyn ConventionMatcher>],
) -> RelationshipGraph {
    let mut columns = Vec::with_capacity(schema.column_count());
    let mut lookup = HashMap::new();

    for (schema_name, table) in schema.tables() {
        let mut ordered: Vec<_> = table.columns.iter().collect();
        ordered.sort_by_key(|column| column.ordinal_position);
        for column in ordered {
            let id = ColumnId(columns.len());
            lookup.insert(
                (
                    schema_name.to_string(),
                    table.name.clone(),
                    column.name.clone(),
                ),
                id,
            );
            columns.push(ColumnNode {
                schema: schema_name.to_string(),
                table: table.name.clone(),
                name: column.name.clone(),
                ordinal_position: column.ordinal_position,
            });
        }
    }

    let find = |schema: &str, table: &str, column: &str| {
        lookup
            .get(&(schema.to_string(), table.to_string(), column.to_string()))
            .copied()
    };

    let mut relationships = Vec::new();
    let mut declared_sources: HashSet<ColumnId> = HashSet::new();

    for (schema_name, table) in schema.tables() {
        for fk in table.foreign_keys() {
            for (source, target) in fk.columns.iter().zip(&fk.referenced_columns) {
                let Some(source_id) = find(schema_name, &table.name, source) else {
                    continue;
                };
                declared_sources.insert(source_id);
                let Some(target_id) = find(&fk.referenced_schema, &fk.referenced_table, target)
                else {
                    continue;
                };
                relationships.push(Relationship {
                    source: source_id,
                    target: target_id,
                    origin: RelationshipOrigin::Declared {
                        constraint: fk.name.clone(),
                    },
                });
            }
        }
    }

    let index = SchemaIndex::new(schema);
    let mut ambiguities = Vec::new();

    for (position, node) in columns.iter().enumerate() {
        let source = ColumnId(position);
        if declared_sources.contains(&source) {
            continue;
        }

        for matcher in matchers {
            let candidates = narrow(node, matcher.candidates(&node.name, &index));
            match candidates.as_slice() {
                [] => continue,
                [only] => {
                    if let Some(target) = find(&only.schema, &only.table, &only.column) {
                        relationships.push(Relationship {
                            source,
                            target,
                            origin: RelationshipOrigin::Inferred {
                                matcher: matcher.name().to_string(),
                            },
                        });
                    }
                    break;
                }
                many => {
                    let ambiguity = ResolutionAmbiguity {
                        column: node.qualified(),
                        matcher: matcher.name().to_string(),
                        candidates: many
                            .iter()
                            .map(|candidate| {
                                qualified_name(&[
                                    &candidate.schema,
                                    &candidate.table,
                                    &candidate.column,
                                ])
                            })
                            .collect(),
                    };
                    tracing::warn!(
                        event = "resolution_ambiguity",
                        column = %ambiguity.column,
                        matcher = %ambiguity.matcher,
                        candidates = ?ambiguity.candidates,
                        "ambiguous naming convention match, no edge inferred"
                    );
                    ambiguities.push(ambiguity);
                }
            }
        }
    }

    let mut sets = UnionFind::new(columns.len());
    for rel in &relationships {
        sets.union(rel.source.0, rel.target.0);
    }

    let mut labels: HashMap<usize, GroupId> = HashMap::new();
    let groups = (0..columns.len())
        .map(|index| {
            let root = sets.find(index);
            *labels.entry(root).or_insert(GroupId(index))
        })
        .collect::<Vec<_>>();

    let graph = RelationshipGraph {
        columns,
        lookup,
        relationships,
        ambiguities,
        groups,
    };

    tracing::debug!(
        event = "relationships_resolved",
        columns = graph.columns.len(),
        relationships = graph.relationships.len(),
        inferred = graph.inferred_count(),
        ambiguities = graph.ambiguities.len(),
        groups = labels.len()
    );

    graph
}

/// Drop self-matches and prefer targets in the source column's namespace.
fn narrow(source: &ColumnNode, candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| {
            !(candidate.schema == source.schema
                && candidate.table == source.table
                && candidate.column == source.name)
        })
        .collect();
    candidates.sort();
    candidates.dedup();

    if candidates
        .iter()
        .any(|candidate| candidate.schema == source.schema)
    {
        candidates.retain(|candidate| candidate.schema == source.schema);
    }
    candidates
}
