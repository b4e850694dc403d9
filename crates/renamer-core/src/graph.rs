use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::qualified_name;
use crate::schema::DatabaseSchema;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for a database schema.
///
/// Edges point from the referenced table to the referencing table, so the
/// topological order lists parents before their children.
pub fn build_fk_graph_report(schema: &DatabaseSchema) -> FkGraphReport {
    let graph = build_adjacency(schema);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = FkGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(schema: &DatabaseSchema) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (schema_name, table) in schema.tables() {
        let table_key = qualified_name(&[schema_name, &table.name]);
        graph.entry(table_key.clone()).or_default();

        for fk in table.foreign_keys() {
            let referenced = qualified_name(&[&fk.referenced_schema, &fk.referenced_table]);
            graph
                .entry(referenced)
                .or_default()
                .insert(table_key.clone());
        }
    }

    graph
}

/// Kahn's algorithm with alphabetical tie-breaking.
///
/// Returns the full order, or the nodes still blocked by a cycle.
pub fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let (order, blocked) = partial_toposort(graph);
    if blocked.is_empty() {
        Ok(order)
    } else {
        Err(blocked)
    }
}

/// Like [`toposort`], but never fails: nodes stuck in a cycle are appended
/// alphabetically after the ordered prefix.
pub fn dependency_order(graph: &BTreeMap<String, BTreeSet<String>>) -> Vec<String> {
    let (mut order, blocked) = partial_toposort(graph);
    order.extend(blocked);
    order
}

fn partial_toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> (Vec<String>, Vec<String>) {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();

    for (node, targets) in graph {
        indegree.entry(node.clone()).or_insert(0);
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| node.clone())
        .collect();

    let mut order = Vec::with_capacity(indegree.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.clone());

        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
    }

    let blocked: Vec<String> = indegree
        .into_iter()
        .filter_map(|(node, count)| if count > 0 { Some(node) } else { None })
        .collect();

    (order, blocked)
}
