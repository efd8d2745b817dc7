use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::{TypeModule, TypeNode};
use crate::types::TypeKind;

/// Summary of the type reference graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Dependency ordering of the type assignments in a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceGraphReport {
    pub summary: ReferenceGraphSummary,
    /// Referenced types come before the types that use them.
    pub dependency_order: Option<Vec<String>>,
    /// Types that could not be ordered because they sit on or behind a cycle.
    pub cycle: Option<Vec<String>>,
}

impl ReferenceGraphReport {
    pub fn is_acyclic(&self) -> bool {
        self.cycle.is_none()
    }
}

/// Build a deterministic reference report for a module.
pub fn build_reference_graph_report(module: &TypeModule) -> ReferenceGraphReport {
    let graph = build_adjacency(module);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = ReferenceGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => ReferenceGraphReport {
            summary,
            dependency_order: Some(order),
            cycle: None,
        },
        Err(cycle) => ReferenceGraphReport {
            summary,
            dependency_order: None,
            cycle: Some(cycle),
        },
    }
}

/// Names referenced anywhere inside `node`, in declaration order.
pub fn referenced_types(node: &TypeNode) -> Vec<&str> {
    let mut out = Vec::new();
    collect_references(node, &mut out);
    out
}

fn collect_references<'a>(node: &'a TypeNode, out: &mut Vec<&'a str>) {
    match &node.kind {
        TypeKind::Reference(reference) => out.push(reference.target.as_str()),
        TypeKind::SequenceOf(sequence_of) => collect_references(&sequence_of.element, out),
        TypeKind::Sequence(sequence) => {
            for field in &sequence.fields {
                collect_references(&field.ty, out);
            }
        }
        TypeKind::Choice(choice) => {
            for alternative in &choice.alternatives {
                collect_references(&alternative.ty, out);
            }
        }
        _ => {}
    }
}

// Edges point from the referenced type to the type that uses it.
fn build_adjacency(module: &TypeModule) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for assignment in &module.types {
        graph.entry(assignment.name.clone()).or_default();

        for target in referenced_types(&assignment.ty) {
            graph
                .entry(target.to_string())
                .or_default()
                .insert(assignment.name.clone());
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();

    for node in graph.keys() {
        indegree.entry(node.clone()).or_insert(0);
    }

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then(|| node.clone()))
        .collect();

    let mut order = Vec::with_capacity(graph.len());

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

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect();
        Err(cycle_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::SizeBounds;
    use crate::schema::TypeAssignment;
    use crate::types::Field;

    #[test]
    fn orders_referenced_types_first() {
        let module = TypeModule::new(
            "M",
            vec![
                TypeAssignment::new(
                    "Packet",
                    TypeNode::sequence(
                        11,
                        vec![
                            Field::mandatory("header", TypeNode::reference("Header")),
                            Field::mandatory(
                                "body",
                                TypeNode::sequence_of(6, SizeBounds::new(0, 4), TypeNode::reference("Word")),
                            ),
                        ],
                    ),
                ),
                TypeAssignment::new("Header", TypeNode::integer(1, 0, 7)),
                TypeAssignment::new("Word", TypeNode::integer(16, 0, 65535)),
            ],
        );

        let report = build_reference_graph_report(&module);
        assert_eq!(report.summary.nodes, 3);
        assert_eq!(report.summary.edges, 2);
        let order = report.dependency_order.expect("expected ordering");
        let packet = order.iter().position(|name| name == "Packet").unwrap();
        let header = order.iter().position(|name| name == "Header").unwrap();
        let word = order.iter().position(|name| name == "Word").unwrap();
        assert!(header < packet);
        assert!(word < packet);
    }

    #[test]
    fn reports_self_reference_as_cycle() {
        let module = TypeModule::new(
            "M",
            vec![TypeAssignment::new(
                "Tree",
                TypeNode::sequence(
                    6,
                    vec![
                        Field::mandatory("value", TypeNode::integer(1, 0, 9)),
                        Field::optional("next", TypeNode::reference("Tree")),
                    ],
                ),
            )],
        );

        let report = build_reference_graph_report(&module);
        assert!(!report.is_acyclic());
        assert!(
            report
                .cycle
                .as_ref()
                .unwrap()
                .contains(&"Tree".to_string())
        );
    }
}
