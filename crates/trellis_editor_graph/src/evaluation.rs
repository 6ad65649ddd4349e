// SPDX-License-Identifier: MIT OR Apache-2.0
//! Update pass over a graph tree.

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::node::{NodeId, NodeKindRegistry};
use crate::types::TypeRegistry;

/// What happened during an update pass
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Nodes whose update hook ran successfully, in run order
    pub updated: Vec<NodeId>,
    /// Nodes whose kind is not registered
    pub skipped: Vec<NodeId>,
    /// Nodes whose update hook failed
    pub failed: Vec<(NodeId, GraphError)>,
}

impl UpdateReport {
    /// Whether every node updated
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }

    fn merge(&mut self, other: UpdateReport) {
        self.updated.extend(other.updated);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

/// Run every node's update hook once, sources before the nodes reading them.
///
/// Nested graphs are updated after their parent. A failing node is recorded
/// and the pass continues; a cyclic graph aborts the pass.
pub fn run_update_pass(
    graph: &mut Graph,
    kinds: &NodeKindRegistry,
    types: &TypeRegistry,
) -> Result<UpdateReport> {
    let order = graph
        .topological_order()
        .map_err(|_| GraphError::WouldCreateCycle)?;

    let mut report = UpdateReport::default();
    for node_id in order {
        let Some(kind_id) = graph.node(node_id).map(|node| node.kind_id.clone()) else {
            continue;
        };
        let Some(kind) = kinds.get(&kind_id) else {
            tracing::warn!(?node_id, kind = %kind_id, "no registered kind, skipping update");
            report.skipped.push(node_id);
            continue;
        };
        match kind.update(node_id, graph, types) {
            Ok(()) => report.updated.push(node_id),
            Err(err) => {
                tracing::warn!(?node_id, %err, "node update failed");
                report.failed.push((node_id, err));
            }
        }
    }

    for child in graph.children_mut() {
        report.merge(run_update_pass(child, kinds, types)?);
    }

    tracing::debug!(
        graph = %graph.name,
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "update pass finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeKind};
    use crate::port::PortSpec;
    use crate::types::TypeDescriptor;
    use egui::{Color32, Pos2};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records the order in which nodes are updated
    struct Recorder {
        log: Arc<Mutex<Vec<NodeId>>>,
    }

    impl NodeKind for Recorder {
        fn id(&self) -> &str {
            "recorder"
        }

        fn name(&self) -> &str {
            "Recorder"
        }

        fn ports(&self) -> Vec<PortSpec> {
            vec![PortSpec::input("In", "Float"), PortSpec::output("Out", "Float")]
        }

        fn update(&self, node: NodeId, _graph: &mut Graph, _types: &TypeRegistry) -> Result<()> {
            self.log.lock().push(node);
            Ok(())
        }
    }

    #[test]
    fn test_sources_update_first() {
        let mut types = TypeRegistry::new();
        types.register(TypeDescriptor::new("Float", Color32::LIGHT_BLUE)).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut kinds = NodeKindRegistry::new();
        kinds.register(Arc::new(Recorder { log: log.clone() })).unwrap();

        let mut graph = Graph::new("root");
        let c = graph.add_node(kinds.create_node("recorder", Pos2::ZERO).unwrap()).unwrap();
        let b = graph.add_node(kinds.create_node("recorder", Pos2::ZERO).unwrap()).unwrap();
        let a = graph.add_node(kinds.create_node("recorder", Pos2::ZERO).unwrap()).unwrap();
        let orphan = graph.add_node(Node::new("missing", "Missing", Pos2::ZERO)).unwrap();

        let out = |g: &Graph, n| g.node(n).unwrap().outputs[0].id;
        let inp = |g: &Graph, n| g.node(n).unwrap().inputs[0].id;
        let (ao, bi, bo, ci) = (out(&graph, a), inp(&graph, b), out(&graph, b), inp(&graph, c));
        graph.try_connect(ao, bi, &types).unwrap();
        graph.try_connect(bo, ci, &types).unwrap();

        let report = run_update_pass(&mut graph, &kinds, &types).unwrap();
        assert_eq!(*log.lock(), vec![a, b, c]);
        assert_eq!(report.skipped, vec![orphan]);
        assert!(!report.is_clean());
    }
}
