// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conditional logic node kinds.

use crate::types::{Condition, FloatValue, CONDITION, FLOAT};
use std::sync::Arc;
use trellis_editor_graph::{
    Graph, GraphError, NodeId, NodeKind, NodeKindProvider, NodeKindRegistry, PortId, PortSpec,
    Result, TypeRegistry,
};

/// Kind ID of [`BoolSource`]
pub const BOOL_SOURCE: &str = "BoolSource";

/// Kind ID of [`AndGate`]
pub const AND_GATE: &str = "AndGate";

/// Kind ID of [`ExampleNode`]
pub const EXAMPLE: &str = "Example";

const CATEGORY: &str = "Conditional Logic";

/// Output port of `node` at `index`
fn output_of(graph: &Graph, node: NodeId, index: usize) -> Result<PortId> {
    let node_ref = graph.node(node).ok_or(GraphError::NodeNotFound(node))?;
    node_ref
        .output(index)
        .map(|port| port.id)
        .ok_or(GraphError::NodeNotFound(node))
}

/// Condition read through the first connection of an input, if any
fn read_condition(graph: &Graph, node: NodeId, input: usize) -> Option<bool> {
    let input = graph.node(node)?.input(input)?.id;
    let source = graph.first_source(input)?;
    graph
        .port(source)?
        .cached_value::<Condition>()
        .map(|condition| condition.value)
}

/// Write a condition into an output slot
fn write_condition(
    graph: &mut Graph,
    output: PortId,
    types: &TypeRegistry,
    condition: Condition,
) -> Result<()> {
    let port = graph.port_mut(output).ok_or(GraphError::PortNotFound(output))?;
    *port.value::<Condition>(types)? = condition;
    Ok(())
}

/// A user-set boolean; starts out true
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolSource;

impl NodeKind for BoolSource {
    fn id(&self) -> &str {
        BOOL_SOURCE
    }

    fn name(&self) -> &str {
        "Bool Node"
    }

    fn category(&self) -> &str {
        CATEGORY
    }

    fn size(&self) -> [f32; 2] {
        [150.0, 130.0]
    }

    fn ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::output("Value", CONDITION)]
    }

    fn update(&self, node: NodeId, graph: &mut Graph, types: &TypeRegistry) -> Result<()> {
        let output = output_of(graph, node, 0)?;
        let port = graph.port_mut(output).ok_or(GraphError::PortNotFound(output))?;
        if !port.has_value() {
            port.value::<Condition>(types)?.value = true;
        }
        Ok(())
    }
}

/// True when both inputs are connected and true
#[derive(Debug, Clone, Copy, Default)]
pub struct AndGate;

impl NodeKind for AndGate {
    fn id(&self) -> &str {
        AND_GATE
    }

    fn name(&self) -> &str {
        "And Node"
    }

    fn category(&self) -> &str {
        CATEGORY
    }

    fn size(&self) -> [f32; 2] {
        [100.0, 70.0]
    }

    fn ports(&self) -> Vec<PortSpec> {
        vec![
            PortSpec::input("Condition A", CONDITION),
            PortSpec::input("Condition B", CONDITION),
            PortSpec::output("Result", CONDITION),
        ]
    }

    fn update(&self, node: NodeId, graph: &mut Graph, types: &TypeRegistry) -> Result<()> {
        let a = read_condition(graph, node, 0);
        let b = read_condition(graph, node, 1);
        let value = matches!((a, b), (Some(true), Some(true)));
        tracing::trace!(?node, ?a, ?b, value, "and gate evaluated");

        let output = output_of(graph, node, 0)?;
        write_condition(graph, output, types, Condition::new(value))
    }
}

/// Float pass-through used to demonstrate custom nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleNode;

impl NodeKind for ExampleNode {
    fn id(&self) -> &str {
        EXAMPLE
    }

    fn name(&self) -> &str {
        "Example Node"
    }

    fn ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::input("Value", FLOAT), PortSpec::output("Output", FLOAT)]
    }

    fn update(&self, node: NodeId, graph: &mut Graph, types: &TypeRegistry) -> Result<()> {
        let input = graph
            .node(node)
            .and_then(|n| n.input(0))
            .map(|port| port.id)
            .ok_or(GraphError::NodeNotFound(node))?;
        let value = graph
            .first_source(input)
            .and_then(|source| graph.port(source))
            .and_then(|port| port.cached_value::<FloatValue>())
            .copied()
            .unwrap_or_default();

        let output = output_of(graph, node, 0)?;
        let port = graph.port_mut(output).ok_or(GraphError::PortNotFound(output))?;
        *port.value::<FloatValue>(types)? = value;
        Ok(())
    }
}

/// Provides every logic node kind
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicNodes;

impl NodeKindProvider for LogicNodes {
    fn node_kinds(&self) -> Vec<Arc<dyn NodeKind>> {
        vec![Arc::new(BoolSource), Arc::new(AndGate), Arc::new(ExampleNode)]
    }
}

/// Create the conditional logic node registry
pub fn create_logic_registry() -> Result<NodeKindRegistry> {
    NodeKindRegistry::from_providers(&[&LogicNodes])
}

/// Set the value of a bool source
pub fn set_bool(graph: &mut Graph, node: NodeId, value: bool, types: &TypeRegistry) -> Result<()> {
    let kind = graph.node(node).ok_or(GraphError::NodeNotFound(node))?;
    if kind.kind_id != BOOL_SOURCE {
        return Err(GraphError::UnknownNodeKind(kind.kind_id.clone()));
    }
    let output = output_of(graph, node, 0)?;
    let port = graph.port_mut(output).ok_or(GraphError::PortNotFound(output))?;
    port.value::<Condition>(types)?.value = value;
    Ok(())
}

/// Current result of a condition-producing node, if it has been computed
pub fn condition_of(graph: &Graph, node: NodeId) -> Option<&Condition> {
    graph
        .node(node)?
        .outputs
        .iter()
        .find(|port| port.type_tag == CONDITION)?
        .cached_value::<Condition>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogicTypes;
    use egui::Pos2;
    use trellis_editor_graph::{run_update_pass, NodeTemplate};

    fn fixture() -> (TypeRegistry, NodeKindRegistry, Graph) {
        let types = TypeRegistry::from_providers(&[&LogicTypes]).unwrap();
        let kinds = create_logic_registry().unwrap();
        (types, kinds, Graph::new("logic"))
    }

    fn add(graph: &mut Graph, kinds: &NodeKindRegistry, kind: &str) -> NodeId {
        graph.add_node(kinds.create_node(kind, Pos2::ZERO).unwrap()).unwrap()
    }

    #[test]
    fn test_kind_layouts() {
        let (_, kinds, _) = fixture();
        assert_eq!(kinds.len(), 3);
        let gate = kinds.create_node(AND_GATE, Pos2::new(5.0, 5.0)).unwrap();
        assert_eq!(gate.inputs.len(), 2);
        assert_eq!(gate.inputs[0].name, "Condition A");
        assert_eq!(gate.inputs[1].name, "Condition B");
        assert_eq!(gate.outputs.len(), 1);
        assert_eq!(gate.size, [100.0, 70.0]);
        assert_eq!(kinds.create_node(BOOL_SOURCE, Pos2::ZERO).unwrap().outputs.len(), 1);
    }

    #[test]
    fn test_bool_source_defaults_to_true() {
        let (types, kinds, mut graph) = fixture();
        let source = add(&mut graph, &kinds, BOOL_SOURCE);
        assert_eq!(condition_of(&graph, source), None);

        run_update_pass(&mut graph, &kinds, &types).unwrap();
        assert_eq!(condition_of(&graph, source), Some(&Condition::new(true)));

        set_bool(&mut graph, source, false, &types).unwrap();
        run_update_pass(&mut graph, &kinds, &types).unwrap();
        assert_eq!(condition_of(&graph, source), Some(&Condition::new(false)));
    }

    #[test]
    fn test_and_gate_truth_table() {
        let (types, kinds, mut graph) = fixture();
        let a = add(&mut graph, &kinds, BOOL_SOURCE);
        let b = add(&mut graph, &kinds, BOOL_SOURCE);
        let gate = add(&mut graph, &kinds, AND_GATE);

        // Unconnected inputs read as false
        run_update_pass(&mut graph, &kinds, &types).unwrap();
        assert_eq!(condition_of(&graph, gate).map(|c| c.value), Some(false));

        let gate_node = graph.node(gate).unwrap();
        let (in_a, in_b) = (gate_node.inputs[0].id, gate_node.inputs[1].id);
        let out_a = graph.node(a).unwrap().outputs[0].id;
        let out_b = graph.node(b).unwrap().outputs[0].id;
        graph.try_connect(out_a, in_a, &types).unwrap();
        graph.try_connect(out_b, in_b, &types).unwrap();

        for (va, vb) in [(true, true), (true, false), (false, true), (false, false)] {
            set_bool(&mut graph, a, va, &types).unwrap();
            set_bool(&mut graph, b, vb, &types).unwrap();
            run_update_pass(&mut graph, &kinds, &types).unwrap();
            assert_eq!(condition_of(&graph, gate).map(|c| c.value), Some(va && vb));
        }
    }

    #[test]
    fn test_set_bool_rejects_other_kinds() {
        let (types, kinds, mut graph) = fixture();
        let gate = add(&mut graph, &kinds, AND_GATE);
        assert!(matches!(
            set_bool(&mut graph, gate, true, &types),
            Err(GraphError::UnknownNodeKind(_))
        ));
    }

    #[test]
    fn test_example_passes_floats_through() {
        let (types, mut kinds, mut graph) = fixture();
        // Data-only source whose value is set by hand
        kinds
            .register(Arc::new(
                NodeTemplate::new("float_source", "Float").with_port(PortSpec::output("Out", FLOAT)),
            ))
            .unwrap();
        let source = add(&mut graph, &kinds, "float_source");
        let example = add(&mut graph, &kinds, EXAMPLE);
        let out = graph.node(source).unwrap().outputs[0].id;
        let input = graph.node(example).unwrap().inputs[0].id;
        graph.try_connect(out, input, &types).unwrap();
        graph.port_mut(out).unwrap().value::<FloatValue>(&types).unwrap().value = 4.5;

        run_update_pass(&mut graph, &kinds, &types).unwrap();
        let example_out = graph.node(example).unwrap().outputs[0].id;
        assert_eq!(
            graph.port(example_out).unwrap().cached_value::<FloatValue>(),
            Some(&FloatValue { value: 4.5 })
        );
    }
}
