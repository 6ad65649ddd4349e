// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes, their connections and nested sub-graphs.

use crate::error::{GraphError, Result};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortDirection, PortId};
use crate::types::TypeRegistry;
use egui::Vec2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// Unique identifier for a graph (canvas)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node graph.
///
/// Nodes are kept in insertion order for deterministic iteration and drawing.
/// Sub-graphs are owned by their parent; the parent link on a child is only an
/// ID used to chain coordinate transforms.
#[derive(Debug)]
pub struct Graph {
    /// Graph ID
    pub id: GraphId,
    /// Graph name
    pub name: String,
    nodes: IndexMap<NodeId, Node>,
    port_owners: HashMap<PortId, NodeId>,
    parent: Option<GraphId>,
    children: Vec<Graph>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(GraphId::new(), name)
    }

    /// Create a graph with a known ID (snapshot loading)
    pub fn with_id(id: GraphId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            nodes: IndexMap::new(),
            port_owners: HashMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Add a detached node to the graph
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId> {
        if node.graph().is_some() || self.nodes.contains_key(&node.id) {
            return Err(GraphError::AlreadyInGraph(node.id));
        }
        let id = node.id;
        for port in node.ports_mut() {
            port.node = id;
            self.port_owners.insert(port.id, id);
        }
        node.set_graph(Some(self.id));
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Append a port to a node that is already in the graph
    pub fn add_port(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        direction: PortDirection,
    ) -> Result<PortId> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let port_id = node.add_port(name, type_tag, direction);
        self.port_owners.insert(port_id, node_id);
        Ok(port_id)
    }

    /// Remove a node after severing every connection touching its ports.
    ///
    /// Either the node is fully removed with no peer left referencing it, or
    /// the graph is left untouched.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;

        let links: Vec<(PortId, PortId)> = node
            .ports()
            .flat_map(|port| port.connections().map(move |peer| (port.id, peer)))
            .collect();

        // Every peer has to resolve before anything is mutated
        for &(_, peer) in &links {
            if self.port(peer).is_none() {
                tracing::error!(?node_id, ?peer, "dangling connection on node removal");
                return Err(GraphError::PortNotFound(peer));
            }
        }

        for &(own, peer) in &links {
            if let Some(peer_port) = self.port_mut(peer) {
                peer_port.detach(own);
            }
        }

        let mut node = self
            .nodes
            .shift_remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        for port in node.ports_mut() {
            port.take_connections();
            self.port_owners.remove(&port.id);
        }
        node.set_graph(None);

        tracing::debug!(?node_id, severed = links.len(), "removed node");
        Ok(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID.
    ///
    /// Ports added through the returned node are not indexed; use
    /// [`Graph::add_port`] instead.
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Whether the node belongs to this graph
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all nodes mutably
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node owning a port
    pub fn port_owner(&self, port_id: PortId) -> Option<NodeId> {
        self.port_owners.get(&port_id).copied()
    }

    /// Get a port by ID
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        let owner = self.port_owner(port_id)?;
        self.nodes.get(&owner)?.port(port_id)
    }

    /// Get a mutable port by ID
    pub fn port_mut(&mut self, port_id: PortId) -> Option<&mut Port> {
        let owner = self.port_owner(port_id)?;
        self.nodes.get_mut(&owner)?.port_mut(port_id)
    }

    /// Validate a prospective connection from `output` to `input`.
    ///
    /// Rejections are reported in this order: missing endpoint, wrong
    /// direction, same node, already connected, type rules, cycle.
    pub fn check_connection(
        &self,
        output: PortId,
        input: PortId,
        types: &TypeRegistry,
    ) -> Result<()> {
        let out_port = self.port(output).ok_or(GraphError::PortNotFound(output))?;
        let in_port = self.port(input).ok_or(GraphError::PortNotFound(input))?;

        if !out_port.is_output() || !in_port.is_input() {
            return Err(GraphError::WrongDirection);
        }
        if out_port.node == in_port.node {
            return Err(GraphError::SameNode);
        }
        if in_port.is_connected_to(output) {
            return Err(GraphError::AlreadyConnected);
        }

        types.check_compatible(&out_port.type_tag, &in_port.type_tag)?;

        // The input's node would come to depend on the output's node, so the
        // output's node must not already depend on the input's node.
        if self.is_ancestor_of(in_port.node, out_port.node) {
            return Err(GraphError::WouldCreateCycle);
        }
        Ok(())
    }

    /// Whether `output` may be connected to `input`
    pub fn can_connect(&self, output: PortId, input: PortId, types: &TypeRegistry) -> bool {
        self.check_connection(output, input, types).is_ok()
    }

    /// Link both halves of a connection without validating it.
    ///
    /// Returns `false` if either port is missing. Prefer [`Graph::try_connect`].
    pub fn apply_connection(&mut self, output: PortId, input: PortId) -> bool {
        if self.port(output).is_none() || self.port(input).is_none() {
            return false;
        }
        if let Some(port) = self.port_mut(output) {
            port.attach(input);
        }
        if let Some(port) = self.port_mut(input) {
            port.attach(output);
        }
        true
    }

    /// Validate and apply a connection in one step
    pub fn try_connect(
        &mut self,
        output: PortId,
        input: PortId,
        types: &TypeRegistry,
    ) -> Result<()> {
        if let Err(err) = self.check_connection(output, input, types) {
            tracing::debug!(?output, ?input, %err, "connection rejected");
            return Err(err);
        }
        self.apply_connection(output, input);
        tracing::debug!(?output, ?input, "connected");
        Ok(())
    }

    /// Remove both halves of a connection; returns whether anything was removed
    pub fn disconnect(&mut self, output: PortId, input: PortId) -> bool {
        let removed_out = self
            .port_mut(output)
            .map(|port| port.detach(input))
            .unwrap_or(false);
        let removed_in = self
            .port_mut(input)
            .map(|port| port.detach(output))
            .unwrap_or(false);
        if removed_out || removed_in {
            tracing::debug!(?output, ?input, "disconnected");
        }
        removed_out || removed_in
    }

    /// Sever every connection of a port, returning the former peers
    pub fn disconnect_port(&mut self, port_id: PortId) -> Vec<PortId> {
        let peers = self
            .port_mut(port_id)
            .map(Port::take_connections)
            .unwrap_or_default();
        for peer in &peers {
            if let Some(port) = self.port_mut(*peer) {
                port.detach(port_id);
            }
        }
        peers
    }

    /// All connections as `(output, input)` pairs
    pub fn connections(&self) -> impl Iterator<Item = (PortId, PortId)> + '_ {
        self.nodes.values().flat_map(|node| {
            node.outputs
                .iter()
                .flat_map(|port| port.connections().map(move |input| (port.id, input)))
        })
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections().count()
    }

    /// The output an input reads from during evaluation: its first connection
    pub fn first_source(&self, input: PortId) -> Option<PortId> {
        self.port(input)
            .filter(|port| port.is_input())
            .and_then(Port::first_connection)
    }

    /// Nodes `node_id` depends on, directly or transitively, nearest first
    pub fn ancestors(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([node_id]);

        while let Some(current) = queue.pop_front() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for input in &node.inputs {
                for source in input.connections() {
                    if let Some(owner) = self.port_owner(source) {
                        if owner != node_id && seen.insert(owner) {
                            order.push(owner);
                            queue.push_back(owner);
                        }
                    }
                }
            }
        }
        order
    }

    /// Whether `ancestor` feeds `node_id` through any chain of connections
    pub fn is_ancestor_of(&self, ancestor: NodeId, node_id: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([node_id]);

        while let Some(current) = queue.pop_front() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for input in &node.inputs {
                for source in input.connections() {
                    let Some(owner) = self.port_owner(source) else {
                        continue;
                    };
                    if owner == ancestor {
                        return true;
                    }
                    if seen.insert(owner) {
                        queue.push_back(owner);
                    }
                }
            }
        }
        false
    }

    /// Whether `node_id` is fed by `ancestor` through any chain of connections
    pub fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        self.is_ancestor_of(ancestor, node_id)
    }

    /// Get nodes in topological order (sources first)
    pub fn topological_order(&self) -> std::result::Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        temp_mark: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> std::result::Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            return Err(CycleError);
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Visit every node feeding this one first
        if let Some(node) = self.nodes.get(&node_id) {
            for input in &node.inputs {
                for source in input.connections() {
                    if let Some(owner) = self.port_owner(source) {
                        self.visit(owner, visited, temp_mark, order)?;
                    }
                }
            }
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }

    /// Whether every connected input source has a materialized value
    pub fn all_inputs_ready(&self, node_id: NodeId) -> bool {
        !self.has_unconnected_inputs(node_id) && !self.has_empty_input_values(node_id)
    }

    /// Whether any input of the node has no connection
    pub fn has_unconnected_inputs(&self, node_id: NodeId) -> bool {
        self.node(node_id)
            .is_some_and(|node| node.inputs.iter().any(|input| !input.is_connected()))
    }

    /// Whether any connected source of the node has no value yet
    pub fn has_empty_input_values(&self, node_id: NodeId) -> bool {
        self.node(node_id).is_some_and(|node| {
            node.inputs.iter().any(|input| {
                input
                    .connections()
                    .any(|source| self.port(source).is_some_and(|port| !port.has_value()))
            })
        })
    }

    /// Move every node by a canvas-space delta
    pub fn translate_nodes(&mut self, delta: Vec2) {
        for node in self.nodes.values_mut() {
            node.translate(delta);
        }
    }

    /// Parent graph, if nested
    pub fn parent(&self) -> Option<GraphId> {
        self.parent
    }

    /// Nest a graph below this one
    pub fn add_child(&mut self, mut child: Graph) -> GraphId {
        child.parent = Some(self.id);
        let id = child.id;
        self.children.push(child);
        id
    }

    /// Detach a direct child
    pub fn remove_child(&mut self, id: GraphId) -> Option<Graph> {
        let index = self.children.iter().position(|c| c.id == id)?;
        let mut child = self.children.remove(index);
        child.parent = None;
        Some(child)
    }

    /// Direct children in order
    pub fn children(&self) -> &[Graph] {
        &self.children
    }

    /// Direct children, mutably
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Graph> {
        self.children.iter_mut()
    }

    /// Find a graph in this subtree
    pub fn find(&self, id: GraphId) -> Option<&Graph> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Find a graph in this subtree mutably
    pub fn find_mut(&mut self, id: GraphId) -> Option<&mut Graph> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;
