// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions and the node kind registry.

use crate::error::{GraphError, Result};
use crate::graph::{Graph, GraphId};
use crate::port::{Port, PortDirection, PortId, PortSpec};
use crate::types::TypeRegistry;
use egui::{Pos2, Rect, Vec2};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Default node size in canvas units
pub const DEFAULT_NODE_SIZE: [f32; 2] = [100.0, 50.0];

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node instance on a canvas
#[derive(Debug)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Stable kind key used by the factory
    pub kind_id: String,
    /// Display name
    pub name: String,
    /// Top-left corner in canvas space
    pub position: [f32; 2],
    /// Width and height in canvas units
    pub size: [f32; 2],
    /// Input ports
    pub inputs: Vec<Port>,
    /// Output ports
    pub outputs: Vec<Port>,
    graph: Option<GraphId>,
}

impl Node {
    /// Create a node without ports
    pub fn new(kind_id: impl Into<String>, name: impl Into<String>, position: Pos2) -> Self {
        Self::with_id(NodeId::new(), kind_id, name, position)
    }

    /// Create a node with a known ID (snapshot loading)
    pub fn with_id(
        id: NodeId,
        kind_id: impl Into<String>,
        name: impl Into<String>,
        position: Pos2,
    ) -> Self {
        Self {
            id,
            kind_id: kind_id.into(),
            name: name.into(),
            position: [position.x, position.y],
            size: DEFAULT_NODE_SIZE,
            inputs: Vec::new(),
            outputs: Vec::new(),
            graph: None,
        }
    }

    /// Set the size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = [width, height];
        self
    }

    /// Append a port, returning its ID
    pub fn add_port(
        &mut self,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        direction: PortDirection,
    ) -> PortId {
        let port = Port::new(self.id, name, type_tag, direction);
        self.push_port(port)
    }

    /// Append an input port
    pub fn add_input(&mut self, name: impl Into<String>, type_tag: impl Into<String>) -> PortId {
        self.add_port(name, type_tag, PortDirection::Input)
    }

    /// Append an output port
    pub fn add_output(&mut self, name: impl Into<String>, type_tag: impl Into<String>) -> PortId {
        self.add_port(name, type_tag, PortDirection::Output)
    }

    /// Append an already built port; its owner is rewritten to this node
    pub fn push_port(&mut self, mut port: Port) -> PortId {
        port.node = self.id;
        let id = port.id;
        match port.direction {
            PortDirection::Input => self.inputs.push(port),
            PortDirection::Output => self.outputs.push(port),
        }
        id
    }

    /// Graph this node belongs to
    pub fn graph(&self) -> Option<GraphId> {
        self.graph
    }

    pub(crate) fn set_graph(&mut self, graph: Option<GraphId>) {
        self.graph = graph;
    }

    /// Placement rectangle in canvas space
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(
            Pos2::new(self.position[0], self.position[1]),
            Vec2::new(self.size[0], self.size[1]),
        )
    }

    /// Move the node by a canvas-space delta
    pub fn translate(&mut self, delta: Vec2) {
        self.position[0] += delta.x;
        self.position[1] += delta.y;
    }

    /// Get an input port by index
    pub fn input(&self, index: usize) -> Option<&Port> {
        self.inputs.get(index)
    }

    /// Get an output port by index
    pub fn output(&self, index: usize) -> Option<&Port> {
        self.outputs.get(index)
    }

    /// Get a port by ID
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        self.inputs
            .iter()
            .find(|p| p.id == port_id)
            .or_else(|| self.outputs.iter().find(|p| p.id == port_id))
    }

    /// Get a mutable port by ID
    pub fn port_mut(&mut self, port_id: PortId) -> Option<&mut Port> {
        if let Some(index) = self.inputs.iter().position(|p| p.id == port_id) {
            return self.inputs.get_mut(index);
        }
        self.outputs.iter_mut().find(|p| p.id == port_id)
    }

    /// All ports, inputs first
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// All ports, inputs first
    pub fn ports_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.inputs.iter_mut().chain(self.outputs.iter_mut())
    }
}

/// Capability interface implemented by every node kind.
///
/// A kind fixes the initial port layout of its nodes and may react once per
/// interaction pass through [`NodeKind::update`].
pub trait NodeKind: Send + Sync {
    /// Stable kind key
    fn id(&self) -> &str;

    /// Display name for menus and new nodes
    fn name(&self) -> &str;

    /// Menu path, e.g. `"Conditional Logic"`
    fn category(&self) -> &str {
        ""
    }

    /// Initial node size in canvas units
    fn size(&self) -> [f32; 2] {
        DEFAULT_NODE_SIZE
    }

    /// Initial port layout
    fn ports(&self) -> Vec<PortSpec>;

    /// Per-pass update hook
    fn update(&self, _node: NodeId, _graph: &mut Graph, _types: &TypeRegistry) -> Result<()> {
        Ok(())
    }

    /// Called after a node of this kind was removed from its graph
    fn on_delete(&self, _node: &Node) {}
}

/// Data-only node kind with a fixed layout and no update behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Unique kind identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Menu category
    pub category: String,
    /// Description
    pub description: String,
    /// Initial size
    pub size: [f32; 2],
    /// Port layout
    pub ports: Vec<PortSpec>,
}

impl NodeTemplate {
    /// Create an empty template
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            description: String::new(),
            size: DEFAULT_NODE_SIZE,
            ports: Vec::new(),
        }
    }

    /// Add a port to the layout
    pub fn with_port(mut self, spec: PortSpec) -> Self {
        self.ports.push(spec);
        self
    }
}

impl NodeKind for NodeTemplate {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn size(&self) -> [f32; 2] {
        self.size
    }

    fn ports(&self) -> Vec<PortSpec> {
        self.ports.clone()
    }
}

/// Supplies node kinds at startup
pub trait NodeKindProvider {
    /// Kinds to register
    fn node_kinds(&self) -> Vec<Arc<dyn NodeKind>>;
}

/// Registry of node kinds keyed by kind ID
#[derive(Default, Clone)]
pub struct NodeKindRegistry {
    kinds: IndexMap<String, Arc<dyn NodeKind>>,
}

impl NodeKindRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from providers
    pub fn from_providers(providers: &[&dyn NodeKindProvider]) -> Result<Self> {
        let mut registry = Self::new();
        for provider in providers {
            for kind in provider.node_kinds() {
                registry.register(kind)?;
            }
        }
        Ok(registry)
    }

    /// Register a node kind
    pub fn register(&mut self, kind: Arc<dyn NodeKind>) -> Result<()> {
        let id = kind.id().to_string();
        if self.kinds.contains_key(&id) {
            return Err(GraphError::DuplicateNodeKind(id));
        }
        self.kinds.insert(id, kind);
        Ok(())
    }

    /// Get a node kind by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn NodeKind>> {
        self.kinds.get(id)
    }

    /// Get a node kind by ID or fail
    pub fn lookup(&self, id: &str) -> Result<&Arc<dyn NodeKind>> {
        self.get(id)
            .ok_or_else(|| GraphError::UnknownNodeKind(id.to_string()))
    }

    /// All kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &Arc<dyn NodeKind>> {
        self.kinds.values()
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kind is registered
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Create a detached node of the given kind at a canvas position
    pub fn create_node(&self, kind_id: &str, position: Pos2) -> Result<Node> {
        let kind = self.lookup(kind_id)?;
        let [width, height] = kind.size();
        let mut node = Node::new(kind.id(), kind.name(), position).with_size(width, height);
        for spec in kind.ports() {
            node.push_port(Port::from_spec(node.id, &spec));
        }
        Ok(node)
    }

    /// Kinds with at least one input that accepts `output_tag`
    pub fn candidates_for(&self, output_tag: &str, types: &TypeRegistry) -> Vec<String> {
        self.kinds
            .values()
            .filter(|kind| {
                kind.ports().iter().any(|spec| {
                    spec.direction == PortDirection::Input
                        && types.compatible(output_tag, &spec.type_tag)
                })
            })
            .map(|kind| kind.id().to_string())
            .collect()
    }
}

impl std::fmt::Debug for NodeKindRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds.keys()).finish()
    }
}
