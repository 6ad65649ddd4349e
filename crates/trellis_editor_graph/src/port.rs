// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::error::{GraphError, Result};
use crate::node::NodeId;
use crate::types::TypeRegistry;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortDirection {
    /// The direction a peer must have
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Declarative port layout entry used by node kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name
    pub name: String,
    /// Connection type tag
    pub type_tag: String,
    /// Port direction
    pub direction: PortDirection,
}

impl PortSpec {
    /// Input port spec
    pub fn input(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            direction: PortDirection::Input,
        }
    }

    /// Output port spec
    pub fn output(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            direction: PortDirection::Output,
        }
    }
}

/// A typed connection endpoint on a node.
///
/// Connections are stored on both ends: an output lists the inputs it feeds
/// and an input lists the outputs feeding it. Inputs may structurally hold
/// several connections; evaluation only reads the first one.
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Owning node
    pub node: NodeId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Connection type tag
    pub type_tag: String,
    connections: IndexSet<PortId>,
    value: Option<Box<dyn Any + Send + Sync>>,
}

impl Port {
    /// Create a new unconnected port
    pub fn new(
        node: NodeId,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        direction: PortDirection,
    ) -> Self {
        Self::with_id(PortId::new(), node, name, type_tag, direction)
    }

    /// Create a port with a known ID (snapshot loading)
    pub fn with_id(
        id: PortId,
        node: NodeId,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        direction: PortDirection,
    ) -> Self {
        Self {
            id,
            node,
            name: name.into(),
            direction,
            type_tag: type_tag.into(),
            connections: IndexSet::new(),
            value: None,
        }
    }

    /// Create a port from a layout spec
    pub fn from_spec(node: NodeId, spec: &PortSpec) -> Self {
        Self::new(node, spec.name.clone(), spec.type_tag.clone(), spec.direction)
    }

    /// Whether this is an input
    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    /// Whether this is an output
    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// Peer ports in connection order
    pub fn connections(&self) -> impl Iterator<Item = PortId> + '_ {
        self.connections.iter().copied()
    }

    /// The first peer, which is the one evaluation reads on inputs
    pub fn first_connection(&self) -> Option<PortId> {
        self.connections.first().copied()
    }

    /// Whether this port is linked to `peer`
    pub fn is_connected_to(&self, peer: PortId) -> bool {
        self.connections.contains(&peer)
    }

    /// Whether the port has any connection
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Record one half of a link
    pub(crate) fn attach(&mut self, peer: PortId) -> bool {
        self.connections.insert(peer)
    }

    /// Remove one half of a link, keeping the order of the others
    pub(crate) fn detach(&mut self, peer: PortId) -> bool {
        self.connections.shift_remove(&peer)
    }

    pub(crate) fn take_connections(&mut self) -> Vec<PortId> {
        self.connections.drain(..).collect()
    }

    /// Typed value slot, created on first access.
    ///
    /// The slot is a cache owned by the port: it persists across calls and is
    /// never recomputed here. Fails if the port's tag is unknown or its value
    /// type is not `T`.
    pub fn value<T: Any>(&mut self, types: &TypeRegistry) -> Result<&mut T> {
        let descriptor = types.lookup(&self.type_tag)?;
        let Some(value_type) = descriptor.value_type.filter(|v| v.is::<T>()) else {
            return Err(Self::mismatch::<T>(self.id, &self.type_tag));
        };

        let stale = self.value.as_ref().is_some_and(|v| !v.is::<T>());
        if stale || self.value.is_none() {
            self.value = Some(value_type.instantiate());
        }

        self.value
            .as_mut()
            .and_then(|v| v.downcast_mut::<T>())
            .ok_or_else(|| Self::mismatch::<T>(self.id, &self.type_tag))
    }

    /// Read the cached value without materializing it
    pub fn cached_value<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Whether the value slot has been materialized
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Drop the cached value so the next access recreates it
    pub fn clear_value(&mut self) {
        self.value = None;
    }

    fn mismatch<T: Any>(port: PortId, declared: &str) -> GraphError {
        GraphError::TypeMismatch {
            port,
            declared: declared.to_string(),
            requested: std::any::type_name::<T>(),
        }
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("type_tag", &self.type_tag)
            .field("connections", &self.connections)
            .field("has_value", &self.value.is_some())
            .finish()
    }
}
