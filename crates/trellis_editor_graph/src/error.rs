// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types shared across the graph core.

use crate::graph::GraphId;
use crate::node::NodeId;
use crate::port::PortId;
use serde::{Deserialize, Serialize};

/// Reason a connection attempt was turned down.
///
/// These are expected user outcomes: a rejected connection leaves the graph
/// untouched, and the reason only exists so callers and tests can observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum ConnectionRejection {
    /// One of the endpoints does not exist in the graph
    #[error("Port not found")]
    PortNotFound,

    /// The endpoints are not an output/input pair
    #[error("Connections must run from an output to an input")]
    WrongDirection,

    /// Both endpoints belong to the same node
    #[error("Cannot connect a node to itself")]
    SameNode,

    /// The pair is already linked
    #[error("Ports are already connected")]
    AlreadyConnected,

    /// A type tag of either endpoint is not registered
    #[error("Unknown type tag")]
    UnknownTypeTag,

    /// The output type is not accepted by the input
    #[error("Incompatible port types")]
    IncompatibleTypes,

    /// The new edge would close a directed cycle
    #[error("Connection would create a cycle")]
    WouldCreateCycle,
}

/// Errors raised by graph, registry and port operations
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Type tag not present in the registry
    #[error("Unknown type tag: {0}")]
    UnknownTypeTag(String),

    /// Type tag registered twice
    #[error("Type tag already registered: {0}")]
    DuplicateTypeTag(String),

    /// Requested value type differs from the port's declared type
    #[error("Type mismatch on port {port:?}: declared {declared}, requested {requested}")]
    TypeMismatch {
        /// Port whose value was requested
        port: PortId,
        /// Type tag of the port
        declared: String,
        /// Rust type that was requested
        requested: &'static str,
    },

    /// Output type is not accepted by the input
    #[error("Incompatible port types")]
    IncompatibleTypes,

    /// Connection would close a cycle
    #[error("Connection would create a cycle")]
    WouldCreateCycle,

    /// Pair is already connected
    #[error("Ports are already connected")]
    AlreadyConnected,

    /// Both endpoints are on the same node
    #[error("Cannot connect a node to itself")]
    SameNode,

    /// Connection endpoints are not an output/input pair
    #[error("Connections must run from an output to an input")]
    WrongDirection,

    /// Node is owned by a graph already
    #[error("Node {0:?} already belongs to a graph")]
    AlreadyInGraph(NodeId),

    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// Graph not found in the canvas tree
    #[error("Graph not found: {0:?}")]
    GraphNotFound(GraphId),

    /// No node kind registered under this id
    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),

    /// Node kind registered twice
    #[error("Node kind already registered: {0}")]
    DuplicateNodeKind(String),
}

impl GraphError {
    /// The connection reason code behind this error, if it is one.
    pub fn rejection(&self) -> Option<ConnectionRejection> {
        match self {
            Self::IncompatibleTypes => Some(ConnectionRejection::IncompatibleTypes),
            Self::WouldCreateCycle => Some(ConnectionRejection::WouldCreateCycle),
            Self::AlreadyConnected => Some(ConnectionRejection::AlreadyConnected),
            Self::SameNode => Some(ConnectionRejection::SameNode),
            Self::WrongDirection => Some(ConnectionRejection::WrongDirection),
            Self::PortNotFound(_) => Some(ConnectionRejection::PortNotFound),
            Self::UnknownTypeTag(_) => Some(ConnectionRejection::UnknownTypeTag),
            _ => None,
        }
    }
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
