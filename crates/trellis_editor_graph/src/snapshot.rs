// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plain data snapshots of graphs and views.
//!
//! Snapshots carry node placement, per-node port lists and per-port
//! connection lists. Restoring one re-validates every connection against the
//! current type registry; connections that no longer pass are dropped and
//! reported instead of failing the load.

use crate::canvas::Canvas;
use crate::error::{ConnectionRejection, GraphError};
use crate::graph::{Graph, GraphId};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortDirection, PortId};
use crate::settings::EditorSettings;
use crate::types::TypeRegistry;
use crate::view::ViewState;
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Errors from reading or writing snapshots
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// File access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON text could not be parsed
    #[error("Invalid RON: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON serialization failed
    #[error("RON serialization failed: {0}")]
    RonWrite(#[from] ron::Error),

    /// JSON parsing or serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by a newer version
    #[error("Snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// The same node or port ID appears twice
    #[error("Duplicate ID in snapshot: {0}")]
    DuplicateId(String),

    /// Rebuilding the graph failed
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// On-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFormat {
    /// Rusty Object Notation
    #[default]
    Ron,
    /// JSON
    Json,
}

impl SnapshotFormat {
    /// Pick the format from a file extension; anything but `.json` is RON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Ron,
        }
    }
}

/// Port data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSnapshot {
    /// Port ID
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Connection type tag
    pub type_tag: String,
    /// Direction
    pub direction: PortDirection,
    /// Peer ports in connection order
    #[serde(default)]
    pub connections: Vec<PortId>,
}

impl PortSnapshot {
    fn capture(port: &Port) -> Self {
        Self {
            id: port.id,
            name: port.name.clone(),
            type_tag: port.type_tag.clone(),
            direction: port.direction,
            connections: port.connections().collect(),
        }
    }
}

/// Node data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node ID
    pub id: NodeId,
    /// Kind key
    pub kind_id: String,
    /// Display name
    pub name: String,
    /// Top-left corner in canvas space
    pub position: [f32; 2],
    /// Width and height
    pub size: [f32; 2],
    /// Inputs in order
    #[serde(default)]
    pub inputs: Vec<PortSnapshot>,
    /// Outputs in order
    #[serde(default)]
    pub outputs: Vec<PortSnapshot>,
}

impl NodeSnapshot {
    fn capture(node: &Node) -> Self {
        Self {
            id: node.id,
            kind_id: node.kind_id.clone(),
            name: node.name.clone(),
            position: node.position,
            size: node.size,
            inputs: node.inputs.iter().map(PortSnapshot::capture).collect(),
            outputs: node.outputs.iter().map(PortSnapshot::capture).collect(),
        }
    }
}

/// Graph data, nested graphs included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Graph ID
    pub id: GraphId,
    /// Graph name
    pub name: String,
    /// Nodes in draw order
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,
    /// Nested graphs
    #[serde(default)]
    pub children: Vec<GraphSnapshot>,
}

/// A connection left out while restoring
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedConnection {
    /// Graph the connection was in
    pub graph: GraphId,
    /// Output endpoint
    pub output: PortId,
    /// Input endpoint
    pub input: PortId,
    /// Why it was refused; `None` for failures outside connection validation
    pub reason: Option<ConnectionRejection>,
}

/// Summary of a restore
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Connections restored
    pub restored: usize,
    /// Connections dropped
    pub dropped: Vec<DroppedConnection>,
}

impl GraphSnapshot {
    /// Capture a graph tree
    pub fn capture(graph: &Graph) -> Self {
        Self {
            id: graph.id,
            name: graph.name.clone(),
            nodes: graph.nodes().map(NodeSnapshot::capture).collect(),
            children: graph.children().iter().map(Self::capture).collect(),
        }
    }

    /// Rebuild the graph tree, re-validating every connection
    pub fn restore(&self, types: &TypeRegistry) -> Result<(Graph, LoadReport), SnapshotError> {
        let mut report = LoadReport::default();
        let mut ports = HashSet::new();
        let graph = self.restore_into(types, &mut report, &mut ports)?;
        Ok((graph, report))
    }

    fn restore_into(
        &self,
        types: &TypeRegistry,
        report: &mut LoadReport,
        ports: &mut HashSet<PortId>,
    ) -> Result<Graph, SnapshotError> {
        let mut graph = Graph::with_id(self.id, self.name.clone());

        for snapshot in &self.nodes {
            let mut node = Node::with_id(
                snapshot.id,
                snapshot.kind_id.clone(),
                snapshot.name.clone(),
                Pos2::new(snapshot.position[0], snapshot.position[1]),
            )
            .with_size(snapshot.size[0], snapshot.size[1]);
            for port in snapshot.inputs.iter().chain(&snapshot.outputs) {
                if !ports.insert(port.id) {
                    return Err(SnapshotError::DuplicateId(format!("port {:?}", port.id)));
                }
                node.push_port(Port::with_id(
                    port.id,
                    node.id,
                    port.name.clone(),
                    port.type_tag.clone(),
                    port.direction,
                ));
            }
            if graph.contains_node(node.id) {
                return Err(SnapshotError::DuplicateId(format!("node {:?}", node.id)));
            }
            graph.add_node(node)?;
        }

        // Input lists decide connection order, since evaluation reads the
        // first connection of an input.
        let mut pairs: Vec<(PortId, PortId)> = Vec::new();
        for port in self.nodes.iter().flat_map(|n| &n.inputs) {
            pairs.extend(port.connections.iter().map(|&output| (output, port.id)));
        }
        for port in self.nodes.iter().flat_map(|n| &n.outputs) {
            for &input in &port.connections {
                if !pairs.contains(&(port.id, input)) {
                    pairs.push((port.id, input));
                }
            }
        }

        for (output, input) in pairs {
            match graph.try_connect(output, input, types) {
                Ok(()) => report.restored += 1,
                Err(err) => {
                    tracing::warn!(graph = %self.name, ?output, ?input, %err, "dropped connection on load");
                    report.dropped.push(DroppedConnection {
                        graph: self.id,
                        output,
                        input,
                        reason: err.rejection(),
                    });
                }
            }
        }

        for child in &self.children {
            let child = child.restore_into(types, report, ports)?;
            graph.add_child(child);
        }
        Ok(graph)
    }
}

/// View data, nested views included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    /// Bound graph
    pub graph: GraphId,
    /// View region
    pub canvas_rect: Rect,
    /// Accumulated pan
    pub pan_offset: Vec2,
    /// Zoom factor
    pub zoom: f32,
    /// Visibility
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Selected node
    #[serde(default)]
    pub active_node: Option<NodeId>,
    /// Nested views
    #[serde(default)]
    pub children: Vec<ViewSnapshot>,
}

fn default_visible() -> bool {
    true
}

impl ViewSnapshot {
    /// Capture the persistent part of a view tree
    pub fn capture(view: &ViewState) -> Self {
        Self {
            graph: view.graph,
            canvas_rect: view.canvas_rect,
            pan_offset: view.pan_offset,
            zoom: view.zoom(),
            visible: view.visible,
            active_node: view.active_node,
            children: view.children.iter().map(Self::capture).collect(),
        }
    }

    /// Rebuild a view tree; the zoom is clamped to the settings' range
    pub fn restore(&self, settings: &EditorSettings) -> ViewState {
        let mut view = ViewState::new(self.graph, self.canvas_rect, settings);
        view.pan_offset = self.pan_offset;
        view.set_zoom(self.zoom);
        view.visible = self.visible;
        view.active_node = self.active_node;
        view.children = self.children.iter().map(|c| c.restore(settings)).collect();
        view.refresh_transforms();
        view
    }
}

/// A saved canvas: graph tree plus optional view tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    /// Format version
    pub version: u32,
    /// Graph tree
    pub graph: GraphSnapshot,
    /// View tree
    #[serde(default)]
    pub view: Option<ViewSnapshot>,
}

impl CanvasSnapshot {
    /// Snapshot a graph without view state
    pub fn of_graph(graph: &Graph) -> Self {
        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            graph: GraphSnapshot::capture(graph),
            view: None,
        }
    }

    /// Snapshot a canvas
    pub fn capture(canvas: &Canvas) -> Self {
        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            graph: GraphSnapshot::capture(&canvas.graph),
            view: Some(ViewSnapshot::capture(&canvas.view)),
        }
    }

    /// Rebuild a canvas.
    ///
    /// Without a stored view, one is created over `default_rect`. Views whose
    /// graph no longer exists are removed and selections of missing nodes are
    /// cleared.
    pub fn restore(
        &self,
        types: &TypeRegistry,
        settings: &EditorSettings,
        default_rect: Rect,
    ) -> Result<(Canvas, LoadReport), SnapshotError> {
        let (graph, report) = self.graph.restore(types)?;
        let view = match &self.view {
            Some(view) if view.graph == graph.id => {
                let mut view = view.restore(settings);
                prune_views(&mut view, &graph);
                view
            }
            Some(_) => {
                tracing::warn!("stored view is bound to another graph, using a fresh view");
                ViewState::for_graph(&graph, default_rect, default_rect, settings)
            }
            None => ViewState::for_graph(&graph, default_rect, default_rect, settings),
        };
        Ok((Canvas::from_parts(graph, view), report))
    }

    /// Parse RON, checking the version
    pub fn from_ron(s: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = ron::from_str(s)?;
        snapshot.check_version()
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, SnapshotError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Parse JSON, checking the version
    pub fn from_json(s: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(s)?;
        snapshot.check_version()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a file; `.json` files are JSON, everything else RON
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        match SnapshotFormat::from_path(path) {
            SnapshotFormat::Ron => Self::from_ron(&content),
            SnapshotFormat::Json => Self::from_json(&content),
        }
    }

    /// Save to a file; `.json` files are JSON, everything else RON
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let content = match SnapshotFormat::from_path(path) {
            SnapshotFormat::Ron => self.to_ron()?,
            SnapshotFormat::Json => self.to_json()?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    fn check_version(self) -> Result<Self, SnapshotError> {
        if self.version > SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        Ok(self)
    }
}

fn prune_views(view: &mut ViewState, root: &Graph) {
    if let Some(graph) = root.find(view.graph) {
        view.forget_missing_nodes(graph);
    }
    view.children.retain(|child| root.find(child.graph).is_some());
    for child in &mut view.children {
        prune_views(child, root);
    }
}
