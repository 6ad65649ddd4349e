// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph core for the Trellis editor.
//!
//! This crate holds everything an embeddable node editor needs apart from
//! drawing:
//! - A registry of connection types keyed by string tag
//! - Nodes with typed input/output ports and lazily created value slots
//! - Graphs that validate connections and refuse cycles
//! - View state with exact screen/view/canvas transforms and nested views
//! - An interaction state machine driven by discrete input events
//!
//! ## Architecture
//!
//! Node kinds and connection types are supplied by plugins through
//! [`NodeKindProvider`] and [`TypeProvider`] and registered once at startup.
//! A host feeds [`InputEvent`]s to an [`InteractionController`], which
//! mutates a [`Canvas`] (graph tree plus view tree). Renderers read the same
//! canvas and never mutate it.

pub mod canvas;
pub mod egui_input;
pub mod error;
pub mod evaluation;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod node;
pub mod port;
pub mod settings;
pub mod snapshot;
pub mod types;
pub mod view;

pub use canvas::{Canvas, SharedCanvas};
pub use egui_input::EguiInputAdapter;
pub use error::{ConnectionRejection, GraphError, Result};
pub use evaluation::{run_update_pass, UpdateReport};
pub use graph::{Graph, GraphId};
pub use interaction::{
    EditorKey, InputEvent, InteractionController, InteractionMode, MenuKind, NodeAction, Outcome,
    PendingMenu, PointerButton,
};
pub use node::{Node, NodeId, NodeKind, NodeKindProvider, NodeKindRegistry, NodeTemplate};
pub use port::{Port, PortDirection, PortId, PortSpec};
pub use settings::{EditorSettings, KeyBindings};
pub use snapshot::{CanvasSnapshot, GraphSnapshot, LoadReport, SnapshotError, ViewSnapshot};
pub use types::{TypeDescriptor, TypeProvider, TypeRegistry, ValueType};
pub use view::{ViewState, ViewTransform};
