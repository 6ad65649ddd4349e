// SPDX-License-Identifier: MIT OR Apache-2.0
//! Input state machine for graph views.
//!
//! Hosts translate their native input into [`InputEvent`]s and feed them to
//! [`InteractionController::handle`]. Menus are not shown by the core: when
//! an interaction needs a choice the controller returns [`Outcome::Menu`] and
//! the host answers with [`InteractionController::create_from_menu`],
//! [`InteractionController::apply_node_action`] or
//! [`InteractionController::dismiss_menu`].

use crate::canvas::Canvas;
use crate::error::{ConnectionRejection, GraphError, Result};
use crate::graph::Graph;
use crate::layout;
use crate::node::{NodeId, NodeKindRegistry};
use crate::port::PortId;
use crate::settings::EditorSettings;
use crate::types::{TypeProvider, TypeRegistry};
use crate::view::ViewState;
use egui::Pos2;
use serde::{Deserialize, Serialize};

/// Pointer buttons the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    /// Left button: select, drag, wire, pan
    Primary,
    /// Right button: context menus
    Secondary,
    /// Middle button: pan
    Middle,
}

/// Logical keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditorKey {
    /// Held to show the navigation cue
    Navigate,
    /// Snap the active node to the grid
    Snap,
}

/// A discrete input event in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Button pressed
    PointerDown {
        /// Screen position
        pos: Pos2,
        /// Button
        button: PointerButton,
    },
    /// Button released
    PointerUp {
        /// Screen position
        pos: Pos2,
        /// Button
        button: PointerButton,
    },
    /// Pointer moved
    PointerMove {
        /// Screen position
        pos: Pos2,
    },
    /// Wheel scrolled; positive values zoom in
    Scroll {
        /// Screen position
        pos: Pos2,
        /// Scroll amount in wheel units
        delta: f32,
    },
    /// Key pressed
    KeyDown {
        /// Key
        key: EditorKey,
        /// Pointer position when the key went down
        pos: Pos2,
    },
    /// Key released
    KeyUp {
        /// Key
        key: EditorKey,
        /// Pointer position when the key went up
        pos: Pos2,
    },
    /// The host window lost focus; every interaction is cancelled
    FocusLost,
    /// Explicit cancel, e.g. Escape; same effect as losing focus
    Cancel,
}

impl InputEvent {
    /// Screen position carried by the event
    pub fn position(&self) -> Option<Pos2> {
        match *self {
            Self::PointerDown { pos, .. }
            | Self::PointerUp { pos, .. }
            | Self::PointerMove { pos }
            | Self::Scroll { pos, .. }
            | Self::KeyDown { pos, .. }
            | Self::KeyUp { pos, .. } => Some(pos),
            Self::FocusLost | Self::Cancel => None,
        }
    }
}

/// Interaction state of a view
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    /// Nothing in progress
    #[default]
    Idle,
    /// Pointer moves translate the canvas
    PanningCanvas,
    /// Pointer moves translate one node
    DraggingNode {
        /// Node being dragged
        node: NodeId,
    },
    /// A wire is being pulled from an output
    DrawingConnection {
        /// Pending output endpoint
        output: PortId,
        /// Screen position where the wire was picked up
        origin: Pos2,
    },
    /// Navigation cue shown while the key is held
    Navigating,
}

impl InteractionMode {
    /// Whether the view owning this mode receives all pointer events
    pub fn captures_pointer(&self) -> bool {
        matches!(
            self,
            Self::PanningCanvas | Self::DraggingNode { .. } | Self::DrawingConnection { .. }
        )
    }

    /// The output a wire is being drawn from
    pub fn pending_connection(&self) -> Option<PortId> {
        match self {
            Self::DrawingConnection { output, .. } => Some(*output),
            _ => None,
        }
    }
}

/// Actions offered on a node's context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeAction {
    /// Remove the node and its connections
    Delete,
    /// Create a fresh node of the same kind and start dragging it
    Duplicate,
}

/// What a pending menu is about
#[derive(Debug, Clone, PartialEq)]
pub enum MenuKind {
    /// Right click on empty canvas: every registered kind
    Canvas {
        /// Kind IDs
        kinds: Vec<String>,
    },
    /// Wire released on empty canvas: kinds that can take the wire
    Connect {
        /// Output the wire came from
        output: PortId,
        /// Screen position where the wire was picked up
        origin: Pos2,
        /// Kind IDs with a compatible input
        candidates: Vec<String>,
    },
    /// Right click on a node
    Node {
        /// Clicked node
        node: NodeId,
        /// Available actions
        actions: Vec<NodeAction>,
    },
}

/// A menu the host should present
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMenu {
    /// Menu contents
    pub kind: MenuKind,
    /// Where the menu was requested, in screen space
    pub screen_pos: Pos2,
    /// The same position in the view's canvas space
    pub canvas_pos: Pos2,
}

impl PendingMenu {
    /// Entry labels for display
    pub fn entries(&self) -> Vec<String> {
        match &self.kind {
            MenuKind::Canvas { kinds } => kinds.clone(),
            MenuKind::Connect { candidates, .. } => candidates.clone(),
            MenuKind::Node { actions, .. } => actions.iter().map(|a| format!("{a:?}")).collect(),
        }
    }
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing happened
    Ignored,
    /// State changed without anything more specific to report
    Handled,
    /// A node became active
    Selected(NodeId),
    /// A connection was made
    Connected {
        /// Output endpoint
        output: PortId,
        /// Input endpoint
        input: PortId,
    },
    /// A connection attempt was refused; the graph is unchanged
    Rejected(ConnectionRejection),
    /// A wire was pulled off an input and is now being drawn
    Detached {
        /// Output the wire stays attached to
        output: PortId,
        /// Input it was pulled from
        input: PortId,
    },
    /// The host should present a menu
    Menu(PendingMenu),
    /// A node was added
    NodeCreated {
        /// New node
        node: NodeId,
        /// Input that was auto-connected to the pending wire
        connected_input: Option<PortId>,
    },
    /// A node was removed
    NodeDeleted(NodeId),
}

/// Drives [`ViewState`]s from input events
#[derive(Debug)]
pub struct InteractionController {
    settings: EditorSettings,
    types: TypeRegistry,
    kinds: NodeKindRegistry,
}

impl InteractionController {
    /// Create a controller over the given registries
    pub fn new(settings: EditorSettings, types: TypeRegistry, kinds: NodeKindRegistry) -> Self {
        Self {
            settings,
            types,
            kinds,
        }
    }

    /// Settings in use
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Type registry in use
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Node kind registry in use
    pub fn kinds(&self) -> &NodeKindRegistry {
        &self.kinds
    }

    /// Re-register every type from providers; the old registry is kept on failure
    pub fn rebuild_types(&mut self, providers: &[&dyn TypeProvider]) -> Result<()> {
        self.types.rebuild(providers)
    }

    /// Handle one event.
    ///
    /// Views that are panning, dragging or drawing a wire receive pointer
    /// events until the interaction ends. Otherwise the event goes to the
    /// deepest visible view under the pointer.
    pub fn handle(&self, canvas: &mut Canvas, event: &InputEvent) -> Outcome {
        let Canvas { graph, view } = canvas;
        view.refresh_transforms();

        match event {
            InputEvent::FocusLost | InputEvent::Cancel => {
                view.walk_mut(&mut |v| {
                    v.mode = InteractionMode::Idle;
                    v.drag_candidate = None;
                });
                tracing::debug!(?event, "interactions cancelled");
                return Outcome::Handled;
            }
            InputEvent::KeyUp {
                key: EditorKey::Navigate,
                ..
            } => {
                view.walk_mut(&mut |v| {
                    if v.mode == InteractionMode::Navigating {
                        v.mode = InteractionMode::Idle;
                    }
                });
                return Outcome::Handled;
            }
            InputEvent::PointerDown { .. } => view.walk_mut(&mut |v| v.pending_menu = None),
            _ => {}
        }

        let path = match view.captured_path() {
            Some(path) => path,
            None => match event.position().and_then(|pos| view.route(pos)) {
                Some(path) => path,
                None => return Outcome::Ignored,
            },
        };
        let Some(target) = view.view_at_mut(&path) else {
            return Outcome::Ignored;
        };
        let Some(target_graph) = graph.find_mut(target.graph) else {
            tracing::warn!(graph = ?target.graph, "view is bound to a missing graph");
            return Outcome::Ignored;
        };
        self.handle_in_view(target, target_graph, event)
    }

    /// Commit pending drags at the end of a host frame.
    ///
    /// A pointer-down on a node body only selects it. The drag starts here,
    /// and only if no host widget claimed the click in the meantime.
    pub fn finish_pass(&self, canvas: &mut Canvas, ui_claimed: bool) {
        canvas.view.walk_mut(&mut |view| {
            let Some(node) = view.drag_candidate.take() else {
                return;
            };
            if !ui_claimed && view.mode == InteractionMode::Idle {
                view.mode = InteractionMode::DraggingNode { node };
                tracing::debug!(?node, "drag started");
            }
        });
    }

    /// Close any pending menu without acting on it
    pub fn dismiss_menu(&self, canvas: &mut Canvas) {
        canvas.view.walk_mut(&mut |v| v.pending_menu = None);
    }

    /// Create a node of `kind_id` from a pending canvas or connection menu.
    ///
    /// From a connection menu the new node is placed next to the wire's
    /// origin node when the wire was released close to where it was picked
    /// up, and its first input that accepts the wire is connected.
    pub fn create_from_menu(&self, canvas: &mut Canvas, kind_id: &str) -> Result<Outcome> {
        let Canvas { graph, view } = canvas;
        let Some(path) = view.pending_menu_path() else {
            return Ok(Outcome::Ignored);
        };
        let Some(target) = view.view_at_mut(&path) else {
            return Ok(Outcome::Ignored);
        };
        let graph = graph
            .find_mut(target.graph)
            .ok_or(GraphError::GraphNotFound(target.graph))?;
        let Some(menu) = target.pending_menu.take() else {
            return Ok(Outcome::Ignored);
        };

        match menu.kind {
            MenuKind::Canvas { .. } => {
                let node = self.kinds.create_node(kind_id, menu.canvas_pos)?;
                let node = graph.add_node(node)?;
                target.active_node = Some(node);
                Ok(Outcome::NodeCreated {
                    node,
                    connected_input: None,
                })
            }
            MenuKind::Connect {
                output,
                origin,
                ref candidates,
            } => {
                if !candidates.iter().any(|c| c == kind_id) {
                    return Err(GraphError::UnknownNodeKind(kind_id.to_string()));
                }
                let position = self
                    .spawn_next_to_origin(graph, output, origin, menu.screen_pos)
                    .unwrap_or(menu.canvas_pos);
                let node = self.kinds.create_node(kind_id, position)?;
                let inputs: Vec<PortId> = node.inputs.iter().map(|port| port.id).collect();
                let node = graph.add_node(node)?;
                target.active_node = Some(node);

                let connected_input = inputs
                    .into_iter()
                    .find(|input| graph.can_connect(output, *input, &self.types));
                if let Some(input) = connected_input {
                    graph.apply_connection(output, input);
                }
                tracing::debug!(?node, ?connected_input, "node created from wire");
                Ok(Outcome::NodeCreated {
                    node,
                    connected_input,
                })
            }
            MenuKind::Node { .. } => {
                target.pending_menu = Some(menu);
                Ok(Outcome::Ignored)
            }
        }
    }

    /// Apply an action picked from a pending node menu
    pub fn apply_node_action(&self, canvas: &mut Canvas, action: NodeAction) -> Result<Outcome> {
        let Canvas { graph, view } = canvas;
        let Some(path) = view.pending_menu_path() else {
            return Ok(Outcome::Ignored);
        };
        let Some(target) = view.view_at_mut(&path) else {
            return Ok(Outcome::Ignored);
        };
        let graph = graph
            .find_mut(target.graph)
            .ok_or(GraphError::GraphNotFound(target.graph))?;
        let Some(menu) = target.pending_menu.take() else {
            return Ok(Outcome::Ignored);
        };
        let node = match menu.kind {
            MenuKind::Node { node, .. } => node,
            _ => {
                target.pending_menu = Some(menu);
                return Ok(Outcome::Ignored);
            }
        };

        match action {
            NodeAction::Delete => {
                self.delete_node(target, graph, node)?;
                Ok(Outcome::NodeDeleted(node))
            }
            NodeAction::Duplicate => {
                let kind_id = graph
                    .node(node)
                    .ok_or(GraphError::NodeNotFound(node))?
                    .kind_id
                    .clone();
                let copy = self.kinds.create_node(&kind_id, menu.canvas_pos)?;
                let copy = graph.add_node(copy)?;
                target.active_node = Some(copy);
                target.mode = InteractionMode::DraggingNode { node: copy };
                target.last_pointer = Some(menu.screen_pos);
                Ok(Outcome::NodeCreated {
                    node: copy,
                    connected_input: None,
                })
            }
        }
    }

    /// Remove a node, run its kind's delete hook and clear view references to it
    pub fn delete_node(&self, view: &mut ViewState, graph: &mut Graph, node: NodeId) -> Result<()> {
        let removed = graph.remove_node(node)?;
        if let Some(kind) = self.kinds.get(&removed.kind_id) {
            kind.on_delete(&removed);
        }
        view.forget_missing_nodes(graph);
        Ok(())
    }

    fn handle_in_view(&self, view: &mut ViewState, graph: &mut Graph, event: &InputEvent) -> Outcome {
        use InteractionMode as Mode;

        let mode = view.mode;
        let outcome = match (mode, *event) {
            (_, InputEvent::Scroll { delta, .. }) => {
                view.zoom_by(delta * self.settings.zoom_step);
                Outcome::Handled
            }
            (_, InputEvent::KeyDown { key: EditorKey::Snap, .. }) => self.snap_active(view, graph),
            (Mode::Idle, InputEvent::PointerDown { pos, button }) => {
                self.pointer_down(view, graph, pos, button)
            }
            (Mode::Idle, InputEvent::PointerUp { .. }) => {
                view.drag_candidate = None;
                Outcome::Ignored
            }
            (Mode::Idle, InputEvent::KeyDown { key: EditorKey::Navigate, .. }) => {
                view.mode = Mode::Navigating;
                Outcome::Handled
            }
            (Mode::Idle | Mode::Navigating, InputEvent::PointerMove { .. })
            | (Mode::Navigating, InputEvent::KeyDown { key: EditorKey::Navigate, .. }) => {
                Outcome::Ignored
            }
            (Mode::PanningCanvas, InputEvent::PointerMove { pos }) => {
                let delta = self.canvas_delta(view, pos);
                view.pan(graph, delta);
                Outcome::Handled
            }
            (Mode::DraggingNode { node }, InputEvent::PointerMove { pos }) => {
                let delta = self.canvas_delta(view, pos);
                match graph.node_mut(node) {
                    Some(node) => {
                        node.translate(delta);
                        Outcome::Handled
                    }
                    None => {
                        view.mode = Mode::Idle;
                        Outcome::Ignored
                    }
                }
            }
            (Mode::DrawingConnection { .. }, InputEvent::PointerMove { .. }) => Outcome::Handled,
            (Mode::PanningCanvas | Mode::DraggingNode { .. }, InputEvent::PointerUp { .. }) => {
                view.mode = Mode::Idle;
                Outcome::Handled
            }
            (Mode::DrawingConnection { output, origin }, InputEvent::PointerUp { pos, .. }) => {
                self.release_wire(view, graph, output, origin, pos)
            }
            (mode, event) => {
                tracing::debug!(?mode, ?event, "unhandled input, returning to idle");
                view.mode = Mode::Idle;
                view.drag_candidate = None;
                Outcome::Ignored
            }
        };

        if view.mode != mode {
            tracing::debug!(from = ?mode, to = ?view.mode, "interaction mode changed");
        }
        if let Some(pos) = event.position() {
            view.last_pointer = Some(pos);
        }
        outcome
    }

    fn pointer_down(
        &self,
        view: &mut ViewState,
        graph: &mut Graph,
        pos: Pos2,
        button: PointerButton,
    ) -> Outcome {
        let canvas_pos = view.screen_to_canvas(pos);
        let hit = view.node_at(graph, pos, &self.settings);

        match button {
            PointerButton::Secondary => {
                let kind = match hit {
                    Some(node) => {
                        view.active_node = Some(node);
                        MenuKind::Node {
                            node,
                            actions: vec![NodeAction::Delete, NodeAction::Duplicate],
                        }
                    }
                    None => MenuKind::Canvas {
                        kinds: self.kinds.kinds().map(|k| k.id().to_string()).collect(),
                    },
                };
                Self::open_menu(view, kind, pos, canvas_pos)
            }
            PointerButton::Middle => {
                if hit.is_some() {
                    return Outcome::Ignored;
                }
                view.mode = InteractionMode::PanningCanvas;
                Outcome::Handled
            }
            PointerButton::Primary => {
                view.active_node = hit;
                let Some(node) = hit.and_then(|id| graph.node(id)) else {
                    view.mode = InteractionMode::PanningCanvas;
                    return Outcome::Handled;
                };
                let node_id = node.id;

                if node.rect().contains(canvas_pos) {
                    view.drag_candidate = Some(node_id);
                    return Outcome::Selected(node_id);
                }

                // Knob margin
                if let Some(output) = layout::output_at(node, canvas_pos, &self.settings) {
                    view.mode = InteractionMode::DrawingConnection { output, origin: pos };
                    return Outcome::Handled;
                }
                let pulled = layout::input_at(node, canvas_pos, &self.settings)
                    .and_then(|input| graph.first_source(input).map(|output| (output, input)));
                if let Some((output, input)) = pulled {
                    graph.disconnect(output, input);
                    view.mode = InteractionMode::DrawingConnection { output, origin: pos };
                    return Outcome::Detached { output, input };
                }
                Outcome::Selected(node_id)
            }
        }
    }

    fn release_wire(
        &self,
        view: &mut ViewState,
        graph: &mut Graph,
        output: PortId,
        origin: Pos2,
        pos: Pos2,
    ) -> Outcome {
        view.mode = InteractionMode::Idle;
        // Released off this view or over a region it does not own
        if !view.screen_region().contains(pos)
            || view.ignore_input.iter().any(|rect| rect.contains(pos))
        {
            return Outcome::Ignored;
        }
        let Some(output_tag) = graph.port(output).map(|port| port.type_tag.clone()) else {
            return Outcome::Ignored;
        };
        let canvas_pos = view.screen_to_canvas(pos);

        // Releasing on the wire's own node opens the menu like empty canvas
        let owner = graph.port_owner(output);
        match view.node_at(graph, pos, &self.settings).filter(|&id| Some(id) != owner) {
            Some(node_id) => {
                let input = graph
                    .node(node_id)
                    .and_then(|node| layout::input_at(node, canvas_pos, &self.settings));
                let Some(input) = input else {
                    return Outcome::Handled;
                };
                match graph.try_connect(output, input, &self.types) {
                    Ok(()) => Outcome::Connected { output, input },
                    Err(err) => err.rejection().map_or(Outcome::Ignored, Outcome::Rejected),
                }
            }
            None => {
                let candidates = self.kinds.candidates_for(&output_tag, &self.types);
                Self::open_menu(
                    view,
                    MenuKind::Connect {
                        output,
                        origin,
                        candidates,
                    },
                    pos,
                    canvas_pos,
                )
            }
        }
    }

    fn open_menu(view: &mut ViewState, kind: MenuKind, screen_pos: Pos2, canvas_pos: Pos2) -> Outcome {
        let menu = PendingMenu {
            kind,
            screen_pos,
            canvas_pos,
        };
        view.pending_menu = Some(menu.clone());
        Outcome::Menu(menu)
    }

    fn snap_active(&self, view: &ViewState, graph: &mut Graph) -> Outcome {
        let Some(node) = view.active_node.and_then(|id| graph.node_mut(id)) else {
            return Outcome::Ignored;
        };
        node.position = view.snap_position(node.position, self.settings.grid_step);
        Outcome::Handled
    }

    /// Pointer travel since the last event, in the view's canvas units
    fn canvas_delta(&self, view: &ViewState, pos: Pos2) -> egui::Vec2 {
        let last = view.last_pointer.unwrap_or(pos);
        view.screen_transform().invert_vec(pos - last)
    }

    fn spawn_next_to_origin(
        &self,
        graph: &Graph,
        output: PortId,
        origin: Pos2,
        release: Pos2,
    ) -> Option<Pos2> {
        if (release - origin).length() >= self.settings.connect_origin_radius {
            return None;
        }
        let rect = graph.node(graph.port_owner(output)?)?.rect();
        Some(Pos2::new(rect.max.x + self.settings.spawn_gap, rect.min.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeTemplate;
    use crate::port::PortSpec;
    use crate::types::TypeDescriptor;
    use egui::{Color32, Rect, Vec2};
    use std::sync::Arc;

    fn controller() -> InteractionController {
        let mut types = TypeRegistry::new();
        types.register(TypeDescriptor::new("Condition", Color32::GREEN)).unwrap();
        let mut kinds = NodeKindRegistry::new();
        kinds
            .register(Arc::new(
                NodeTemplate::new("source", "Source").with_port(PortSpec::output("Out", "Condition")),
            ))
            .unwrap();
        kinds
            .register(Arc::new(
                NodeTemplate::new("gate", "Gate")
                    .with_port(PortSpec::input("A", "Condition"))
                    .with_port(PortSpec::input("B", "Condition"))
                    .with_port(PortSpec::output("Out", "Condition")),
            ))
            .unwrap();
        InteractionController::new(EditorSettings::default(), types, kinds)
    }

    /// Source at (0, 0) and gate at (300, 0); screen and canvas coincide at zoom 1
    fn setup() -> (InteractionController, Canvas, NodeId, NodeId) {
        let controller = controller();
        let mut graph = Graph::new("root");
        let source = spawn(&controller, &mut graph, "source", 0.0, 0.0);
        let gate = spawn(&controller, &mut graph, "gate", 300.0, 0.0);
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
        let canvas = Canvas::new(graph, rect, rect, controller.settings());
        (controller, canvas, source, gate)
    }

    fn spawn(controller: &InteractionController, graph: &mut Graph, kind: &str, x: f32, y: f32) -> NodeId {
        let node = controller.kinds().create_node(kind, Pos2::new(x, y)).unwrap();
        graph.add_node(node).unwrap()
    }

    fn down(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerDown {
            pos: Pos2::new(x, y),
            button: PointerButton::Primary,
        }
    }

    fn right_down(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerDown {
            pos: Pos2::new(x, y),
            button: PointerButton::Secondary,
        }
    }

    fn up(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerUp {
            pos: Pos2::new(x, y),
            button: PointerButton::Primary,
        }
    }

    fn move_to(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMove { pos: Pos2::new(x, y) }
    }

    fn output(canvas: &Canvas, node: NodeId) -> PortId {
        canvas.graph.node(node).unwrap().outputs[0].id
    }

    fn input(canvas: &Canvas, node: NodeId, index: usize) -> PortId {
        canvas.graph.node(node).unwrap().inputs[index].id
    }

    #[test]
    fn test_pan_translates_every_node() {
        let (controller, mut canvas, source, gate) = setup();
        assert_eq!(controller.handle(&mut canvas, &down(500.0, 500.0)), Outcome::Handled);
        assert_eq!(canvas.view.mode, InteractionMode::PanningCanvas);

        controller.handle(&mut canvas, &move_to(510.0, 505.0));
        assert_eq!(canvas.graph.node(source).unwrap().position, [10.0, 5.0]);
        assert_eq!(canvas.graph.node(gate).unwrap().position, [310.0, 5.0]);
        assert_eq!(canvas.view.pan_offset, Vec2::new(10.0, 5.0));

        controller.handle(&mut canvas, &up(510.0, 505.0));
        assert_eq!(canvas.view.mode, InteractionMode::Idle);
    }

    #[test]
    fn test_pan_is_scaled_by_zoom() {
        let (controller, mut canvas, source, _) = setup();
        canvas.view.set_zoom(2.0);
        controller.handle(&mut canvas, &down(700.0, 550.0));
        controller.handle(&mut canvas, &move_to(710.0, 550.0));
        assert_eq!(canvas.graph.node(source).unwrap().position, [5.0, 0.0]);
    }

    #[test]
    fn test_drag_starts_after_the_pass() {
        let (controller, mut canvas, source, gate) = setup();
        assert_eq!(controller.handle(&mut canvas, &down(50.0, 25.0)), Outcome::Selected(source));
        assert_eq!(canvas.view.mode, InteractionMode::Idle);
        assert_eq!(canvas.view.active_node, Some(source));

        controller.finish_pass(&mut canvas, false);
        assert_eq!(canvas.view.mode, InteractionMode::DraggingNode { node: source });

        controller.handle(&mut canvas, &move_to(60.0, 30.0));
        assert_eq!(canvas.graph.node(source).unwrap().position, [10.0, 5.0]);
        assert_eq!(canvas.graph.node(gate).unwrap().position, [300.0, 0.0]);

        controller.handle(&mut canvas, &up(60.0, 30.0));
        assert_eq!(canvas.view.mode, InteractionMode::Idle);
    }

    #[test]
    fn test_claimed_click_does_not_drag() {
        let (controller, mut canvas, source, _) = setup();
        controller.handle(&mut canvas, &down(50.0, 25.0));
        controller.finish_pass(&mut canvas, true);
        assert_eq!(canvas.view.mode, InteractionMode::Idle);

        controller.handle(&mut canvas, &move_to(80.0, 40.0));
        assert_eq!(canvas.graph.node(source).unwrap().position, [0.0, 0.0]);

        // Released before the pass ended
        controller.handle(&mut canvas, &down(50.0, 25.0));
        controller.handle(&mut canvas, &up(50.0, 25.0));
        controller.finish_pass(&mut canvas, false);
        assert_eq!(canvas.view.mode, InteractionMode::Idle);
    }

    #[test]
    fn test_draw_and_connect() {
        let (controller, mut canvas, source, gate) = setup();
        let out = output(&canvas, source);
        let a = input(&canvas, gate, 0);

        assert_eq!(controller.handle(&mut canvas, &down(109.0, 30.0)), Outcome::Handled);
        assert_eq!(canvas.view.mode.pending_connection(), Some(out));
        controller.handle(&mut canvas, &move_to(200.0, 30.0));
        assert_eq!(
            controller.handle(&mut canvas, &up(291.0, 30.0)),
            Outcome::Connected { output: out, input: a }
        );
        assert_eq!(canvas.view.mode, InteractionMode::Idle);

        controller.handle(&mut canvas, &down(109.0, 30.0));
        assert_eq!(
            controller.handle(&mut canvas, &up(291.0, 30.0)),
            Outcome::Rejected(ConnectionRejection::AlreadyConnected)
        );
        assert_eq!(canvas.graph.connection_count(), 1);
    }

    #[test]
    fn test_cycle_is_rejected_without_mutation() {
        let (controller, mut canvas, _, gate) = setup();
        let gate2 = spawn(&controller, &mut canvas.graph, "gate", 300.0, 200.0);

        controller.handle(&mut canvas, &down(409.0, 30.0));
        assert!(matches!(
            controller.handle(&mut canvas, &up(291.0, 230.0)),
            Outcome::Connected { .. }
        ));

        controller.handle(&mut canvas, &down(409.0, 230.0));
        assert_eq!(
            controller.handle(&mut canvas, &up(291.0, 50.0)),
            Outcome::Rejected(ConnectionRejection::WouldCreateCycle)
        );
        assert!(!canvas.graph.port(input(&canvas, gate, 1)).unwrap().is_connected());
        assert_eq!(canvas.graph.port(output(&canvas, gate2)).unwrap().connection_count(), 0);
    }

    #[test]
    fn test_pull_wire_and_spawn_from_menu() {
        let (controller, mut canvas, source, gate) = setup();
        let out = output(&canvas, source);
        let a = input(&canvas, gate, 0);
        controller.handle(&mut canvas, &down(109.0, 30.0));
        controller.handle(&mut canvas, &up(291.0, 30.0));

        assert_eq!(
            controller.handle(&mut canvas, &down(291.0, 30.0)),
            Outcome::Detached { output: out, input: a }
        );
        assert_eq!(canvas.graph.connection_count(), 0);
        assert_eq!(canvas.view.mode.pending_connection(), Some(out));

        let Outcome::Menu(menu) = controller.handle(&mut canvas, &up(600.0, 400.0)) else {
            panic!("expected a menu");
        };
        assert_eq!(menu.entries(), vec!["gate".to_string()]);
        assert_eq!(canvas.view.mode, InteractionMode::Idle);

        let Outcome::NodeCreated { node, connected_input } =
            controller.create_from_menu(&mut canvas, "gate").unwrap()
        else {
            panic!("expected a node");
        };
        assert_eq!(canvas.graph.node(node).unwrap().position, [600.0, 400.0]);
        assert_eq!(connected_input, Some(input(&canvas, node, 0)));
        assert_eq!(canvas.graph.first_source(input(&canvas, node, 0)), Some(out));
        assert!(canvas.view.pending_menu.is_none());
    }

    #[test]
    fn test_wire_released_outside_the_view_is_dropped() {
        let (controller, mut canvas, _, _) = setup();
        controller.handle(&mut canvas, &down(109.0, 30.0));
        assert_eq!(controller.handle(&mut canvas, &up(5000.0, -900.0)), Outcome::Ignored);
        assert_eq!(canvas.view.mode, InteractionMode::Idle);
        assert!(canvas.view.pending_menu.is_none());
        assert_eq!(canvas.graph.node_count(), 2);
        assert_eq!(canvas.graph.connection_count(), 0);

        // Over a region the host reserved for its own widgets
        canvas.view.ignore_input.push(Rect::from_min_size(Pos2::new(200.0, 0.0), Vec2::splat(200.0)));
        controller.handle(&mut canvas, &down(109.0, 30.0));
        assert_eq!(controller.handle(&mut canvas, &up(291.0, 30.0)), Outcome::Ignored);
        assert!(canvas.view.pending_menu.is_none());
        assert_eq!(canvas.graph.connection_count(), 0);
    }

    #[test]
    fn test_release_near_origin_spawns_beside_the_origin_node() {
        let (controller, mut canvas, source, _) = setup();
        controller.handle(&mut canvas, &down(109.0, 30.0));
        assert!(matches!(
            controller.handle(&mut canvas, &up(112.0, 33.0)),
            Outcome::Menu(_)
        ));
        let Outcome::NodeCreated { node, connected_input } =
            controller.create_from_menu(&mut canvas, "gate").unwrap()
        else {
            panic!("expected a node");
        };
        assert_eq!(canvas.graph.node(node).unwrap().position, [150.0, 0.0]);
        assert!(connected_input.is_some());
        assert!(canvas.graph.is_ancestor_of(source, node));
    }

    #[test]
    fn test_connect_menu_refuses_incompatible_kind() {
        let (controller, mut canvas, _, _) = setup();
        controller.handle(&mut canvas, &down(109.0, 30.0));
        controller.handle(&mut canvas, &up(600.0, 400.0));
        assert!(matches!(
            controller.create_from_menu(&mut canvas, "source"),
            Err(GraphError::UnknownNodeKind(_))
        ));
        assert_eq!(canvas.graph.node_count(), 2);
    }

    #[test]
    fn test_node_menu_delete() {
        let (controller, mut canvas, source, gate) = setup();
        controller.handle(&mut canvas, &down(109.0, 30.0));
        controller.handle(&mut canvas, &up(291.0, 30.0));

        let Outcome::Menu(menu) = controller.handle(&mut canvas, &right_down(50.0, 25.0)) else {
            panic!("expected a menu");
        };
        assert!(matches!(menu.kind, MenuKind::Node { node, .. } if node == source));
        assert_eq!(canvas.view.active_node, Some(source));

        assert_eq!(
            controller.apply_node_action(&mut canvas, NodeAction::Delete).unwrap(),
            Outcome::NodeDeleted(source)
        );
        assert!(!canvas.graph.contains_node(source));
        assert_eq!(canvas.view.active_node, None);
        assert!(!canvas.graph.port(input(&canvas, gate, 0)).unwrap().is_connected());
    }

    #[test]
    fn test_node_menu_duplicate_starts_dragging() {
        let (controller, mut canvas, _, gate) = setup();
        controller.handle(&mut canvas, &right_down(350.0, 25.0));
        let Outcome::NodeCreated { node: copy, .. } =
            controller.apply_node_action(&mut canvas, NodeAction::Duplicate).unwrap()
        else {
            panic!("expected a node");
        };
        assert_ne!(copy, gate);
        assert_eq!(canvas.graph.node(copy).unwrap().kind_id, "gate");
        assert_eq!(canvas.view.mode, InteractionMode::DraggingNode { node: copy });

        controller.handle(&mut canvas, &move_to(360.0, 35.0));
        assert_eq!(canvas.graph.node(copy).unwrap().position, [360.0, 35.0]);
    }

    #[test]
    fn test_canvas_menu_lists_every_kind() {
        let (controller, mut canvas, _, _) = setup();
        let Outcome::Menu(menu) = controller.handle(&mut canvas, &right_down(500.0, 300.0)) else {
            panic!("expected a menu");
        };
        assert_eq!(menu.entries(), vec!["source".to_string(), "gate".to_string()]);

        let Outcome::NodeCreated { node, .. } =
            controller.create_from_menu(&mut canvas, "source").unwrap()
        else {
            panic!("expected a node");
        };
        assert_eq!(canvas.graph.node(node).unwrap().position, [500.0, 300.0]);
        assert_eq!(
            controller.apply_node_action(&mut canvas, NodeAction::Delete).unwrap(),
            Outcome::Ignored
        );
    }

    #[test]
    fn test_pointer_down_dismisses_menu() {
        let (controller, mut canvas, _, _) = setup();
        controller.handle(&mut canvas, &right_down(500.0, 300.0));
        controller.handle(&mut canvas, &down(500.0, 300.0));
        assert!(canvas.view.pending_menu.is_none());
        assert_eq!(controller.create_from_menu(&mut canvas, "source").unwrap(), Outcome::Ignored);
    }

    #[test]
    fn test_scroll_zoom_clamps_at_bounds() {
        let (controller, mut canvas, _, _) = setup();
        let scroll = |delta| InputEvent::Scroll {
            pos: Pos2::new(400.0, 300.0),
            delta,
        };
        controller.handle(&mut canvas, &scroll(100.0));
        assert_eq!(canvas.view.zoom(), 2.0);
        controller.handle(&mut canvas, &scroll(-100.0));
        assert_eq!(canvas.view.zoom(), 0.6);
        assert_eq!(canvas.view.pan_offset, Vec2::ZERO);
    }

    #[test]
    fn test_navigate_and_snap() {
        let (controller, mut canvas, source, _) = setup();
        let pos = Pos2::new(700.0, 500.0);
        controller.handle(&mut canvas, &InputEvent::KeyDown { key: EditorKey::Navigate, pos });
        assert_eq!(canvas.view.mode, InteractionMode::Navigating);
        assert_eq!(canvas.view.navigation_target(&canvas.graph), Pos2::ZERO);
        // Key repeat and pointer motion leave the cue up
        assert_eq!(
            controller.handle(&mut canvas, &InputEvent::KeyDown { key: EditorKey::Navigate, pos }),
            Outcome::Ignored
        );
        assert_eq!(controller.handle(&mut canvas, &move_to(710.0, 505.0)), Outcome::Ignored);
        assert_eq!(canvas.view.mode, InteractionMode::Navigating);
        controller.handle(&mut canvas, &InputEvent::KeyUp { key: EditorKey::Navigate, pos });
        assert_eq!(canvas.view.mode, InteractionMode::Idle);

        canvas.graph.node_mut(source).unwrap().position = [13.0, 17.0];
        canvas.view.active_node = Some(source);
        controller.handle(&mut canvas, &InputEvent::KeyDown { key: EditorKey::Snap, pos });
        assert_eq!(canvas.graph.node(source).unwrap().position, [10.0, 20.0]);
    }

    #[test]
    fn test_focus_loss_cancels_without_mutation() {
        let (controller, mut canvas, _, _) = setup();
        controller.handle(&mut canvas, &down(109.0, 30.0));
        controller.handle(&mut canvas, &InputEvent::FocusLost);
        assert_eq!(canvas.view.mode, InteractionMode::Idle);
        controller.handle(&mut canvas, &up(291.0, 30.0));
        assert_eq!(canvas.graph.connection_count(), 0);
    }

    #[test]
    fn test_unhandled_event_returns_to_idle() {
        let (controller, mut canvas, _, _) = setup();
        controller.handle(&mut canvas, &down(500.0, 500.0));
        assert_eq!(
            controller.handle(&mut canvas, &right_down(500.0, 500.0)),
            Outcome::Ignored
        );
        assert_eq!(canvas.view.mode, InteractionMode::Idle);
        assert!(canvas.view.pending_menu.is_none());
    }

    #[test]
    fn test_nested_view_receives_and_captures_events() {
        let controller = controller();
        let mut graph = Graph::new("root");
        let root_node = spawn(&controller, &mut graph, "source", 0.0, 0.0);
        let inner = graph.add_child(Graph::new("inner"));
        let inner_node = {
            let inner = graph.find_mut(inner).unwrap();
            spawn(&controller, inner, "source", 10.0, 10.0)
        };
        let mut canvas = Canvas::new(
            graph,
            Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
            Rect::from_min_size(Pos2::new(500.0, 300.0), Vec2::new(200.0, 200.0)),
            controller.settings(),
        );

        assert_eq!(
            controller.handle(&mut canvas, &down(550.0, 330.0)),
            Outcome::Selected(inner_node)
        );
        assert_eq!(canvas.view.children[0].active_node, Some(inner_node));
        assert_eq!(canvas.view.active_node, None);

        controller.finish_pass(&mut canvas, false);
        // Leaves the nested region but stays captured
        controller.handle(&mut canvas, &move_to(450.0, 330.0));
        let inner_graph = canvas.graph.find(inner).unwrap();
        assert_eq!(inner_graph.node(inner_node).unwrap().position, [-90.0, 10.0]);
        assert_eq!(canvas.graph.node(root_node).unwrap().position, [0.0, 0.0]);
    }
}
