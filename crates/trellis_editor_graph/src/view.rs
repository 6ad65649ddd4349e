// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-view state and the coordinate transforms between screen, view and
//! canvas space.
//!
//! - **Canvas space**: where node rectangles live.
//! - **View space**: canvas space scaled by `zoom` around the centre of the
//!   view's region, relative to the region's top-left corner.
//! - **Screen space**: view space offset by the region's placement. For a
//!   nested view the region is placed on its parent's canvas, so its screen
//!   transform is chained after the parent's.
//!
//! Panning does not enter the transforms: it is applied by translating node
//! positions, and `pan_offset` records where the canvas origin moved to.

use crate::graph::{Graph, GraphId};
use crate::interaction::{InteractionMode, PendingMenu};
use crate::layout;
use crate::node::NodeId;
use crate::settings::EditorSettings;
use egui::{Pos2, Rect, Vec2};

/// Uniform scale followed by a translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Scale factor
    pub scale: f32,
    /// Translation applied after scaling
    pub offset: Vec2,
}

impl ViewTransform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: Vec2::ZERO,
    };

    /// Map a point forward
    pub fn apply(&self, pos: Pos2) -> Pos2 {
        (pos.to_vec2() * self.scale + self.offset).to_pos2()
    }

    /// Map a point backward
    pub fn invert(&self, pos: Pos2) -> Pos2 {
        ((pos.to_vec2() - self.offset) / self.scale).to_pos2()
    }

    /// Map a displacement forward
    pub fn apply_vec(&self, delta: Vec2) -> Vec2 {
        delta * self.scale
    }

    /// Map a displacement backward
    pub fn invert_vec(&self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }

    /// Map a rectangle forward
    pub fn apply_rect(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.apply(rect.min), self.apply(rect.max))
    }

    /// Map a rectangle backward
    pub fn invert_rect(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.invert(rect.min), self.invert(rect.max))
    }

    /// `self` applied after `inner`
    pub fn then(&self, inner: &ViewTransform) -> ViewTransform {
        ViewTransform {
            scale: self.scale * inner.scale,
            offset: inner.offset * self.scale + self.offset,
        }
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Mutable state of one view onto one graph
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Graph shown by this view
    pub graph: GraphId,
    /// Region of the view: screen space for the root view, the parent's
    /// canvas space for nested views
    pub canvas_rect: Rect,
    /// Accumulated pan; the canvas origin sits here
    pub pan_offset: Vec2,
    /// Nested views are only drawn and routed to when visible
    pub visible: bool,
    /// Selected node
    pub active_node: Option<NodeId>,
    /// Current interaction state
    pub mode: InteractionMode,
    /// Menu waiting for the host to pick an entry
    pub pending_menu: Option<PendingMenu>,
    /// Nested views, each bound to a child graph
    pub children: Vec<ViewState>,
    /// Screen regions covered by host widgets; input there is not routed here
    pub ignore_input: Vec<Rect>,
    zoom: f32,
    zoom_limits: [f32; 2],
    parent_transform: ViewTransform,
    pub(crate) drag_candidate: Option<NodeId>,
    pub(crate) last_pointer: Option<Pos2>,
}

impl ViewState {
    /// Create a view at zoom 1 onto `graph`
    pub fn new(graph: GraphId, canvas_rect: Rect, settings: &EditorSettings) -> Self {
        Self {
            graph,
            canvas_rect,
            pan_offset: Vec2::ZERO,
            visible: true,
            active_node: None,
            mode: InteractionMode::Idle,
            pending_menu: None,
            children: Vec::new(),
            ignore_input: Vec::new(),
            zoom: settings.clamp_zoom(1.0),
            zoom_limits: [settings.zoom_min, settings.zoom_max],
            parent_transform: ViewTransform::IDENTITY,
            drag_candidate: None,
            last_pointer: None,
        }
    }

    /// Create a view tree mirroring a graph tree; children are placed at
    /// `child_rect` on their parent canvas
    pub fn for_graph(graph: &Graph, canvas_rect: Rect, child_rect: Rect, settings: &EditorSettings) -> Self {
        let mut view = Self::new(graph.id, canvas_rect, settings);
        for child in graph.children() {
            view.children
                .push(Self::for_graph(child, child_rect, child_rect, settings));
        }
        view.refresh_transforms();
        view
    }

    /// Current zoom factor
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Zoom bounds as `[min, max]`
    pub fn zoom_limits(&self) -> [f32; 2] {
        self.zoom_limits
    }

    /// Set the zoom, clamped into the configured range
    pub fn set_zoom(&mut self, zoom: f32) {
        let [min, max] = self.zoom_limits;
        self.zoom = zoom.clamp(min, max);
        self.refresh_transforms();
    }

    /// Change the zoom by `delta`, clamped into the configured range
    pub fn zoom_by(&mut self, delta: f32) {
        self.set_zoom(self.zoom + delta);
    }

    /// Zoom pivot in view space: the centre of the region
    pub fn pivot(&self) -> Vec2 {
        self.canvas_rect.size() / 2.0
    }

    /// Canvas to view space
    pub fn canvas_to_view(&self, pos: Pos2) -> Pos2 {
        let pivot = self.pivot();
        ((pos.to_vec2() - pivot) * self.zoom + pivot).to_pos2()
    }

    /// View to canvas space
    pub fn view_to_canvas(&self, pos: Pos2) -> Pos2 {
        let pivot = self.pivot();
        ((pos.to_vec2() - pivot) / self.zoom + pivot).to_pos2()
    }

    /// Canvas space to the space the region is placed in
    pub fn local_transform(&self) -> ViewTransform {
        let pivot = self.pivot();
        ViewTransform {
            scale: self.zoom,
            offset: self.canvas_rect.min.to_vec2() + pivot * (1.0 - self.zoom),
        }
    }

    /// Transform of the space this view's region is placed in (identity for
    /// the root view)
    pub fn parent_transform(&self) -> ViewTransform {
        self.parent_transform
    }

    /// Canvas to screen transform, including all enclosing views
    pub fn screen_transform(&self) -> ViewTransform {
        self.parent_transform.then(&self.local_transform())
    }

    /// Canvas to screen space
    pub fn canvas_to_screen(&self, pos: Pos2) -> Pos2 {
        self.screen_transform().apply(pos)
    }

    /// Screen to canvas space
    pub fn screen_to_canvas(&self, pos: Pos2) -> Pos2 {
        self.screen_transform().invert(pos)
    }

    /// View to screen space
    pub fn view_to_screen(&self, pos: Pos2) -> Pos2 {
        self.parent_transform.apply(pos + self.canvas_rect.min.to_vec2())
    }

    /// Screen to view space
    pub fn screen_to_view(&self, pos: Pos2) -> Pos2 {
        self.parent_transform.invert(pos) - self.canvas_rect.min.to_vec2()
    }

    /// Region of the view in screen space
    pub fn screen_region(&self) -> Rect {
        self.parent_transform.apply_rect(self.canvas_rect)
    }

    /// Recompute the cached parent transforms of all nested views
    pub fn refresh_transforms(&mut self) {
        let own = self.screen_transform();
        for child in &mut self.children {
            child.parent_transform = own;
            child.refresh_transforms();
        }
    }

    /// Path of child indices to the deepest visible view containing `screen_pos`.
    ///
    /// Later children are drawn on top, so they claim the position first.
    pub fn route(&self, screen_pos: Pos2) -> Option<Vec<usize>> {
        if !self.visible
            || !self.screen_region().contains(screen_pos)
            || self.ignore_input.iter().any(|rect| rect.contains(screen_pos))
        {
            return None;
        }
        for (index, child) in self.children.iter().enumerate().rev() {
            if let Some(mut path) = child.route(screen_pos) {
                path.insert(0, index);
                return Some(path);
            }
        }
        Some(Vec::new())
    }

    /// Nested view at `path`
    pub fn view_at(&self, path: &[usize]) -> Option<&ViewState> {
        match path.split_first() {
            None => Some(self),
            Some((index, rest)) => self.children.get(*index)?.view_at(rest),
        }
    }

    /// Nested view at `path`, mutably
    pub fn view_at_mut(&mut self, path: &[usize]) -> Option<&mut ViewState> {
        match path.split_first() {
            None => Some(self),
            Some((index, rest)) => self.children.get_mut(*index)?.view_at_mut(rest),
        }
    }

    /// Path to a view in a non-idle interaction, if any
    pub fn captured_path(&self) -> Option<Vec<usize>> {
        if self.mode.captures_pointer() {
            return Some(Vec::new());
        }
        self.children.iter().enumerate().find_map(|(index, child)| {
            child.captured_path().map(|mut path| {
                path.insert(0, index);
                path
            })
        })
    }

    /// Path to the view holding a pending menu, if any
    pub fn pending_menu_path(&self) -> Option<Vec<usize>> {
        if self.pending_menu.is_some() {
            return Some(Vec::new());
        }
        self.children.iter().enumerate().find_map(|(index, child)| {
            child.pending_menu_path().map(|mut path| {
                path.insert(0, index);
                path
            })
        })
    }

    /// Visit this view and every nested view, parents first
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut ViewState)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// Translate the view by a canvas-space delta: nodes and nested view
    /// regions move, and the pan offset accumulates the delta
    pub fn pan(&mut self, graph: &mut Graph, delta: Vec2) {
        self.pan_offset += delta;
        graph.translate_nodes(delta);
        for child in &mut self.children {
            child.canvas_rect = child.canvas_rect.translate(delta);
        }
        self.refresh_transforms();
    }

    /// Round a canvas position to the snap grid anchored at the pan offset
    pub fn snap_position(&self, pos: [f32; 2], grid_step: f32) -> [f32; 2] {
        [
            ((pos[0] - self.pan_offset.x) / grid_step).round() * grid_step + self.pan_offset.x,
            ((pos[1] - self.pan_offset.y) / grid_step).round() * grid_step + self.pan_offset.y,
        ]
    }

    /// Where the navigation cue points: the active node's centre or the
    /// canvas origin
    pub fn navigation_target(&self, graph: &Graph) -> Pos2 {
        self.active_node
            .and_then(|id| graph.node(id))
            .map(|node| node.rect().center())
            .unwrap_or_else(|| self.pan_offset.to_pos2())
    }

    /// Node under a screen position.
    ///
    /// The active node is tested first since it is drawn on top, then the
    /// remaining nodes from last to first. Hit regions include the knob
    /// margins on both sides.
    pub fn node_at(&self, graph: &Graph, screen_pos: Pos2, settings: &EditorSettings) -> Option<NodeId> {
        if !self.screen_region().contains(screen_pos) {
            return None;
        }
        let canvas_pos = self.screen_to_canvas(screen_pos);

        if let Some(active) = self.active_node.and_then(|id| graph.node(id)) {
            if layout::hit_rect(active, settings).contains(canvas_pos) {
                return Some(active.id);
            }
        }
        graph
            .nodes()
            .rev()
            .find(|node| layout::hit_rect(node, settings).contains(canvas_pos))
            .map(|node| node.id)
    }

    /// Clear references to nodes that are no longer in `graph`
    pub fn forget_missing_nodes(&mut self, graph: &Graph) {
        if self.active_node.is_some_and(|id| !graph.contains_node(id)) {
            self.active_node = None;
        }
        if self.drag_candidate.is_some_and(|id| !graph.contains_node(id)) {
            self.drag_candidate = None;
        }
        if let InteractionMode::DraggingNode { node } = self.mode {
            if !graph.contains_node(node) {
                self.mode = InteractionMode::Idle;
            }
        }
    }
}
