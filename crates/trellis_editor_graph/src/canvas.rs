// SPDX-License-Identifier: MIT OR Apache-2.0
//! A graph tree together with the view tree that edits it.

use crate::graph::Graph;
use crate::settings::EditorSettings;
use crate::view::ViewState;
use egui::Rect;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Root graph plus root view; nested views refer to nested graphs by ID
#[derive(Debug)]
pub struct Canvas {
    /// Root graph
    pub graph: Graph,
    /// Root view
    pub view: ViewState,
}

impl Canvas {
    /// Wrap a graph with a view tree mirroring its nested graphs
    pub fn new(graph: Graph, canvas_rect: Rect, child_rect: Rect, settings: &EditorSettings) -> Self {
        let view = ViewState::for_graph(&graph, canvas_rect, child_rect, settings);
        Self { graph, view }
    }

    /// Wrap a graph and an existing view tree
    pub fn from_parts(graph: Graph, mut view: ViewState) -> Self {
        view.refresh_transforms();
        Self { graph, view }
    }
}

/// Canvas shared between a UI thread and workers.
///
/// Rendering takes read locks; input handling and updates take the write lock.
#[derive(Debug, Clone)]
pub struct SharedCanvas {
    inner: Arc<RwLock<Canvas>>,
}

impl SharedCanvas {
    /// Share a canvas
    pub fn new(canvas: Canvas) -> Self {
        Self {
            inner: Arc::new(RwLock::new(canvas)),
        }
    }

    /// Lock for reading
    pub fn read(&self) -> RwLockReadGuard<'_, Canvas> {
        self.inner.read()
    }

    /// Lock for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, Canvas> {
        self.inner.write()
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut Canvas) -> R) -> R {
        f(&mut self.inner.write())
    }
}
