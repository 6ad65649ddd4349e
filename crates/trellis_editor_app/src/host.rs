// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless editor host.
//!
//! Wires the conditional logic plugin into an [`InteractionController`] and
//! drives canvases from files instead of a window: snapshots are loaded and
//! validated, recorded scripts are replayed, and the result is written back.

use crate::error::{HostError, Result};
use crate::script::{Script, ScriptStep};
use egui::{Pos2, Rect, Vec2};
use std::path::Path;
use trellis_editor_graph::{
    run_update_pass, Canvas, CanvasSnapshot, EditorSettings, Graph, InteractionController,
    LoadReport, Outcome, TypeRegistry, UpdateReport,
};
use trellis_editor_logic::{create_logic_registry, LogicTypes, AND_GATE, BOOL_SOURCE};

/// Screen region of a canvas loaded without a stored view
pub const DEFAULT_VIEW_SIZE: Vec2 = Vec2::new(1280.0, 720.0);

/// Load settings, falling back to defaults when no file is given or the file
/// does not exist
pub fn load_settings(path: Option<&Path>) -> Result<EditorSettings> {
    let Some(path) = path else {
        return Ok(EditorSettings::default());
    };
    if !path.exists() {
        tracing::info!(path = %path.display(), "settings file not found, using defaults");
        return Ok(EditorSettings::default());
    }
    EditorSettings::load(path).map_err(|source| HostError::Settings {
        path: path.to_path_buf(),
        source,
    })
}

/// What a replay did
#[derive(Debug, Default)]
pub struct ReplayReport {
    /// Outcome of every step, in order
    pub outcomes: Vec<Outcome>,
    /// Update pass run after the last step
    pub update: UpdateReport,
}

impl ReplayReport {
    /// Connections made by dropping a wire on an input
    pub fn connections_made(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Outcome::Connected { .. }))
            .count()
    }

    /// Connection attempts that were refused
    pub fn rejections(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Outcome::Rejected(_)))
            .count()
    }
}

/// A controller loaded with the logic plugin
#[derive(Debug)]
pub struct Host {
    controller: InteractionController,
}

impl Host {
    /// Register the logic types and node kinds
    pub fn new(settings: EditorSettings) -> Result<Self> {
        let types = TypeRegistry::from_providers(&[&LogicTypes])?;
        let kinds = create_logic_registry()?;
        tracing::info!(
            types = types.len(),
            kinds = kinds.len(),
            "registries built"
        );
        Ok(Self {
            controller: InteractionController::new(settings, types, kinds),
        })
    }

    /// The controller driving canvases
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// One line per registered node kind and type tag
    pub fn listing(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .controller
            .kinds()
            .kinds()
            .map(|kind| {
                let ports: Vec<String> = kind
                    .ports()
                    .iter()
                    .map(|spec| format!("{:?} {}: {}", spec.direction, spec.name, spec.type_tag))
                    .collect();
                format!("kind {} \"{}\" [{}]", kind.id(), kind.name(), ports.join(", "))
            })
            .collect();
        lines.extend(
            self.controller
                .types()
                .descriptors()
                .map(|descriptor| format!("type {}", descriptor.tag)),
        );
        lines
    }

    /// Load a snapshot file, re-validating every connection
    pub fn load(&self, path: &Path) -> Result<(Canvas, LoadReport)> {
        let snapshot = CanvasSnapshot::load(path)?;
        let (canvas, report) = snapshot.restore(
            self.controller.types(),
            self.controller.settings(),
            Rect::from_min_size(Pos2::ZERO, DEFAULT_VIEW_SIZE),
        )?;
        tracing::info!(
            path = %path.display(),
            nodes = canvas.graph.node_count(),
            restored = report.restored,
            dropped = report.dropped.len(),
            "snapshot loaded"
        );
        Ok((canvas, report))
    }

    /// Write a canvas to a snapshot file
    pub fn save(&self, canvas: &Canvas, path: &Path) -> Result<()> {
        CanvasSnapshot::capture(canvas).save(path)?;
        tracing::info!(path = %path.display(), "snapshot written");
        Ok(())
    }

    /// Replay a script against a canvas, then run one update pass.
    ///
    /// Input events never fail; menu picks and node actions stop the replay
    /// at the first refused step.
    pub fn replay(&self, canvas: &mut Canvas, script: &Script) -> Result<ReplayReport> {
        let controller = &self.controller;
        let mut report = ReplayReport::default();

        for (step, entry) in script.steps.iter().enumerate() {
            let outcome = match entry {
                ScriptStep::Event(event) => controller.handle(canvas, event),
                ScriptStep::EndFrame { ui_claimed } => {
                    controller.finish_pass(canvas, *ui_claimed);
                    Outcome::Handled
                }
                ScriptStep::PickKind(kind) => controller
                    .create_from_menu(canvas, kind)
                    .map_err(|source| HostError::Step { step, source })?,
                ScriptStep::NodeAction(action) => controller
                    .apply_node_action(canvas, *action)
                    .map_err(|source| HostError::Step { step, source })?,
                ScriptStep::DismissMenu => {
                    controller.dismiss_menu(canvas);
                    Outcome::Handled
                }
            };
            tracing::debug!(step, ?outcome, "script step");
            report.outcomes.push(outcome);
        }

        report.update = run_update_pass(&mut canvas.graph, controller.kinds(), controller.types())?;
        for (node, err) in &report.update.failed {
            tracing::warn!(?node, %err, "node update failed");
        }
        Ok(report)
    }

    /// Two bool sources wired into an AND gate
    pub fn demo_canvas(&self) -> Result<Canvas> {
        let kinds = self.controller.kinds();
        let types = self.controller.types();
        let mut graph = Graph::new("Conditional logic");

        let a = graph.add_node(kinds.create_node(BOOL_SOURCE, Pos2::new(0.0, 0.0))?)?;
        let b = graph.add_node(kinds.create_node(BOOL_SOURCE, Pos2::new(0.0, 200.0))?)?;
        let gate = graph.add_node(kinds.create_node(AND_GATE, Pos2::new(400.0, 0.0))?)?;

        for (index, source) in [a, b].into_iter().enumerate() {
            let output = graph
                .node(source)
                .and_then(|node| node.output(0))
                .map(|port| port.id);
            let input = graph
                .node(gate)
                .and_then(|node| node.input(index))
                .map(|port| port.id);
            if let (Some(output), Some(input)) = (output, input) {
                graph.try_connect(output, input, types)?;
            }
        }

        let rect = Rect::from_min_size(Pos2::ZERO, DEFAULT_VIEW_SIZE);
        Ok(Canvas::new(graph, rect, rect, self.controller.settings()))
    }
}
