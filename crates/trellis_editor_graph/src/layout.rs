// SPDX-License-Identifier: MIT OR Apache-2.0
//! Knob placement and hit regions, all in canvas space.
//!
//! Ports are laid out in rows below the node header, inputs on the left edge
//! and outputs on the right. Each port has a square knob that sits just
//! outside the edge.

use crate::node::Node;
use crate::port::{Port, PortDirection, PortId};
use crate::settings::EditorSettings;
use egui::{Pos2, Rect, Vec2};

/// Vertical centre of the port row at `index`
fn row_center(node: &Node, index: usize, settings: &EditorSettings) -> f32 {
    node.position[1]
        + settings.header_height
        + settings.port_row_height * index as f32
        + settings.port_row_height / 2.0
}

fn knob_at(node: &Node, direction: PortDirection, index: usize, settings: &EditorSettings) -> Rect {
    let rect = node.rect();
    let half = settings.knob_size / 2.0;
    let x = match direction {
        PortDirection::Input => rect.left() - half,
        PortDirection::Output => rect.right() + half,
    };
    Rect::from_center_size(
        Pos2::new(x, row_center(node, index, settings)),
        Vec2::splat(settings.knob_size),
    )
}

/// Knob rectangle of a port on `node`
pub fn knob_rect(node: &Node, port: PortId, settings: &EditorSettings) -> Option<Rect> {
    if let Some(index) = node.inputs.iter().position(|p| p.id == port) {
        return Some(knob_at(node, PortDirection::Input, index, settings));
    }
    node.outputs
        .iter()
        .position(|p| p.id == port)
        .map(|index| knob_at(node, PortDirection::Output, index, settings))
}

/// Where connection curves attach to a port
pub fn port_anchor(node: &Node, port: PortId, settings: &EditorSettings) -> Option<Pos2> {
    knob_rect(node, port, settings).map(|rect| rect.center())
}

/// Node rectangle widened by one knob on each side
pub fn hit_rect(node: &Node, settings: &EditorSettings) -> Rect {
    node.rect().expand2(Vec2::new(settings.knob_size, 0.0))
}

fn knob_hit<'a>(
    node: &Node,
    ports: &'a [Port],
    direction: PortDirection,
    pos: Pos2,
    settings: &EditorSettings,
) -> Option<&'a Port> {
    ports
        .iter()
        .enumerate()
        .find(|(index, _)| knob_at(node, direction, *index, settings).contains(pos))
        .map(|(_, port)| port)
}

/// Input whose knob contains `pos`
pub fn input_at(node: &Node, pos: Pos2, settings: &EditorSettings) -> Option<PortId> {
    knob_hit(node, &node.inputs, PortDirection::Input, pos, settings).map(|port| port.id)
}

/// Output whose knob contains `pos`
pub fn output_at(node: &Node, pos: Pos2, settings: &EditorSettings) -> Option<PortId> {
    knob_hit(node, &node.outputs, PortDirection::Output, pos, settings).map(|port| port.id)
}

/// Minimum node height that fits the header and every port row
pub fn min_height(node: &Node, settings: &EditorSettings) -> f32 {
    let rows = node.inputs.len().max(node.outputs.len());
    settings.header_height + settings.port_row_height * rows as f32
}
