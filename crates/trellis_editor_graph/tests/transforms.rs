// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property tests for view transforms and zoom clamping.

use egui::{Pos2, Rect, Vec2};
use proptest::prelude::*;
use trellis_editor_graph::{EditorSettings, Graph, GraphId, Node, ViewState};

const TOLERANCE: f32 = 1e-3;

fn zoom_strategy() -> impl Strategy<Value = f32> {
    prop_oneof![Just(0.6_f32), Just(1.0_f32), Just(2.0_f32)]
}

fn nonzero_pan() -> impl Strategy<Value = Vec2> {
    (-500.0_f32..500.0, -500.0_f32..500.0)
        .prop_filter("pan must move the view", |(x, y)| x.abs() + y.abs() > 1.0)
        .prop_map(|(x, y)| Vec2::new(x, y))
}

fn view_at(origin: Pos2, zoom: f32, settings: &EditorSettings) -> ViewState {
    let mut view = ViewState::new(
        GraphId::new(),
        Rect::from_min_size(origin, Vec2::new(800.0, 600.0)),
        settings,
    );
    view.set_zoom(zoom);
    view
}

fn close(a: Pos2, b: Pos2) -> bool {
    (a - b).length() <= TOLERANCE * (1.0 + a.to_vec2().length().max(b.to_vec2().length()))
}

proptest! {
    #[test]
    fn test_screen_canvas_round_trip(
        zoom in zoom_strategy(),
        pan in nonzero_pan(),
        x in -2000.0_f32..2000.0,
        y in -2000.0_f32..2000.0,
    ) {
        let settings = EditorSettings::default();
        let mut graph = Graph::new("root");
        let mut view = view_at(Pos2::new(40.0, 25.0), zoom, &settings);
        view.pan(&mut graph, pan);

        let p = Pos2::new(x, y);
        prop_assert!(close(view.screen_to_canvas(view.canvas_to_screen(p)), p));
        prop_assert!(close(view.canvas_to_screen(view.screen_to_canvas(p)), p));
        prop_assert!(close(view.view_to_canvas(view.canvas_to_view(p)), p));
        prop_assert!(close(view.screen_to_view(view.view_to_screen(p)), p));
    }

    #[test]
    fn test_nested_round_trip(
        outer_zoom in zoom_strategy(),
        inner_zoom in zoom_strategy(),
        pan in nonzero_pan(),
        x in -1000.0_f32..1000.0,
        y in -1000.0_f32..1000.0,
    ) {
        let settings = EditorSettings::default();
        let mut graph = Graph::new("root");
        let mut root = view_at(Pos2::new(10.0, 10.0), outer_zoom, &settings);
        let mut child = ViewState::new(
            GraphId::new(),
            Rect::from_min_size(Pos2::new(120.0, 80.0), Vec2::new(300.0, 200.0)),
            &settings,
        );
        child.set_zoom(inner_zoom);
        root.children.push(child);
        root.pan(&mut graph, pan);

        let child = &root.children[0];
        let p = Pos2::new(x, y);
        let screen = child.canvas_to_screen(p);
        prop_assert!(close(child.screen_to_canvas(screen), p));

        let via_parent = root.canvas_to_screen(child.local_transform().apply(p));
        prop_assert!(close(screen, via_parent));
    }

    #[test]
    fn test_pan_moves_nodes_by_screen_delta(
        zoom in zoom_strategy(),
        pan in nonzero_pan(),
    ) {
        let settings = EditorSettings::default();
        let mut graph = Graph::new("root");
        let id = graph.add_node(Node::new("relay", "Relay", Pos2::new(30.0, 40.0))).unwrap();
        let mut view = view_at(Pos2::ZERO, zoom, &settings);

        let before = view.canvas_to_screen(graph.node(id).unwrap().rect().min);
        view.pan(&mut graph, pan);
        let after = view.canvas_to_screen(graph.node(id).unwrap().rect().min);
        prop_assert!(close(after, before + pan * zoom));
        prop_assert_eq!(view.pan_offset, pan);
    }

    #[test]
    fn test_zoom_never_leaves_bounds(deltas in prop::collection::vec(-50.0_f32..50.0, 1..40)) {
        let settings = EditorSettings::default();
        let mut view = view_at(Pos2::ZERO, 1.0, &settings);
        for delta in deltas {
            let expected = (view.zoom() + delta * settings.zoom_step)
                .clamp(settings.zoom_min, settings.zoom_max);
            view.zoom_by(delta * settings.zoom_step);
            prop_assert!(view.zoom() >= settings.zoom_min && view.zoom() <= settings.zoom_max);
            prop_assert_eq!(view.zoom(), expected);
        }
    }
}

#[test]
fn test_zoom_clamps_exactly_at_bounds() {
    let settings = EditorSettings::default();
    let mut view = view_at(Pos2::ZERO, 1.0, &settings);
    view.zoom_by(1.5);
    assert_eq!(view.zoom(), settings.zoom_max);
    view.zoom_by(-0.1);
    view.zoom_by(-10.0);
    assert_eq!(view.zoom(), settings.zoom_min);
}
