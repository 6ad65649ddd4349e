// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replaying scripts against snapshot files.

use trellis_editor_app::{Host, Script};
use trellis_editor_graph::{EditorSettings, Outcome};

const REWIRE_SCRIPT: &str = r#"(
    steps: [
        // Pull the wire off the gate's first input
        Event(PointerDown(pos: (x: 391.0, y: 30.0), button: Primary)),
        Event(PointerMove(pos: (x: 700.0, y: 500.0))),
        Event(PointerUp(pos: (x: 700.0, y: 500.0), button: Primary)),
        PickKind("AndGate"),
        EndFrame(ui_claimed: false),
    ],
)"#;

fn host() -> Host {
    Host::new(EditorSettings::default()).unwrap()
}

#[test]
fn test_replay_rewires_demo_graph() {
    let host = host();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("demo.ron");
    let output = dir.path().join("rewired.json");
    host.save(&host.demo_canvas().unwrap(), &input).unwrap();

    let (mut canvas, report) = host.load(&input).unwrap();
    assert_eq!(report.restored, 2);

    let script = Script::from_ron(REWIRE_SCRIPT).unwrap();
    let replay = host.replay(&mut canvas, &script).unwrap();
    assert!(matches!(replay.outcomes[0], Outcome::Detached { .. }));
    assert!(matches!(replay.outcomes[2], Outcome::Menu(_)));
    assert!(matches!(
        replay.outcomes[3],
        Outcome::NodeCreated {
            connected_input: Some(_),
            ..
        }
    ));
    assert!(replay.update.is_clean());
    assert_eq!(replay.update.updated.len(), 4);

    host.save(&canvas, &output).unwrap();
    let (reloaded, report) = host.load(&output).unwrap();
    assert_eq!(reloaded.graph.node_count(), 4);
    assert_eq!(reloaded.graph.connection_count(), 2);
    assert!(report.dropped.is_empty());
}

#[test]
fn test_replay_rejects_wire_into_its_own_ancestor() {
    let host = host();
    let mut canvas = host.demo_canvas().unwrap();

    // Gate output (x = 509) dropped onto the second source: it has no inputs
    let script = Script::from_ron(
        r#"(steps: [
            Event(PointerDown(pos: (x: 509.0, y: 30.0), button: Primary)),
            Event(PointerUp(pos: (x: 75.0, y: 260.0), button: Primary)),
        ])"#,
    )
    .unwrap();
    let replay = host.replay(&mut canvas, &script).unwrap();
    assert_eq!(replay.outcomes[1], Outcome::Handled);
    assert_eq!(replay.connections_made(), 0);
    assert_eq!(canvas.graph.connection_count(), 2);
}

#[test]
fn test_settings_file_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.ron");
    let settings = EditorSettings {
        zoom_max: 3.0,
        ..EditorSettings::default()
    };
    settings.save(&path).unwrap();

    let loaded = trellis_editor_app::load_settings(Some(&path)).unwrap();
    assert_eq!(loaded.zoom_max, 3.0);
}
