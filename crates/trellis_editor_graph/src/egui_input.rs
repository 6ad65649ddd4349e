// SPDX-License-Identifier: MIT OR Apache-2.0
//! Translation of egui input into editor [`InputEvent`]s.

use crate::interaction::{EditorKey, InputEvent, PointerButton};
use crate::settings::KeyBindings;
use egui::{Event, Modifiers, MouseWheelUnit, Pos2, RawInput};

/// Wheel points that count as one scroll line
const POINTS_PER_LINE: f32 = 50.0;

/// Lines per scrolled page
const LINES_PER_PAGE: f32 = 10.0;

/// Stateful converter from egui frames to editor events.
///
/// Modifier-only key presses never show up as egui events, so the snap key is
/// detected from modifier transitions between frames.
#[derive(Debug, Clone)]
pub struct EguiInputAdapter {
    navigate_key: Option<egui::Key>,
    snap_on_ctrl: bool,
    pointer: Pos2,
    command_down: bool,
    focused: bool,
}

impl EguiInputAdapter {
    /// Create an adapter for the given bindings
    pub fn new(keys: &KeyBindings) -> Self {
        let navigate_key = egui::Key::from_name(&keys.navigate);
        if navigate_key.is_none() {
            tracing::warn!(key = %keys.navigate, "unknown navigate key name, navigation disabled");
        }
        Self {
            navigate_key,
            snap_on_ctrl: keys.snap_on_ctrl,
            pointer: Pos2::ZERO,
            command_down: false,
            focused: true,
        }
    }

    /// Last known pointer position
    pub fn pointer(&self) -> Pos2 {
        self.pointer
    }

    /// Convert one frame of raw egui input
    pub fn translate(&mut self, raw: &RawInput) -> Vec<InputEvent> {
        let mut out = Vec::new();

        if self.focused && !raw.focused {
            out.push(InputEvent::FocusLost);
        }
        self.focused = raw.focused;

        for event in &raw.events {
            self.modifiers_changed(event_modifiers(event), &mut out);
            if let Some(event) = self.translate_event(event) {
                out.push(event);
            }
        }
        self.modifiers_changed(Some(raw.modifiers), &mut out);
        out
    }

    /// Convert a single egui event
    pub fn translate_event(&mut self, event: &Event) -> Option<InputEvent> {
        match event {
            Event::PointerMoved(pos) => {
                self.pointer = *pos;
                Some(InputEvent::PointerMove { pos: *pos })
            }
            Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => {
                self.pointer = *pos;
                let button = match button {
                    egui::PointerButton::Primary => PointerButton::Primary,
                    egui::PointerButton::Secondary => PointerButton::Secondary,
                    egui::PointerButton::Middle => PointerButton::Middle,
                    _ => return None,
                };
                Some(if *pressed {
                    InputEvent::PointerDown { pos: *pos, button }
                } else {
                    InputEvent::PointerUp { pos: *pos, button }
                })
            }
            Event::MouseWheel { unit, delta, .. } => {
                let lines = match unit {
                    MouseWheelUnit::Point => delta.y / POINTS_PER_LINE,
                    MouseWheelUnit::Line => delta.y,
                    MouseWheelUnit::Page => delta.y * LINES_PER_PAGE,
                };
                (lines != 0.0).then_some(InputEvent::Scroll {
                    pos: self.pointer,
                    delta: lines,
                })
            }
            Event::Key {
                key,
                pressed,
                repeat,
                ..
            } => {
                if *key == egui::Key::Escape && *pressed {
                    return Some(InputEvent::Cancel);
                }
                if Some(*key) != self.navigate_key || *repeat {
                    return None;
                }
                let key = EditorKey::Navigate;
                let pos = self.pointer;
                Some(if *pressed {
                    InputEvent::KeyDown { key, pos }
                } else {
                    InputEvent::KeyUp { key, pos }
                })
            }
            Event::WindowFocused(false) => {
                let was_focused = std::mem::replace(&mut self.focused, false);
                was_focused.then_some(InputEvent::FocusLost)
            }
            Event::WindowFocused(true) => {
                self.focused = true;
                None
            }
            _ => None,
        }
    }

    fn modifiers_changed(&mut self, modifiers: Option<Modifiers>, out: &mut Vec<InputEvent>) {
        let Some(modifiers) = modifiers else {
            return;
        };
        let down = modifiers.command || modifiers.ctrl;
        if self.snap_on_ctrl && down && !self.command_down {
            out.push(InputEvent::KeyDown {
                key: EditorKey::Snap,
                pos: self.pointer,
            });
        }
        self.command_down = down;
    }
}

fn event_modifiers(event: &Event) -> Option<Modifiers> {
    match event {
        Event::PointerButton { modifiers, .. }
        | Event::MouseWheel { modifiers, .. }
        | Event::Key { modifiers, .. } => Some(*modifiers),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Vec2;

    fn raw(events: Vec<Event>) -> RawInput {
        RawInput {
            events,
            focused: true,
            ..Default::default()
        }
    }

    fn key(key: egui::Key, pressed: bool) -> Event {
        Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers: Modifiers::NONE,
        }
    }

    #[test]
    fn test_pointer_and_wheel() {
        let mut adapter = EguiInputAdapter::new(&KeyBindings::default());
        let events = adapter.translate(&raw(vec![
            Event::PointerMoved(Pos2::new(5.0, 6.0)),
            Event::PointerButton {
                pos: Pos2::new(5.0, 6.0),
                button: egui::PointerButton::Primary,
                pressed: true,
                modifiers: Modifiers::NONE,
            },
            Event::MouseWheel {
                unit: MouseWheelUnit::Line,
                delta: Vec2::new(0.0, 2.0),
                modifiers: Modifiers::NONE,
            },
        ]));
        assert_eq!(
            events,
            vec![
                InputEvent::PointerMove { pos: Pos2::new(5.0, 6.0) },
                InputEvent::PointerDown {
                    pos: Pos2::new(5.0, 6.0),
                    button: PointerButton::Primary
                },
                InputEvent::Scroll {
                    pos: Pos2::new(5.0, 6.0),
                    delta: 2.0
                },
            ]
        );
    }

    #[test]
    fn test_navigate_key_and_cancel() {
        let mut adapter = EguiInputAdapter::new(&KeyBindings::default());
        let events = adapter.translate(&raw(vec![
            key(egui::Key::N, true),
            key(egui::Key::A, true),
            key(egui::Key::N, false),
            key(egui::Key::Escape, true),
        ]));
        assert_eq!(
            events,
            vec![
                InputEvent::KeyDown { key: EditorKey::Navigate, pos: Pos2::ZERO },
                InputEvent::KeyUp { key: EditorKey::Navigate, pos: Pos2::ZERO },
                InputEvent::Cancel,
            ]
        );
    }

    #[test]
    fn test_ctrl_press_snaps_once() {
        let mut adapter = EguiInputAdapter::new(&KeyBindings::default());
        let mut frame = raw(Vec::new());
        frame.modifiers = Modifiers::CTRL;
        assert_eq!(
            adapter.translate(&frame),
            vec![InputEvent::KeyDown { key: EditorKey::Snap, pos: Pos2::ZERO }]
        );
        assert!(adapter.translate(&frame).is_empty());
    }

    #[test]
    fn test_focus_loss() {
        let mut adapter = EguiInputAdapter::new(&KeyBindings::default());
        let mut frame = raw(Vec::new());
        frame.focused = false;
        assert_eq!(adapter.translate(&frame), vec![InputEvent::FocusLost]);
        assert!(adapter.translate(&frame).is_empty());
    }
}
