// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection types carried by conditional logic graphs.

use egui::Color32;
use serde::{Deserialize, Serialize};
use trellis_editor_graph::{TypeDescriptor, TypeProvider};

/// Tag of the condition type
pub const CONDITION: &str = "Condition";

/// Tag of the float type
pub const FLOAT: &str = "Float";

/// A boolean outcome plus the name of what triggered it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Whether the condition holds
    pub value: bool,
    /// Trigger name, empty if none
    pub trigger: String,
}

impl Condition {
    /// Condition with no trigger
    pub fn new(value: bool) -> Self {
        Self {
            value,
            trigger: String::new(),
        }
    }
}

/// A single float
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatValue {
    /// The value
    pub value: f32,
}

/// Registers [`CONDITION`] (green) and [`FLOAT`] (cyan)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicTypes;

impl TypeProvider for LogicTypes {
    fn type_descriptors(&self) -> Vec<TypeDescriptor> {
        vec![
            TypeDescriptor::new(CONDITION, Color32::GREEN).with_value::<Condition>(),
            TypeDescriptor::new(FLOAT, Color32::from_rgb(0, 255, 255)).with_value::<FloatValue>(),
        ]
    }
}
