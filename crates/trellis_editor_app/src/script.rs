// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recorded input scripts.
//!
//! A script is a RON file listing what a user did in the editor, one step at
//! a time:
//!
//! ```ron
//! (
//!     steps: [
//!         Event(PointerDown(pos: (x: 159.0, y: 30.0), button: Primary)),
//!         Event(PointerUp(pos: (x: 700.0, y: 500.0), button: Primary)),
//!         PickKind("AndGate"),
//!         EndFrame(ui_claimed: false),
//!     ],
//! )
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use trellis_editor_graph::{InputEvent, NodeAction};

/// One recorded step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Feed an input event to the controller
    Event(InputEvent),
    /// End of a host frame; commits pending drags unless a widget claimed the click
    EndFrame {
        /// Whether a host widget consumed the pointer this frame
        #[serde(default)]
        ui_claimed: bool,
    },
    /// Pick a node kind from the pending canvas or connection menu
    PickKind(String),
    /// Pick an action from the pending node menu
    NodeAction(NodeAction),
    /// Close the pending menu
    DismissMenu,
}

/// An ordered list of steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Steps in replay order
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse a script from RON
    pub fn from_ron(s: &str) -> Result<Self> {
        Ok(ron::from_str(s)?)
    }

    /// Load a script file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }
}
