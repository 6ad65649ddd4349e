// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings: zoom limits, grid, knob geometry and key bindings.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Tunables shared by the view state, layout and interaction controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Format version
    pub version: u32,
    /// Smallest zoom factor
    pub zoom_min: f32,
    /// Largest zoom factor
    pub zoom_max: f32,
    /// Zoom change per scroll unit
    pub zoom_step: f32,
    /// Snap grid step in canvas units
    pub grid_step: f32,
    /// Knob edge length in canvas units
    pub knob_size: f32,
    /// Node header height in canvas units
    pub header_height: f32,
    /// Height of one port row in canvas units
    pub port_row_height: f32,
    /// Screen distance from the drag origin within which a release counts as
    /// "at the origin" when spawning from the connection menu
    pub connect_origin_radius: f32,
    /// Gap between an origin node and a node spawned next to it
    pub spawn_gap: f32,
    /// Key bindings for host input adapters
    pub keys: KeyBindings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            zoom_min: 0.6,
            zoom_max: 2.0,
            zoom_step: 1.0 / 15.0,
            grid_step: 10.0,
            knob_size: 18.0,
            header_height: 20.0,
            port_row_height: 20.0,
            connect_origin_radius: 50.0_f32.sqrt(),
            spawn_gap: 50.0,
            keys: KeyBindings::default(),
        }
    }
}

impl EditorSettings {
    /// Clamp a zoom factor into the configured range
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.zoom_min, self.zoom_max)
    }

    /// Parse settings from RON
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }

    /// Serialize settings to RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }
        if settings.zoom_min <= 0.0 || settings.zoom_min > settings.zoom_max {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Invalid zoom range [{}, {}]",
                    settings.zoom_min, settings.zoom_max
                ),
            ));
        }

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = self.to_ron().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

/// Key names as understood by `egui::Key::from_name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Held to show the navigation cue
    pub navigate: String,
    /// Snap the active node when the command/ctrl modifier goes down
    pub snap_on_ctrl: bool,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            navigate: "N".to_string(),
            snap_on_ctrl: true,
        }
    }
}
