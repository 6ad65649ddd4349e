// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless host for the Trellis editor.
//!
//! Loads editor settings and canvas snapshots, replays recorded input
//! scripts through the interaction controller, runs update passes and
//! writes the result. The `trellis_editor` binary is a thin command line
//! front end over [`Host`].

pub mod error;
pub mod host;
pub mod script;

pub use error::{HostError, Result};
pub use host::{load_settings, Host, ReplayReport, DEFAULT_VIEW_SIZE};
pub use script::{Script, ScriptStep};
