// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host errors.

use std::path::PathBuf;
use trellis_editor_graph::{GraphError, SnapshotError};

/// Errors raised by the host binary
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// File I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file exists but could not be used
    #[error("Invalid settings file {path}: {source}")]
    Settings {
        /// Settings file
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Snapshot could not be read or written
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Graph or registry operation failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Script is not valid RON
    #[error("Script parse error: {0}")]
    Script(#[from] ron::error::SpannedError),

    /// A script step was refused
    #[error("Script step {step} failed: {source}")]
    Step {
        /// Zero-based step index
        step: usize,
        /// Underlying failure
        source: GraphError,
    },
}

/// Result type for host operations
pub type Result<T> = std::result::Result<T, HostError>;
