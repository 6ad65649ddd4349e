// SPDX-License-Identifier: MIT OR Apache-2.0
//! `trellis_editor` - headless Trellis editor host
//!
//! Subcommands:
//! - `kinds` lists registered node kinds and connection types
//! - `validate` loads a snapshot and reports connections that did not survive
//! - `replay` plays a recorded input script against a snapshot
//! - `new` writes the conditional logic demo graph

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trellis_editor_app::{load_settings, Host, Result, Script};
use trellis_editor_graph::CanvasSnapshot;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trellis_editor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Headless host for the Trellis node graph editor")]
#[command(propagate_version = true)]
struct Cli {
    /// Editor settings file (RON); defaults are used when it does not exist
    #[arg(long, global = true, env = "TRELLIS_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered node kinds and type tags
    Kinds,

    /// Load a snapshot and report dropped connections
    Validate {
        /// Snapshot file (.ron or .json)
        graph: PathBuf,
    },

    /// Replay a recorded input script against a snapshot
    Replay {
        /// Snapshot file (.ron or .json)
        graph: PathBuf,
        /// Script file (RON)
        script: PathBuf,
        /// Where to write the result; printed as RON when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the conditional logic demo graph
    New {
        /// Snapshot file to create (.ron or .json)
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trellis_editor=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting Trellis editor host v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}

/// Run a command, returning the process exit code
fn run(cli: Cli) -> Result<i32> {
    let settings = load_settings(cli.settings.as_deref())?;
    let host = Host::new(settings)?;

    match cli.command {
        Command::Kinds => {
            for line in host.listing() {
                println!("{line}");
            }
            Ok(0)
        }
        Command::Validate { graph } => {
            let (canvas, report) = host.load(&graph)?;
            println!(
                "{}: {} nodes, {} connections restored, {} dropped",
                graph.display(),
                canvas.graph.node_count(),
                report.restored,
                report.dropped.len()
            );
            for dropped in &report.dropped {
                let reason = dropped
                    .reason
                    .map_or_else(|| "unknown".to_string(), |r| r.to_string());
                println!("  dropped {:?} -> {:?}: {reason}", dropped.output, dropped.input);
            }
            Ok(if report.dropped.is_empty() { 0 } else { 2 })
        }
        Command::Replay {
            graph,
            script,
            output,
        } => {
            let (mut canvas, _) = host.load(&graph)?;
            let script = Script::load(&script)?;
            let report = host.replay(&mut canvas, &script)?;
            tracing::info!(
                steps = report.outcomes.len(),
                connected = report.connections_made(),
                rejected = report.rejections(),
                updated = report.update.updated.len(),
                "replay finished"
            );
            match output {
                Some(path) => host.save(&canvas, &path)?,
                None => println!("{}", CanvasSnapshot::capture(&canvas).to_ron()?),
            }
            Ok(0)
        }
        Command::New { output } => {
            let canvas = host.demo_canvas()?;
            host.save(&canvas, &output)?;
            Ok(0)
        }
    }
}
