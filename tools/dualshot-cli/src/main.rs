//! Dualshot CLI — run dual-angle capture sequences from the terminal.
//!
//! Usage:
//!   dualshot snap [OPTIONS]    Capture a photo pair (tap gesture)
//!   dualshot clip [OPTIONS]    Capture a clip pair (hold gesture)
//!   dualshot check             Check camera backend availability

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dualshot_common::config::AppConfig;
use dualshot_common::facing::CameraFacing;
use dualshot_common::logging::init_logging;

mod commands;

#[derive(Parser)]
#[command(
    name = "dualshot",
    about = "Dual-angle capture: both sides of the moment, one gesture",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Initial facing direction for phase 1.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Facing {
    Rear,
    Front,
}

impl From<Facing> for CameraFacing {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::Rear => CameraFacing::Rear,
            Facing::Front => CameraFacing::Front,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a photo pair (tap gesture)
    Snap {
        /// Facing direction for phase 1
        #[arg(long, value_enum, default_value = "rear")]
        facing: Facing,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Capture a clip pair (hold gesture)
    Clip {
        /// Facing direction for phase 1
        #[arg(long, value_enum, default_value = "rear")]
        facing: Facing,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Release the press this many ms into the primary recording
        /// (early stop); omit to record the full bound
        #[arg(long)]
        release_after_ms: Option<u64>,
    },
    /// Check camera backend availability
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Snap { facing, output } => {
            commands::snap::run(facing.into(), output, config).await
        }
        Commands::Clip {
            facing,
            output,
            release_after_ms,
        } => commands::clip::run(facing.into(), output, release_after_ms, config).await,
        Commands::Check => commands::check::run(),
    }
}
