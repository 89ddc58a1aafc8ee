//! Spritebake CLI - export animated meshes to spritesheet atlases
//!
//! Renders every frame of an animation clip into a diffuse and a normal
//! map atlas and packages both into `atlas.zip`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use spritebake_cli::commands;
use spritebake_cli::commands::export::ExportOptions;
use spritebake_core::config::{DEFAULT_CELL_SIZE, DEFAULT_FPS};
use spritebake_core::CellSize;

/// Spritebake - Spritesheet Atlas Exporter
#[derive(Parser)]
#[command(name = "spritebake")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene's animation clip to atlas.zip
    Export {
        /// Path to the scene file (JSON)
        #[arg(short, long)]
        scene: PathBuf,

        /// Path to an export config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Animation clip to export (default: first clip)
        #[arg(short, long)]
        animation: Option<String>,

        /// Camera to render through (default: the scene's current camera)
        #[arg(long)]
        camera: Option<String>,

        /// Cell width in pixels
        #[arg(long)]
        cell_width: Option<u32>,

        /// Cell height in pixels
        #[arg(long)]
        cell_height: Option<u32>,

        /// Frames per second
        #[arg(long)]
        fps: Option<u32>,

        /// Store archive entries uncompressed
        #[arg(long)]
        store: bool,

        /// Favor PNG encode speed over file size
        #[arg(long)]
        fast_png: bool,

        /// Output directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Output a machine-readable JSON report (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the atlas layout for a clip duration
    Layout {
        /// Clip duration in seconds
        #[arg(short, long, allow_hyphen_values = true)]
        duration: f64,

        /// Frames per second
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,

        /// Cell width in pixels
        #[arg(long, default_value_t = DEFAULT_CELL_SIZE)]
        cell_width: u32,

        /// Cell height in pixels
        #[arg(long, default_value_t = DEFAULT_CELL_SIZE)]
        cell_height: u32,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Export {
            scene,
            config,
            animation,
            camera,
            cell_width,
            cell_height,
            fps,
            store,
            fast_png,
            out_dir,
            json,
        } => {
            commands::export::run(ExportOptions {
                scene,
                config,
                animation,
                camera,
                cell_width,
                cell_height,
                fps,
                store,
                fast_png,
                out_dir,
                json,
            })
            .await
        }
        Commands::Layout {
            duration,
            fps,
            cell_width,
            cell_height,
            json,
        } => commands::layout::run(CellSize::new(cell_width, cell_height), fps, duration, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
