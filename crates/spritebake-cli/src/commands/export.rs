//! Export command implementation
//!
//! Loads a scene file, resolves the export configuration, renders both
//! passes with the preview renderer and writes `atlas.zip`.

use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use spritebake_core::{
    CancellationToken, DirectorySink, ExportArtifact, ExportConfig, ExportRequest, Material,
    PngConfig, SpritesheetExporter, ZipArchiver,
};
use tracing::{debug, warn};

use crate::preview::PreviewRenderer;
use crate::scene_file;

/// Options for the export command.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Scene file to export from.
    pub scene: PathBuf,
    /// Optional JSON config file; flags below override it.
    pub config: Option<PathBuf>,
    /// Animation clip name; the scene's first clip when unset.
    pub animation: Option<String>,
    /// Camera name; the scene's current camera when unset.
    pub camera: Option<String>,
    /// Cell width in pixels.
    pub cell_width: Option<u32>,
    /// Cell height in pixels.
    pub cell_height: Option<u32>,
    /// Frames sampled per second.
    pub fps: Option<u32>,
    /// Store archive entries without deflate compression.
    pub store: bool,
    /// Favor PNG encode speed over file size.
    pub fast_png: bool,
    /// Directory `atlas.zip` is written to.
    pub out_dir: PathBuf,
    /// Print the report as JSON.
    pub json: bool,
}

/// Build the effective configuration from the config file and flags.
pub fn resolve_config(options: &ExportOptions) -> Result<ExportConfig> {
    let mut config = match &options.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            ExportConfig::from_json(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => ExportConfig::default(),
    };

    if let Some(animation) = &options.animation {
        config.animation = Some(animation.clone());
    }
    if let Some(camera) = &options.camera {
        config.camera = Some(camera.clone());
    }
    if let Some(width) = options.cell_width {
        config.cell_width = width;
    }
    if let Some(height) = options.cell_height {
        config.cell_height = height;
    }
    if let Some(fps) = options.fps {
        config.fps = fps;
    }

    config.validate()?;
    Ok(config)
}

/// Export a scene and write the archive into `options.out_dir`.
pub async fn export_to_dir(options: &ExportOptions, cancel: CancellationToken) -> Result<ExportArtifact> {
    let config = resolve_config(options)?;
    let mut scene = scene_file::load_from_path(&options.scene)?;
    debug!(?config, "Resolved export configuration");

    let camera_names = scene.camera_names();
    let clip = config.resolve_clip(&scene.animations)?.clone();
    let camera = config
        .resolve_camera(&camera_names, scene.current_camera())?
        .to_string();

    let request = ExportRequest {
        clip: &clip,
        camera: &camera,
        cell_size: config.cell_size(),
        fps: config.fps,
        normal_material: Material::normal_visualization(),
        cancel,
    };
    let archiver = if options.store {
        ZipArchiver::stored()
    } else {
        ZipArchiver::deflated()
    };
    let png = if options.fast_png {
        PngConfig::fast()
    } else {
        PngConfig::default()
    };
    let mut renderer = PreviewRenderer::new(&scene.cameras);
    let artifact = SpritesheetExporter::with_codec(archiver)
        .png_config(png)
        .export(&mut scene.root, &mut renderer, &request)
        .await?;

    let mut sink = DirectorySink::new(&options.out_dir);
    ensure_dir(sink.dir())?;
    artifact.deliver(&mut sink)?;
    Ok(artifact)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

/// Cancel on the first interrupt; returns `true` on a second one.
///
/// Cancellation is only observed between frames, so a second interrupt is
/// the way out of a render that never returns.
async fn watch_interrupts<F, Fut>(mut interrupted: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if interrupted().await.is_err() {
        return false;
    }
    warn!("Interrupted; cancelling export (interrupt again to exit)");
    cancel.cancel();

    if interrupted().await.is_err() {
        return false;
    }
    warn!("Interrupted again; exiting");
    true
}

/// Run the export command.
pub async fn run(options: ExportOptions) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, on_interrupt).await {
            std::process::exit(130);
        }
    });

    let artifact = export_to_dir(&options, cancel).await?;
    let report = &artifact.report;
    let layout = &report.layout;
    let path = options.out_dir.join(&artifact.file_name);

    if options.json {
        let output = serde_json::json!({
            "success": true,
            "path": path.display().to_string(),
            "frame_count": layout.frame_count,
            "grid_dim": layout.grid_dim,
            "cell_size": [layout.cell_size.width, layout.cell_size.height],
            "atlas_size": [layout.atlas_width, layout.atlas_height],
            "entries": [artifact.diffuse.name, artifact.normal.name],
            "archive_bytes": report.archive_bytes,
            "diffuse_ms": report.diffuse_ms,
            "normal_ms": report.normal_ms,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}", "Exported".green().bold(), path.display());
        println!(
            "  {} frames in a {}x{} grid, atlas {}x{}",
            layout.frame_count, layout.grid_dim, layout.grid_dim, layout.atlas_width, layout.atlas_height
        );
        println!(
            "  {} ({} bytes), {} ({} bytes)",
            artifact.diffuse.name,
            artifact.diffuse.bytes.len(),
            artifact.normal.name,
            artifact.normal.bytes.len()
        );
        println!(
            "  passes: diffuse {}ms, normal {}ms",
            report.diffuse_ms, report.normal_ms
        );
    }

    Ok(ExitCode::SUCCESS)
}
