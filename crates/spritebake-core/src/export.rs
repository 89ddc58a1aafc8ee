//! Two-pass spritesheet export.
//!
//! The exporter renders the clip once with the mesh's own materials and
//! once with a normal-visualizing override, restores the original
//! materials, and archives both atlases. The phases run strictly in order:
//!
//! `Idle -> CapturedOriginal -> DiffusePassDone -> OverrideApplied ->
//! NormalPassDone -> Restored -> Archived -> Done`
//!
//! Restoring is unconditional: a failed or cancelled pass still restores
//! the captured materials before the error is returned.

use std::fmt;
use std::time::Instant;

use tracing::{error, info};

use crate::archive::{ArchiveCodec, NamedImage, ZipArchiver};
use crate::cancel::CancellationToken;
use crate::delivery::{ArtifactSink, ARTIFACT_STEM};
use crate::error::{ExportError, ExportResult};
use crate::layout::{compute_layout, CellSize, GridLayout};
use crate::material::{capture, override_all, restore};
use crate::png::{encode_rgba_blocking, PngConfig};
use crate::raster::RasterImage;
use crate::render::{AnimationClip, FrameRenderer, Playback};
use crate::sampler::{sample_to_atlas, PassContext};
use crate::scene::MeshNode;

/// Archive entry name of the color pass.
pub const DIFFUSE_ENTRY: &str = "diffuse";

/// Archive entry name of the normal pass.
pub const NORMAL_ENTRY: &str = "normal";

/// Progress of one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    CapturedOriginal,
    DiffusePassDone,
    OverrideApplied,
    NormalPassDone,
    Restored,
    Archived,
    Done,
}

impl ExportPhase {
    /// Returns the phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportPhase::Idle => "idle",
            ExportPhase::CapturedOriginal => "captured_original",
            ExportPhase::DiffusePassDone => "diffuse_pass_done",
            ExportPhase::OverrideApplied => "override_applied",
            ExportPhase::NormalPassDone => "normal_pass_done",
            ExportPhase::Restored => "restored",
            ExportPhase::Archived => "archived",
            ExportPhase::Done => "done",
        }
    }
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to export and how.
#[derive(Debug, Clone)]
pub struct ExportRequest<'a, M> {
    /// Clip to sample.
    pub clip: &'a AnimationClip,
    /// Camera to render through.
    pub camera: &'a str,
    /// Size of each atlas cell.
    pub cell_size: CellSize,
    /// Frames sampled per second.
    pub fps: u32,
    /// Material assigned to deformable nodes for the normal pass.
    pub normal_material: M,
    /// Checked between frames.
    pub cancel: CancellationToken,
}

/// Summary of a finished export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Grid geometry of both atlases.
    pub layout: GridLayout,
    /// Phases passed through, in order.
    pub phases: Vec<ExportPhase>,
    /// Time spent rendering the diffuse pass, in milliseconds.
    pub diffuse_ms: u64,
    /// Time spent rendering the normal pass, in milliseconds.
    pub normal_ms: u64,
    /// Size of the archive in bytes.
    pub archive_bytes: usize,
}

/// Result of an export: both encoded atlases and the archive holding them.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// Encoded color atlas.
    pub diffuse: NamedImage,
    /// Encoded normal atlas.
    pub normal: NamedImage,
    /// File name the archive should be delivered under.
    pub file_name: String,
    /// Archive bytes.
    pub archive: Vec<u8>,
    /// Run summary.
    pub report: ExportReport,
}

impl ExportArtifact {
    /// Hand the archive to `sink`.
    pub fn deliver(&self, sink: &mut impl ArtifactSink) -> ExportResult<()> {
        sink.deliver(&self.file_name, &self.archive)
    }
}

/// Records phase transitions for logging and the report.
struct PhaseTracker {
    phases: Vec<ExportPhase>,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phases: vec![ExportPhase::Idle],
        }
    }

    fn enter(&mut self, phase: ExportPhase) {
        info!(phase = %phase, "Export phase");
        self.phases.push(phase);
    }
}

/// Two-pass spritesheet exporter.
#[derive(Debug, Clone, Default)]
pub struct SpritesheetExporter<C = ZipArchiver> {
    codec: C,
    png: PngConfig,
}

impl SpritesheetExporter<ZipArchiver> {
    /// Exporter producing a deflated ZIP with default PNG settings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: ArchiveCodec> SpritesheetExporter<C> {
    /// Exporter using a custom archive codec.
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            png: PngConfig::default(),
        }
    }

    /// Set the PNG configuration.
    pub fn png_config(mut self, png: PngConfig) -> Self {
        self.png = png;
        self
    }

    /// Run both passes over `mesh` and archive the results.
    ///
    /// `mesh` is borrowed mutably for the material override and is always
    /// handed back with its captured materials, whether or not the passes
    /// succeed. If restoring fails after a pass failure, the returned
    /// [`ExportError::RestoreFailed`] carries both, with the pass failure
    /// as its source.
    pub async fn export<N, B>(
        &self,
        mesh: &mut N,
        backend: &mut B,
        request: &ExportRequest<'_, N::Material>,
    ) -> ExportResult<ExportArtifact>
    where
        N: MeshNode + Sync,
        B: Playback<N> + FrameRenderer<N>,
    {
        let layout = compute_layout(request.cell_size, request.fps, request.clip.duration)?;
        info!(
            clip = %request.clip.name,
            camera = request.camera,
            frames = layout.frame_count,
            grid = layout.grid_dim,
            atlas_width = layout.atlas_width,
            atlas_height = layout.atlas_height,
            "Starting spritesheet export"
        );

        let mut tracker = PhaseTracker::new();
        let snapshot = capture(&*mesh);
        tracker.enter(ExportPhase::CapturedOriginal);

        let passes = self
            .run_passes(mesh, backend, request, &layout, &mut tracker)
            .await;
        let restored = restore(mesh, &snapshot);
        drop(snapshot);

        let (diffuse, normal, diffuse_ms, normal_ms) = match (passes, restored) {
            (Ok(passes), Ok(())) => passes,
            (Ok(_), Err(restore_err)) => return Err(restore_err),
            (Err(pass_err), Ok(())) => {
                error!(error = %pass_err, "Export failed; original materials restored");
                return Err(pass_err);
            }
            (Err(pass_err), Err(restore_err)) => {
                error!(error = %pass_err, restore_error = %restore_err, "Export failed and materials could not be restored");
                return Err(ExportError::RestoreFailed {
                    primary: Box::new(pass_err),
                    restore: Box::new(restore_err),
                });
            }
        };
        tracker.enter(ExportPhase::Restored);

        let diffuse = NamedImage::new(
            format!("{}.png", DIFFUSE_ENTRY),
            encode_rgba_blocking(diffuse, self.png.clone()).await?,
        );
        let normal = NamedImage::new(
            format!("{}.png", NORMAL_ENTRY),
            encode_rgba_blocking(normal, self.png.clone()).await?,
        );
        let entries = [diffuse, normal];
        let archive = self.codec.assemble(&entries)?;
        tracker.enter(ExportPhase::Archived);

        let [diffuse, normal] = entries;
        let file_name = format!("{}.{}", ARTIFACT_STEM, self.codec.extension());
        tracker.enter(ExportPhase::Done);
        info!(file = %file_name, bytes = archive.len(), "Spritesheet export complete");

        Ok(ExportArtifact {
            diffuse,
            normal,
            file_name,
            report: ExportReport {
                layout,
                phases: tracker.phases,
                diffuse_ms,
                normal_ms,
                archive_bytes: archive.len(),
            },
            archive,
        })
    }

    async fn run_passes<N, B>(
        &self,
        mesh: &mut N,
        backend: &mut B,
        request: &ExportRequest<'_, N::Material>,
        layout: &GridLayout,
        tracker: &mut PhaseTracker,
    ) -> ExportResult<(RasterImage, RasterImage, u64, u64)>
    where
        N: MeshNode + Sync,
        B: Playback<N> + FrameRenderer<N>,
    {
        let mut ctx = PassContext {
            clip: request.clip,
            layout,
            camera: request.camera,
            cancel: &request.cancel,
            pass: DIFFUSE_ENTRY,
        };

        let started = Instant::now();
        let diffuse = sample_to_atlas(mesh, backend, ctx).await?.finish()?;
        let diffuse_ms = started.elapsed().as_millis() as u64;
        tracker.enter(ExportPhase::DiffusePassDone);

        let overridden = override_all(mesh, &request.normal_material);
        info!(nodes = overridden, "Applied normal material");
        tracker.enter(ExportPhase::OverrideApplied);

        ctx.pass = NORMAL_ENTRY;
        let started = Instant::now();
        let normal = sample_to_atlas(mesh, backend, ctx).await?.finish()?;
        let normal_ms = started.elapsed().as_millis() as u64;
        tracker.enter(ExportPhase::NormalPassDone);

        Ok((diffuse, normal, diffuse_ms, normal_ms))
    }
}

/// Export with a deflated ZIP and default PNG settings.
pub async fn export_spritesheet<N, B>(
    mesh: &mut N,
    backend: &mut B,
    request: &ExportRequest<'_, N::Material>,
) -> ExportResult<ExportArtifact>
where
    N: MeshNode + Sync,
    B: Playback<N> + FrameRenderer<N>,
{
    SpritesheetExporter::new().export(mesh, backend, request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(ExportPhase::Idle.to_string(), "idle");
        assert_eq!(ExportPhase::NormalPassDone.as_str(), "normal_pass_done");
    }

    #[test]
    fn test_tracker_starts_idle() {
        let mut tracker = PhaseTracker::new();
        tracker.enter(ExportPhase::CapturedOriginal);
        assert_eq!(
            tracker.phases,
            [ExportPhase::Idle, ExportPhase::CapturedOriginal]
        );
    }
}
