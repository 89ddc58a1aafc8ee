//! Fixed-step frame sampling into an atlas.
//!
//! Playback state is cumulative, so frames are rendered and composited one
//! at a time in frame order. The only suspension point is the render call.

use tracing::{debug, trace};

use crate::cancel::CancellationToken;
use crate::error::{ExportError, ExportResult};
use crate::layout::GridLayout;
use crate::raster::AtlasSurface;
use crate::render::{AnimationClip, FrameRenderer, Playback};

/// Inputs shared by every frame of one pass.
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    /// Clip to play.
    pub clip: &'a AnimationClip,
    /// Grid geometry.
    pub layout: &'a GridLayout,
    /// Camera to render through.
    pub camera: &'a str,
    /// Checked before each frame.
    pub cancel: &'a CancellationToken,
    /// Pass name used in logs and cancellation errors.
    pub pass: &'static str,
}

/// Render every frame of `clip` and composite it into a fresh atlas.
///
/// Frame `k` is rendered at playback time `k / fps`: playback is advanced by
/// zero before the first frame so the initial pose is applied, then by one
/// frame step before each later frame.
pub async fn sample_to_atlas<N, B>(
    scene: &mut N,
    backend: &mut B,
    ctx: PassContext<'_>,
) -> ExportResult<AtlasSurface>
where
    N: Sync,
    B: Playback<N> + FrameRenderer<N>,
{
    let layout = ctx.layout;
    let step = layout.frame_step();
    let mut atlas = AtlasSurface::new(*layout);

    backend.set_size(layout.cell_size);
    backend.start(scene, ctx.clip);
    debug!(
        pass = ctx.pass,
        clip = %ctx.clip.name,
        frames = layout.frame_count,
        grid = layout.grid_dim,
        "Sampling clip"
    );

    for frame in 0..layout.frame_count {
        if ctx.cancel.is_cancelled() {
            return Err(ExportError::Cancelled { phase: ctx.pass });
        }

        backend.advance(scene, if frame == 0 { 0.0 } else { step });

        let raster = backend
            .render(scene, ctx.camera)
            .await
            .map_err(|e| ExportError::render_failed(frame, e.message))?;

        trace!(pass = ctx.pass, frame, cell = ?layout.cell_of(frame), "Compositing frame");
        atlas.place_next(&raster)?;
    }

    Ok(atlas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, CellSize};
    use crate::raster::RasterImage;
    use crate::render::RenderError;
    use async_trait::async_trait;

    /// Playback clock plus a renderer that encodes the frame time in red.
    #[derive(Default)]
    struct Clock {
        time: f64,
        size: Option<CellSize>,
        rendered_at: Vec<f64>,
        fail_at: Option<usize>,
        wrong_size_at: Option<usize>,
    }

    impl Playback<()> for Clock {
        fn start(&mut self, _: &mut (), _: &AnimationClip) {
            self.time = 0.0;
        }

        fn advance(&mut self, _: &mut (), dt: f64) {
            self.time += dt;
        }
    }

    #[async_trait]
    impl FrameRenderer<()> for Clock {
        fn set_size(&mut self, size: CellSize) {
            self.size = Some(size);
        }

        async fn render(&mut self, _: &(), _: &str) -> Result<RasterImage, RenderError> {
            let index = self.rendered_at.len();
            self.rendered_at.push(self.time);
            if self.fail_at == Some(index) {
                return Err(RenderError::new("context lost"));
            }
            let size = self.size.unwrap_or(CellSize::new(1, 1));
            let width = if self.wrong_size_at == Some(index) {
                size.width + 1
            } else {
                size.width
            };
            Ok(RasterImage::filled(width, size.height, [index as u8, 0, 0, 255]))
        }
    }

    fn ctx<'a>(
        clip: &'a AnimationClip,
        layout: &'a GridLayout,
        cancel: &'a CancellationToken,
    ) -> PassContext<'a> {
        PassContext {
            clip,
            layout,
            camera: "main",
            cancel,
            pass: "test",
        }
    }

    #[tokio::test]
    async fn test_frames_sampled_at_fixed_steps() {
        let clip = AnimationClip::new("walk", 0.5);
        let layout = compute_layout(CellSize::new(2, 2), 10, clip.duration).unwrap();
        let cancel = CancellationToken::new();
        let mut clock = Clock::default();

        let atlas = sample_to_atlas(&mut (), &mut clock, ctx(&clip, &layout, &cancel))
            .await
            .unwrap();

        assert_eq!(clock.size, Some(CellSize::new(2, 2)));
        assert_eq!(clock.rendered_at.len(), 5);
        for (k, t) in clock.rendered_at.iter().enumerate() {
            assert!((t - k as f64 / 10.0).abs() < 1e-9, "frame {k} at {t}");
        }

        let image = atlas.finish().unwrap();
        assert_eq!(image.size(), (6, 6));
        for k in 0..5u32 {
            let (x, y) = layout.cell_origin(k);
            assert_eq!(image.get(x, y)[0], k as u8);
        }
    }

    #[tokio::test]
    async fn test_render_error_aborts_pass() {
        let clip = AnimationClip::new("walk", 1.0);
        let layout = compute_layout(CellSize::new(2, 2), 4, clip.duration).unwrap();
        let cancel = CancellationToken::new();
        let mut clock = Clock {
            fail_at: Some(2),
            ..Default::default()
        };

        let err = sample_to_atlas(&mut (), &mut clock, ctx(&clip, &layout, &cancel))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::RenderFailed { frame: 2, .. }));
        assert_eq!(clock.rendered_at.len(), 3);
    }

    #[tokio::test]
    async fn test_wrong_frame_size_aborts_pass() {
        let clip = AnimationClip::new("walk", 1.0);
        let layout = compute_layout(CellSize::new(3, 3), 4, clip.duration).unwrap();
        let cancel = CancellationToken::new();
        let mut clock = Clock {
            wrong_size_at: Some(1),
            ..Default::default()
        };

        let err = sample_to_atlas(&mut (), &mut clock, ctx(&clip, &layout, &cancel))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::FrameSizeMismatch {
                frame: 1,
                expected: (3, 3),
                actual: (4, 3)
            }
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_frame() {
        let clip = AnimationClip::new("walk", 1.0);
        let layout = compute_layout(CellSize::new(2, 2), 4, clip.duration).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut clock = Clock::default();

        let err = sample_to_atlas(&mut (), &mut clock, ctx(&clip, &layout, &cancel))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Cancelled { phase: "test" }));
        assert!(clock.rendered_at.is_empty());
    }
}
