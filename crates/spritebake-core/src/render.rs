//! Seams to the host's animation engine and renderer.
//!
//! The exporter drives playback in fixed steps and asks for one raster per
//! step. Both services are opaque: playback mutates pose state in place and
//! the renderer reads it implicitly from the scene.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::CellSize;
use crate::raster::RasterImage;

/// An animation clip known to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    /// Clip name.
    pub name: String,
    /// Duration in seconds.
    pub duration: f64,
}

impl AnimationClip {
    /// Create a clip.
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// Failure reported by a renderer.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RenderError {
    /// What went wrong.
    pub message: String,
}

impl RenderError {
    /// Create a render error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Animation playback over a scene of type `N`.
pub trait Playback<N> {
    /// Start `clip` from time zero on `scene`.
    fn start(&mut self, scene: &mut N, clip: &AnimationClip);

    /// Advance playback by `dt` seconds, updating the pose in place.
    fn advance(&mut self, scene: &mut N, dt: f64);
}

/// Renders the current state of a scene of type `N`.
#[async_trait]
pub trait FrameRenderer<N: Sync>: Send {
    /// Set the output size for subsequent renders.
    fn set_size(&mut self, size: CellSize);

    /// Render the scene through the named camera.
    async fn render(&mut self, scene: &N, camera: &str) -> Result<RasterImage, RenderError>;
}

/// A playback engine and a renderer driven together.
#[derive(Debug, Clone, Default)]
pub struct RenderPipeline<P, R> {
    /// Animation playback.
    pub playback: P,
    /// Frame renderer.
    pub renderer: R,
}

impl<P, R> RenderPipeline<P, R> {
    /// Pair a playback engine with a renderer.
    pub fn new(playback: P, renderer: R) -> Self {
        Self { playback, renderer }
    }
}

impl<N, P: Playback<N>, R> Playback<N> for RenderPipeline<P, R> {
    fn start(&mut self, scene: &mut N, clip: &AnimationClip) {
        self.playback.start(scene, clip);
    }

    fn advance(&mut self, scene: &mut N, dt: f64) {
        self.playback.advance(scene, dt);
    }
}

#[async_trait]
impl<N, P, R> FrameRenderer<N> for RenderPipeline<P, R>
where
    N: Sync,
    P: Send,
    R: FrameRenderer<N>,
{
    fn set_size(&mut self, size: CellSize) {
        self.renderer.set_size(size);
    }

    async fn render(&mut self, scene: &N, camera: &str) -> Result<RasterImage, RenderError> {
        self.renderer.render(scene, camera).await
    }
}
