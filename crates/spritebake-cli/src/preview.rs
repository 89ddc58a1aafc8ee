//! Software preview renderer.
//!
//! Draws each renderable node of a [`SceneNode`] tree as a vertical bar in
//! its material's color. Bar heights swing with clip playback so frames of
//! an animation are visibly different. Normal-shaded nodes are drawn as a
//! cylinder-like normal map.

use std::collections::HashMap;
use std::f64::consts::TAU;

use async_trait::async_trait;
use spritebake_core::{
    AnimationClip, CellSize, FrameRenderer, MaterialSlot, NodeKind, Playback, RasterImage,
    RenderError, SceneNode, Shading,
};

use crate::scene_file::CameraDesc;

/// Playback clock and rasterizer for scene files.
#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    cameras: HashMap<String, f64>,
    size: CellSize,
    duration: f64,
    time: f64,
}

impl PreviewRenderer {
    /// Create a renderer for the given cameras.
    pub fn new(cameras: &[CameraDesc]) -> Self {
        Self {
            cameras: cameras.iter().map(|c| (c.name.clone(), c.zoom)).collect(),
            size: CellSize::new(1, 1),
            duration: 0.0,
            time: 0.0,
        }
    }

    /// Current playback time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Normalized clip phase in `[0, 1)`; zero-length clips hold phase 0.
    fn phase(&self) -> f64 {
        if self.duration > 0.0 {
            (self.time / self.duration).fract()
        } else {
            0.0
        }
    }
}

/// Renderable nodes in draw order with the first material of each.
fn renderables(node: &SceneNode, out: &mut Vec<Shading>) {
    if node.kind != NodeKind::Structural {
        let first = node.material.as_ref().and_then(|slot| match slot {
            MaterialSlot::Single(m) => Some(m),
            MaterialSlot::Multi(ms) => ms.first(),
        });
        if let Some(material) = first {
            out.push(material.shading.clone());
        }
    }
    for child in &node.children {
        renderables(child, out);
    }
}

fn normal_color(nx: f64) -> [u8; 4] {
    let nz = (1.0 - nx * nx).max(0.0).sqrt();
    let to_byte = |v: f64| ((v * 0.5 + 0.5) * 255.0).round() as u8;
    [to_byte(nx), 128, to_byte(nz), 255]
}

impl Playback<SceneNode> for PreviewRenderer {
    fn start(&mut self, _scene: &mut SceneNode, clip: &AnimationClip) {
        self.duration = clip.duration;
        self.time = 0.0;
    }

    fn advance(&mut self, _scene: &mut SceneNode, dt: f64) {
        self.time += dt;
    }
}

#[async_trait]
impl FrameRenderer<SceneNode> for PreviewRenderer {
    fn set_size(&mut self, size: CellSize) {
        self.size = size;
    }

    async fn render(&mut self, scene: &SceneNode, camera: &str) -> Result<RasterImage, RenderError> {
        let zoom = *self
            .cameras
            .get(camera)
            .ok_or_else(|| RenderError::new(format!("unknown camera '{}'", camera)))?;

        let CellSize { width, height } = self.size;
        let mut image = RasterImage::new(width, height);

        let mut shadings = Vec::new();
        renderables(scene, &mut shadings);
        if shadings.is_empty() {
            return Ok(image);
        }

        let slot = width / shadings.len() as u32;
        let bar_width = ((slot as f64 * 0.8 * zoom) as u32).clamp(1, slot.max(1));
        for (i, shading) in shadings.iter().enumerate() {
            // Each bar swings a quarter cycle out of step with its neighbour.
            let swing = ((self.phase() + i as f64 * 0.25) * TAU).sin() * 0.5 + 0.5;
            let bar_height = ((height as f64 * (0.25 + 0.75 * swing) * zoom) as u32).min(height);
            let x0 = i as u32 * slot + (slot.saturating_sub(bar_width)) / 2;
            let y0 = height - bar_height;

            match shading {
                Shading::Flat { color } => image.fill_rect(x0, y0, bar_width, bar_height, *color),
                Shading::Normal => {
                    for dx in 0..bar_width {
                        let nx = (dx as f64 + 0.5) / bar_width as f64 * 2.0 - 1.0;
                        image.fill_rect(x0 + dx, y0, 1, bar_height, normal_color(nx));
                    }
                }
            }
        }
        Ok(image)
    }
}
