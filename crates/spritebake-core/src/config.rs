//! Export configuration as collected from the user.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use crate::layout::CellSize;
use crate::render::AnimationClip;

/// Default cell edge length in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 150;

/// Default sampling rate.
pub const DEFAULT_FPS: u32 = 30;

/// User-facing export options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Animation to export; the first clip when unset.
    pub animation: Option<String>,
    /// Camera to render through; the host's current camera when unset.
    pub camera: Option<String>,
    /// Cell width in pixels.
    pub cell_width: u32,
    /// Cell height in pixels.
    pub cell_height: u32,
    /// Frames sampled per second of animation.
    pub fps: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            animation: None,
            camera: None,
            cell_width: DEFAULT_CELL_SIZE,
            cell_height: DEFAULT_CELL_SIZE,
            fps: DEFAULT_FPS,
        }
    }
}

impl ExportConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> ExportResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExportError::invalid_configuration(format!("malformed config: {}", e)))
    }

    /// Cell size as configured.
    pub fn cell_size(&self) -> CellSize {
        CellSize::new(self.cell_width, self.cell_height)
    }

    /// Reject values that cannot produce an atlas.
    pub fn validate(&self) -> ExportResult<()> {
        if self.cell_width == 0 || self.cell_height == 0 {
            return Err(ExportError::invalid_configuration(format!(
                "cell size must be at least 1x1, got {}x{}",
                self.cell_width, self.cell_height
            )));
        }
        if self.fps == 0 {
            return Err(ExportError::invalid_configuration("fps must be at least 1"));
        }
        Ok(())
    }

    /// Pick the configured clip from the ones available.
    pub fn resolve_clip<'a>(&self, clips: &'a [AnimationClip]) -> ExportResult<&'a AnimationClip> {
        let clip = match &self.animation {
            Some(name) => clips.iter().find(|c| &c.name == name).ok_or_else(|| {
                ExportError::invalid_configuration(format!("unknown animation '{}'", name))
            })?,
            None => clips
                .first()
                .ok_or_else(|| ExportError::invalid_configuration("object has no animations"))?,
        };

        if !clip.duration.is_finite() || clip.duration < 0.0 {
            return Err(ExportError::invalid_configuration(format!(
                "animation '{}' has invalid duration {}",
                clip.name, clip.duration
            )));
        }
        Ok(clip)
    }

    /// Pick the configured camera, falling back to `current`.
    ///
    /// Whichever name is chosen must be one of `cameras`.
    pub fn resolve_camera<'a>(&'a self, cameras: &'a [String], current: &'a str) -> ExportResult<&'a str> {
        let (name, source) = match &self.camera {
            Some(name) => (name.as_str(), "camera"),
            None => (current, "default camera"),
        };
        if cameras.iter().any(|c| c == name) {
            Ok(name)
        } else {
            Err(ExportError::invalid_configuration(format!(
                "unknown {} '{}'",
                source, name
            )))
        }
    }
}
