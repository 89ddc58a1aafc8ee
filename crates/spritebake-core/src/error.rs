//! Error types for spritesheet export.

use thiserror::Error;

use crate::scene::NodeId;

/// Result type for spritesheet export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while exporting a spritesheet.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Cell size, frame rate or clip duration is not usable.
    #[error("Invalid export configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The renderer returned a raster that does not match the cell size.
    #[error("Frame {frame} has size {actual:?}, expected cell size {expected:?}")]
    FrameSizeMismatch {
        frame: u32,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The mesh hierarchy changed shape between capture and restore.
    #[error("Material snapshot does not match hierarchy at node '{id}'")]
    SnapshotMismatch { id: NodeId },

    /// Image or archive encoding failed.
    #[error("Encoding failed: {message}")]
    EncodingFailure { message: String },

    /// The renderer reported an error for a frame.
    #[error("Render failed at frame {frame}: {message}")]
    RenderFailed { frame: u32, message: String },

    /// The export was cancelled between frames.
    #[error("Export cancelled during {phase}")]
    Cancelled { phase: &'static str },

    /// Writing the finished archive to its destination failed.
    #[error("Failed to deliver artifact: {0}")]
    Delivery(#[from] std::io::Error),

    /// A pass failed and restoring the original materials failed as well.
    #[error("{primary} (material restore also failed: {restore})")]
    RestoreFailed {
        #[source]
        primary: Box<ExportError>,
        restore: Box<ExportError>,
    },
}

impl ExportError {
    /// Creates a new invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Creates a new encoding failure error.
    pub fn encoding_failure(message: impl Into<String>) -> Self {
        Self::EncodingFailure {
            message: message.into(),
        }
    }

    /// Creates a new render failure error.
    pub fn render_failed(frame: u32, message: impl Into<String>) -> Self {
        Self::RenderFailed {
            frame,
            message: message.into(),
        }
    }

    /// Returns the stable error code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::InvalidConfiguration { .. } => "SPRITE_001",
            ExportError::FrameSizeMismatch { .. } => "SPRITE_002",
            ExportError::SnapshotMismatch { .. } => "SPRITE_003",
            ExportError::EncodingFailure { .. } => "SPRITE_004",
            ExportError::RenderFailed { .. } => "SPRITE_005",
            ExportError::Cancelled { .. } => "SPRITE_006",
            ExportError::Delivery(_) => "SPRITE_007",
            ExportError::RestoreFailed { .. } => "SPRITE_008",
        }
    }

    /// Returns the error category for grouping related errors.
    pub fn category(&self) -> &'static str {
        "spritebake"
    }

    /// Returns the error that caused the export to fail, looking through
    /// restore failures to the pass failure that triggered them.
    pub fn primary(&self) -> &ExportError {
        match self {
            ExportError::RestoreFailed { primary, .. } => primary.primary(),
            other => other,
        }
    }
}
