//! Grid layout for spritesheet atlases.
//!
//! Frames are sampled at a fixed rate and packed into a square grid of
//! equally sized cells, filled left-to-right then top-to-bottom.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};

/// Size of one atlas cell in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CellSize {
    /// Create a new cell size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the size as a `(width, height)` pair.
    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Derived grid geometry for one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Size of each cell.
    pub cell_size: CellSize,
    /// Frames per second used for sampling.
    pub fps: u32,
    /// Number of frames sampled from the clip (always at least 1).
    pub frame_count: u32,
    /// Number of cells along each side of the grid.
    pub grid_dim: u32,
    /// Atlas width in pixels.
    pub atlas_width: u32,
    /// Atlas height in pixels.
    pub atlas_height: u32,
}

impl GridLayout {
    /// Seconds of playback between two consecutive frames.
    pub fn frame_step(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Grid cell `(col, row)` for a frame index.
    pub fn cell_of(&self, frame_index: u32) -> (u32, u32) {
        (frame_index % self.grid_dim, frame_index / self.grid_dim)
    }

    /// Top-left pixel of the cell holding a frame.
    pub fn cell_origin(&self, frame_index: u32) -> (u32, u32) {
        let (col, row) = self.cell_of(frame_index);
        (col * self.cell_size.width, row * self.cell_size.height)
    }

    /// Atlas size as a `(width, height)` pair.
    pub fn atlas_size(&self) -> (u32, u32) {
        (self.atlas_width, self.atlas_height)
    }
}

/// Largest atlas edge, in pixels, a PNG can hold.
pub const MAX_ATLAS_DIMENSION: u32 = i32::MAX as u32;

/// Upper bound on the RGBA8 bytes of one atlas (1 GiB, 16384x16384).
pub const MAX_ATLAS_BYTES: u64 = 1 << 30;

/// Compute the grid layout for a clip.
///
/// `frame_count = round(duration * fps)`, clamped to at least one frame so a
/// zero-length clip still produces a single-cell atlas. The grid is the
/// smallest square holding every frame. Atlases wider or taller than
/// [`MAX_ATLAS_DIMENSION`], or larger than [`MAX_ATLAS_BYTES`], are rejected.
pub fn compute_layout(cell_size: CellSize, fps: u32, clip_duration: f64) -> ExportResult<GridLayout> {
    if cell_size.width == 0 || cell_size.height == 0 {
        return Err(ExportError::invalid_configuration(format!(
            "cell size must be at least 1x1, got {}x{}",
            cell_size.width, cell_size.height
        )));
    }
    if fps == 0 {
        return Err(ExportError::invalid_configuration("fps must be at least 1"));
    }
    if !clip_duration.is_finite() || clip_duration < 0.0 {
        return Err(ExportError::invalid_configuration(format!(
            "clip duration must be a non-negative number of seconds, got {}",
            clip_duration
        )));
    }

    let frames = (clip_duration * fps as f64).round();
    if frames > u32::MAX as f64 {
        return Err(ExportError::invalid_configuration(format!(
            "clip of {}s at {} fps has too many frames",
            clip_duration, fps
        )));
    }
    let frame_count = (frames as u32).max(1);
    let grid_dim = ceil_sqrt(frame_count);

    let atlas_width = cell_size.width.checked_mul(grid_dim);
    let atlas_height = cell_size.height.checked_mul(grid_dim);
    let (Some(atlas_width), Some(atlas_height)) = (atlas_width, atlas_height) else {
        return Err(ExportError::invalid_configuration(format!(
            "atlas for {} frames of {}x{} exceeds the maximum image size",
            frame_count, cell_size.width, cell_size.height
        )));
    };
    let atlas_bytes = atlas_width as u64 * atlas_height as u64 * 4;
    if atlas_width > MAX_ATLAS_DIMENSION
        || atlas_height > MAX_ATLAS_DIMENSION
        || atlas_bytes > MAX_ATLAS_BYTES
    {
        return Err(ExportError::invalid_configuration(format!(
            "atlas of {}x{} for {} frames exceeds the {} byte limit",
            atlas_width, atlas_height, frame_count, MAX_ATLAS_BYTES
        )));
    }

    Ok(GridLayout {
        cell_size,
        fps,
        frame_count,
        grid_dim,
        atlas_width,
        atlas_height,
    })
}

/// Smallest `d` with `d * d >= n`.
fn ceil_sqrt(n: u32) -> u32 {
    let n = n as u64;
    let mut d = (n as f64).sqrt().ceil() as u64;
    // Correct for floating point error at large n.
    while d * d < n {
        d += 1;
    }
    while d > 1 && (d - 1) * (d - 1) >= n {
        d -= 1;
    }
    d as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_at_thirty_fps() {
        let layout = compute_layout(CellSize::new(150, 150), 30, 1.0).unwrap();
        assert_eq!(layout.frame_count, 30);
        assert_eq!(layout.grid_dim, 6);
        assert_eq!(layout.atlas_size(), (900, 900));
        assert_eq!(layout.cell_of(29), (5, 4));
        assert_eq!(layout.cell_origin(29), (750, 600));
    }

    #[test]
    fn test_zero_duration_yields_one_frame() {
        for fps in [1, 24, 60] {
            let layout = compute_layout(CellSize::new(64, 32), fps, 0.0).unwrap();
            assert_eq!(layout.frame_count, 1);
            assert_eq!(layout.grid_dim, 1);
            assert_eq!(layout.atlas_size(), (64, 32));
        }
    }

    #[test]
    fn test_short_clip_rounds_down_to_one_frame() {
        // 0.01s * 30fps = 0.3 frames, rounds to 0, clamped to 1.
        let layout = compute_layout(CellSize::new(10, 10), 30, 0.01).unwrap();
        assert_eq!(layout.frame_count, 1);
    }

    #[test]
    fn test_frame_count_rounds_to_nearest() {
        let layout = compute_layout(CellSize::new(8, 8), 10, 1.25).unwrap();
        assert_eq!(layout.frame_count, 13); // 12.5 rounds up
        assert_eq!(layout.grid_dim, 4);

        let layout = compute_layout(CellSize::new(8, 8), 10, 1.24).unwrap();
        assert_eq!(layout.frame_count, 12);
    }

    #[test]
    fn test_perfect_square_is_not_padded() {
        let layout = compute_layout(CellSize::new(16, 16), 16, 1.0).unwrap();
        assert_eq!(layout.frame_count, 16);
        assert_eq!(layout.grid_dim, 4);
        assert_eq!(layout.cell_origin(15), (48, 48));
    }

    #[test]
    fn test_grid_always_holds_every_frame() {
        for fps in 1..=60 {
            for tenths in 0..=50 {
                let duration = tenths as f64 / 10.0;
                let cell = CellSize::new(7, 5);
                let layout = compute_layout(cell, fps, duration).unwrap();
                let dim = layout.grid_dim;
                assert!(dim * dim >= layout.frame_count);
                assert!(dim == 1 || (dim - 1) * (dim - 1) < layout.frame_count);
                assert_eq!(layout.atlas_width, cell.width * dim);
                assert_eq!(layout.atlas_height, cell.height * dim);
            }
        }
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let invalid = [
            compute_layout(CellSize::new(0, 10), 30, 1.0),
            compute_layout(CellSize::new(10, 0), 30, 1.0),
            compute_layout(CellSize::new(10, 10), 0, 1.0),
            compute_layout(CellSize::new(10, 10), 30, -1.0),
            compute_layout(CellSize::new(10, 10), 30, f64::NAN),
            compute_layout(CellSize::new(u32::MAX, 10), 30, 1.0),
        ];
        for result in invalid {
            assert!(matches!(
                result,
                Err(ExportError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn test_oversized_atlas_rejected() {
        let huge = compute_layout(CellSize::new(4_000_000_000, 4_000_000_000), 1, 1.0);
        assert!(matches!(huge, Err(ExportError::InvalidConfiguration { .. })));

        // 16384x16384 RGBA is exactly the byte limit.
        let at_limit = compute_layout(CellSize::new(8192, 8192), 4, 1.0).unwrap();
        assert_eq!(at_limit.atlas_size(), (16384, 16384));
        let over = compute_layout(CellSize::new(8192, 8193), 4, 1.0);
        assert!(matches!(over, Err(ExportError::InvalidConfiguration { .. })));

        // Many tiny frames can still overflow the byte limit.
        let long_clip = compute_layout(CellSize::new(1, 1), 1000, 1.0e6);
        assert!(matches!(long_clip, Err(ExportError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_ceil_sqrt() {
        assert_eq!(ceil_sqrt(1), 1);
        assert_eq!(ceil_sqrt(2), 2);
        assert_eq!(ceil_sqrt(4), 2);
        assert_eq!(ceil_sqrt(5), 3);
        assert_eq!(ceil_sqrt(30), 6);
        assert_eq!(ceil_sqrt(u32::MAX), 65536);
    }
}
