//! RGBA8 raster buffers and the atlas surface frames are composited into.

use crate::error::{ExportError, ExportResult};
use crate::layout::GridLayout;

/// Bytes per RGBA8 pixel.
const CHANNELS: usize = 4;

/// An RGBA8 image (row-major, unpremultiplied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Create a fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Create an image filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            data: rgba.repeat(pixels),
        }
    }

    /// Wrap existing RGBA8 bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> ExportResult<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(ExportError::encoding_failure(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Size as a `(width, height)` pair.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Get a pixel.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Set a pixel.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Fill a rectangle, clipped to the image bounds.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, rgba: [u8; 4]) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for py in y.min(self.height)..y_end {
            for px in x.min(self.width)..x_end {
                self.set(px, py, rgba);
            }
        }
    }

    /// Copy `src` into this image with its top-left corner at `(x, y)`.
    ///
    /// Pixels are replaced, not blended. The source must fit entirely.
    pub fn blit(&mut self, src: &RasterImage, x: u32, y: u32) -> ExportResult<()> {
        let fits_x = x.checked_add(src.width).is_some_and(|end| end <= self.width);
        let fits_y = y.checked_add(src.height).is_some_and(|end| end <= self.height);
        if !fits_x || !fits_y {
            return Err(ExportError::encoding_failure(format!(
                "{}x{} image at ({}, {}) does not fit in {}x{}",
                src.width, src.height, x, y, self.width, self.height
            )));
        }

        let row_bytes = src.width as usize * CHANNELS;
        for row in 0..src.height {
            let src_start = src.offset(0, row);
            let dst_start = self.offset(x, y + row);
            self.data[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src.data[src_start..src_start + row_bytes]);
        }
        Ok(())
    }
}

/// Atlas being filled one cell per frame.
///
/// Owned by a single pass; [`AtlasSurface::finish`] hands the image out
/// only once every frame has been placed.
#[derive(Debug)]
pub struct AtlasSurface {
    layout: GridLayout,
    image: RasterImage,
    placed: u32,
}

impl AtlasSurface {
    /// Create a transparent atlas sized for `layout`.
    pub fn new(layout: GridLayout) -> Self {
        Self {
            image: RasterImage::new(layout.atlas_width, layout.atlas_height),
            layout,
            placed: 0,
        }
    }

    /// Layout this surface was created for.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Number of frames placed so far.
    pub fn frames_placed(&self) -> u32 {
        self.placed
    }

    /// Copy the next frame into its cell.
    ///
    /// Frames are placed in raster order; the frame must be exactly one cell.
    pub fn place_next(&mut self, frame: &RasterImage) -> ExportResult<()> {
        let index = self.placed;
        if index >= self.layout.frame_count {
            return Err(ExportError::encoding_failure(format!(
                "atlas already holds all {} frames",
                self.layout.frame_count
            )));
        }
        let expected = self.layout.cell_size.as_tuple();
        if frame.size() != expected {
            return Err(ExportError::FrameSizeMismatch {
                frame: index,
                expected,
                actual: frame.size(),
            });
        }

        let (x, y) = self.layout.cell_origin(index);
        self.image.blit(frame, x, y)?;
        self.placed += 1;
        Ok(())
    }

    /// Finished atlas image.
    pub fn finish(self) -> ExportResult<RasterImage> {
        if self.placed != self.layout.frame_count {
            return Err(ExportError::encoding_failure(format!(
                "atlas incomplete: {} of {} frames placed",
                self.placed, self.layout.frame_count
            )));
        }
        Ok(self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, CellSize};

    #[test]
    fn test_filled_and_get() {
        let img = RasterImage::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(img.data.len(), 24);
        assert_eq!(img.get(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(RasterImage::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(RasterImage::from_rgba(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_blit_copies_rows() {
        let mut dst = RasterImage::new(4, 4);
        let src = RasterImage::filled(2, 2, [255, 0, 0, 255]);
        dst.blit(&src, 1, 2).unwrap();

        assert_eq!(dst.get(0, 2), [0, 0, 0, 0]);
        assert_eq!(dst.get(1, 2), [255, 0, 0, 255]);
        assert_eq!(dst.get(2, 3), [255, 0, 0, 255]);
        assert_eq!(dst.get(3, 3), [0, 0, 0, 0]);
        assert_eq!(dst.get(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_blit_out_of_bounds() {
        let mut dst = RasterImage::new(4, 4);
        let src = RasterImage::new(2, 2);
        assert!(dst.blit(&src, 3, 0).is_err());
        assert!(dst.blit(&src, 0, u32::MAX).is_err());
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut img = RasterImage::new(4, 4);
        img.fill_rect(3, 3, 10, 10, [9, 9, 9, 9]);
        assert_eq!(img.get(3, 3), [9, 9, 9, 9]);
        assert_eq!(img.get(2, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn test_atlas_places_in_raster_order() {
        // 5 frames -> 3x3 grid of 2x2 cells.
        let layout = compute_layout(CellSize::new(2, 2), 5, 1.0).unwrap();
        let mut atlas = AtlasSurface::new(layout);

        for i in 0..5u8 {
            atlas.place_next(&RasterImage::filled(2, 2, [i, 0, 0, 255])).unwrap();
        }
        let image = atlas.finish().unwrap();

        assert_eq!(image.size(), (6, 6));
        assert_eq!(image.get(0, 0)[0], 0);
        assert_eq!(image.get(2, 0)[0], 1);
        assert_eq!(image.get(4, 0)[0], 2);
        assert_eq!(image.get(0, 2)[0], 3);
        assert_eq!(image.get(3, 3)[0], 4);
        // Unused cells stay transparent.
        assert_eq!(image.get(5, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn test_atlas_rejects_wrong_frame_size() {
        let layout = compute_layout(CellSize::new(4, 4), 1, 1.0).unwrap();
        let mut atlas = AtlasSurface::new(layout);
        let err = atlas.place_next(&RasterImage::new(4, 3)).unwrap_err();
        assert!(matches!(
            err,
            ExportError::FrameSizeMismatch {
                frame: 0,
                expected: (4, 4),
                actual: (4, 3)
            }
        ));
    }

    #[test]
    fn test_atlas_finish_requires_all_frames() {
        let layout = compute_layout(CellSize::new(1, 1), 2, 1.0).unwrap();
        let mut atlas = AtlasSurface::new(layout);
        atlas.place_next(&RasterImage::new(1, 1)).unwrap();
        assert_eq!(atlas.frames_placed(), 1);
        assert!(atlas.finish().is_err());
    }
}
