//! Deterministic PNG encoding of finished atlases.
//!
//! Fixed compression and filter settings give byte-identical output for
//! identical pixels.

use std::io::Write;

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};

use crate::error::{ExportError, ExportResult};
use crate::raster::RasterImage;

/// PNG export configuration.
#[derive(Debug, Clone)]
pub struct PngConfig {
    /// Compression level.
    pub compression: Compression,
    /// Row filter.
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

impl PngConfig {
    /// Smaller files, slower encode.
    pub fn best_compression() -> Self {
        Self {
            compression: Compression::Best,
            filter: FilterType::Paeth,
        }
    }

    /// Faster encode, larger files.
    pub fn fast() -> Self {
        Self {
            compression: Compression::Fast,
            filter: FilterType::NoFilter,
        }
    }
}

/// Write an RGBA image as PNG to any writer.
pub fn write_rgba_to_writer<W: Write>(
    image: &RasterImage,
    writer: W,
    config: &PngConfig,
) -> ExportResult<()> {
    let mut encoder = Encoder::new(writer, image.width, image.height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    let mut png_writer = encoder.write_header().map_err(png_failure)?;
    png_writer.write_image_data(&image.data).map_err(png_failure)?;
    png_writer.finish().map_err(png_failure)?;
    Ok(())
}

/// Encode an RGBA image to PNG bytes.
pub fn encode_rgba(image: &RasterImage, config: &PngConfig) -> ExportResult<Vec<u8>> {
    let mut data = Vec::new();
    write_rgba_to_writer(image, &mut data, config)?;
    Ok(data)
}

/// Encode on the blocking thread pool, suspending the caller until done.
pub async fn encode_rgba_blocking(image: RasterImage, config: PngConfig) -> ExportResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || encode_rgba(&image, &config))
        .await
        .map_err(|e| ExportError::encoding_failure(format!("PNG encoder task failed: {}", e)))?
}

fn png_failure(err: png::EncodingError) -> ExportError {
    ExportError::encoding_failure(format!("PNG encoding error: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RasterImage {
        let mut image = RasterImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.set(x, y, [(x * 4) as u8, (y * 4) as u8, 128, 255]);
            }
        }
        image
    }

    #[test]
    fn test_encode_deterministic() {
        let image = gradient(64, 64);
        let config = PngConfig::default();
        let a = encode_rgba(&image, &config).unwrap();
        let b = encode_rgba(&image, &config).unwrap();
        assert_eq!(a, b, "PNG data should be identical");
        assert_eq!(&a[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encoded_dimensions() {
        let image = gradient(12, 7);
        let bytes = encode_rgba(&image, &PngConfig::fast()).unwrap();

        let decoder = png::Decoder::new(bytes.as_slice());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (12, 7));
        assert_eq!(info.color_type, ColorType::Rgba);
    }

    #[test]
    fn test_round_trip_pixels() {
        let image = gradient(9, 5);
        let bytes = encode_rgba(&image, &PngConfig::best_compression()).unwrap();

        let mut reader = png::Decoder::new(bytes.as_slice()).read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf).unwrap();
        assert_eq!(&buf[..frame.buffer_size()], image.data.as_slice());
    }

    #[tokio::test]
    async fn test_blocking_encode_matches_inline() {
        let image = gradient(16, 16);
        let inline = encode_rgba(&image, &PngConfig::default()).unwrap();
        let pooled = encode_rgba_blocking(image, PngConfig::default()).await.unwrap();
        assert_eq!(inline, pooled);
    }
}
