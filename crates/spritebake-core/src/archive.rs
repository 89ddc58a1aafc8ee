//! Packaging named images into a single archive blob.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ExportError, ExportResult};

/// One named entry of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImage {
    /// Entry name, including extension.
    pub name: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

impl NamedImage {
    /// Create a named entry.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Encodes a set of named entries into one archive.
pub trait ArchiveCodec {
    /// File extension of produced archives, without the dot.
    fn extension(&self) -> &'static str;

    /// Build an archive holding exactly `entries`.
    fn assemble(&self, entries: &[NamedImage]) -> ExportResult<Vec<u8>>;
}

/// ZIP archive writer.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiver {
    method: CompressionMethod,
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::deflated()
    }
}

impl ZipArchiver {
    /// Entries are deflate-compressed.
    pub fn deflated() -> Self {
        Self {
            method: CompressionMethod::Deflated,
        }
    }

    /// Entries are stored uncompressed. PNG data is already compressed.
    pub fn stored() -> Self {
        Self {
            method: CompressionMethod::Stored,
        }
    }
}

impl ArchiveCodec for ZipArchiver {
    fn extension(&self) -> &'static str {
        "zip"
    }

    fn assemble(&self, entries: &[NamedImage]) -> ExportResult<Vec<u8>> {
        let mut seen = HashSet::new();
        for entry in entries {
            if entry.name.is_empty() {
                return Err(ExportError::encoding_failure("archive entry name is empty"));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ExportError::encoding_failure(format!(
                    "duplicate archive entry '{}'",
                    entry.name
                )));
            }
        }

        let options = SimpleFileOptions::default().compression_method(self.method);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in entries {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| zip_failure(&entry.name, e))?;
            writer.write_all(&entry.bytes).map_err(|e| {
                ExportError::encoding_failure(format!("failed to write '{}': {}", entry.name, e))
            })?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| ExportError::encoding_failure(format!("failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

fn zip_failure(name: &str, err: zip::result::ZipError) -> ExportError {
    ExportError::encoding_failure(format!("failed to add '{}': {}", name, err))
}
