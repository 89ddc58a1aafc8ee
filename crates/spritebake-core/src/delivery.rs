//! Handing the finished archive to its destination.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ExportResult;

/// File name of the delivered archive, without extension.
pub const ARTIFACT_STEM: &str = "atlas";

/// Destination for a finished export artifact.
pub trait ArtifactSink {
    /// Deliver `bytes` under `file_name`.
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> ExportResult<()>;
}

/// Writes artifacts into a directory.
///
/// Bytes go to a temporary file next to the target, which is renamed into
/// place on success and removed on failure. The temporary handle is
/// released as soon as delivery returns.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Deliver into `dir`, which must exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory artifacts are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an artifact with `file_name` is delivered to.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> ExportResult<()> {
        let target = self.path_for(file_name);
        let mut staging = tempfile::NamedTempFile::new_in(&self.dir)?;
        staging.write_all(bytes)?;
        staging.as_file().sync_all()?;
        staging.persist(&target).map_err(|e| e.error)?;
        info!(path = %target.display(), bytes = bytes.len(), "Delivered artifact");
        Ok(())
    }
}

/// Keeps delivered artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Delivered `(file_name, bytes)` pairs, in order.
    pub artifacts: Vec<(String, Vec<u8>)>,
}

impl ArtifactSink for MemorySink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> ExportResult<()> {
        self.artifacts.push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.deliver("atlas.zip", b"PK\x05\x06").unwrap();

        let written = std::fs::read(dir.path().join("atlas.zip")).unwrap();
        assert_eq!(written, b"PK\x05\x06");
        // No staging files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_directory_sink_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("atlas.zip"), b"old").unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.deliver("atlas.zip", b"new").unwrap();
        assert_eq!(std::fs::read(dir.path().join("atlas.zip")).unwrap(), b"new");
    }

    #[test]
    fn test_directory_sink_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("missing"));
        assert!(sink.deliver("atlas.zip", b"x").is_err());
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::default();
        sink.deliver("a.zip", &[1, 2]).unwrap();
        assert_eq!(sink.artifacts, vec![("a.zip".to_string(), vec![1, 2])]);
    }
}
