//! Spritebake Core
//!
//! Bakes an animated, skinned object into spritesheet atlases. Each export
//! samples one animation clip at a fixed frame rate, renders every frame
//! twice (once with the object's own materials, once with a normal
//! visualization material) and packs each pass into a square grid atlas.
//! Both atlases are PNG-encoded and bundled into one archive.
//!
//! # Overview
//!
//! - [`layout`] computes frame count, grid dimension and atlas size.
//! - [`material`] snapshots, overrides and restores materials on a mesh
//!   hierarchy exposed through [`scene::MeshNode`].
//! - [`sampler`] steps playback and composites rendered frames.
//! - [`export`] runs the two passes and always restores materials.
//! - [`archive`] and [`delivery`] package and hand off the result.
//!
//! The host supplies playback and rendering through the [`render`] traits.
//!
//! # Example
//!
//! ```ignore
//! use spritebake_core::{ExportRequest, Material, CancellationToken, CellSize};
//!
//! let request = ExportRequest {
//!     clip: &clip,
//!     camera: "main",
//!     cell_size: CellSize::new(150, 150),
//!     fps: 30,
//!     normal_material: Material::normal_visualization(),
//!     cancel: CancellationToken::new(),
//! };
//! let artifact = spritebake_core::export_spritesheet(&mut root, &mut backend, &request).await?;
//! artifact.deliver(&mut DirectorySink::new("out"))?;
//! ```
//!
//! # Determinism
//!
//! Playback advances in constant `1 / fps` steps regardless of how long
//! rendering takes, and PNG encoding uses fixed settings, so the same
//! renderer output always yields the same atlas bytes.

pub mod archive;
pub mod cancel;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod layout;
pub mod material;
pub mod png;
pub mod raster;
pub mod render;
pub mod sampler;
pub mod scene;

// Re-export main types for convenience
pub use archive::{ArchiveCodec, NamedImage, ZipArchiver};
pub use cancel::CancellationToken;
pub use config::ExportConfig;
pub use delivery::{ArtifactSink, DirectorySink, MemorySink};
pub use error::{ExportError, ExportResult};
pub use export::{
    export_spritesheet, ExportArtifact, ExportPhase, ExportReport, ExportRequest,
    SpritesheetExporter,
};
pub use layout::{compute_layout, CellSize, GridLayout, MAX_ATLAS_BYTES, MAX_ATLAS_DIMENSION};
pub use material::{capture, override_all, restore, MaterialSnapshot};
pub use self::png::PngConfig;
pub use raster::{AtlasSurface, RasterImage};
pub use render::{AnimationClip, FrameRenderer, Playback, RenderError, RenderPipeline};
pub use sampler::sample_to_atlas;
pub use scene::{Material, MaterialSlot, MeshNode, NodeId, NodeKind, SceneNode, Shading};
