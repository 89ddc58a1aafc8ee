//! Spritebake CLI library.
//!
//! Scene file loading, the software preview renderer, and the command
//! implementations behind the `spritebake` binary.

pub mod commands;
pub mod preview;
pub mod scene_file;
