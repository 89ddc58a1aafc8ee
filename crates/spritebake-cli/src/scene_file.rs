//! Scene description files.
//!
//! A scene file is JSON holding the object's mesh hierarchy, its animation
//! clips, and the cameras available for rendering.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spritebake_core::{AnimationClip, SceneNode};

/// A camera the preview renderer can look through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDesc {
    /// Camera name.
    pub name: String,
    /// Magnification; 1.0 frames the whole object.
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_zoom() -> f64 {
    1.0
}

/// Contents of a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Root of the selected object's hierarchy.
    pub root: SceneNode,
    /// Animation clips of the object.
    #[serde(default)]
    pub animations: Vec<AnimationClip>,
    /// Cameras in the scene.
    #[serde(default)]
    pub cameras: Vec<CameraDesc>,
    /// Camera used when none is configured; the first camera when unset.
    #[serde(default)]
    pub default_camera: Option<String>,
}

impl SceneDescription {
    /// Parse a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let scene: Self = serde_json::from_str(json).context("Malformed scene JSON")?;
        if scene.cameras.is_empty() {
            anyhow::bail!("Scene defines no cameras");
        }
        Ok(scene)
    }

    /// Names of all cameras.
    pub fn camera_names(&self) -> Vec<String> {
        self.cameras.iter().map(|c| c.name.clone()).collect()
    }

    /// Camera used when the configuration does not name one.
    pub fn current_camera(&self) -> &str {
        match &self.default_camera {
            Some(name) => name,
            None => self.cameras.first().map(|c| c.name.as_str()).unwrap_or_default(),
        }
    }
}

/// Load a scene description from a file.
pub fn load_from_path(path: &Path) -> Result<SceneDescription> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene file: {}", path.display()))?;
    SceneDescription::from_json(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Scene used by tests across the crate.
#[cfg(test)]
pub(crate) const SAMPLE_SCENE: &str = r#"{
    "root": {
        "id": "knight",
        "kind": "structural",
        "children": [
            {
                "id": "body",
                "kind": "deformable",
                "material": { "name": "armor", "type": "flat", "color": [160, 160, 170, 255] }
            },
            {
                "id": "banner",
                "kind": "other",
                "material": { "name": "silk", "type": "flat", "color": [180, 20, 20, 255] }
            }
        ]
    },
    "animations": [
        { "name": "idle", "duration": 1.0 },
        { "name": "attack", "duration": 0.5 }
    ],
    "cameras": [
        { "name": "front" },
        { "name": "close", "zoom": 2.0 }
    ],
    "default_camera": "close"
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene() {
        let scene = SceneDescription::from_json(SAMPLE_SCENE).unwrap();
        assert_eq!(scene.root.children.len(), 2);
        assert_eq!(scene.animations[1].name, "attack");
        assert_eq!(scene.cameras[0].zoom, 1.0);
        assert_eq!(scene.camera_names(), ["front", "close"]);
        assert_eq!(scene.current_camera(), "close");
    }

    #[test]
    fn test_current_camera_defaults_to_first() {
        let mut scene = SceneDescription::from_json(SAMPLE_SCENE).unwrap();
        scene.default_camera = None;
        assert_eq!(scene.current_camera(), "front");
    }

    #[test]
    fn test_scene_without_cameras_rejected() {
        let json = r#"{ "root": { "id": "a", "kind": "structural" }, "cameras": [] }"#;
        assert!(SceneDescription::from_json(json).is_err());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, SAMPLE_SCENE).unwrap();
        assert!(load_from_path(&path).is_ok());
        assert!(load_from_path(&dir.path().join("missing.json")).is_err());
    }
}
