//! Mesh hierarchy capability used by the material passes.
//!
//! The exporter never assumes a particular scene graph. It reads and writes
//! material assignments through [`MeshNode`], dispatching on [`NodeKind`].
//! [`SceneNode`] is a plain owned tree implementing the trait.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a node in the mesh hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a node takes part in material substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Skinned/animated renderable; receives override materials.
    Deformable,
    /// Grouping node; override traversal recurses through it.
    Structural,
    /// Anything else (static meshes, bones, lights). Left untouched.
    Other,
}

/// Material assignment of a single node, mirrored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialSlot<M> {
    /// One material for the whole node.
    Single(M),
    /// One material per geometry group.
    Multi(Vec<M>),
}

impl<M> MaterialSlot<M> {
    /// Iterate over every material in the slot.
    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        match self {
            MaterialSlot::Single(m) => std::slice::from_ref(m).iter(),
            MaterialSlot::Multi(ms) => ms.iter(),
        }
    }
}

/// Narrow view of a mesh hierarchy node.
///
/// Children are matched to a material snapshot by id, so they may be
/// reordered between a capture and the matching restore. Siblings sharing
/// an id are paired in their relative order.
pub trait MeshNode {
    /// Material reference type used by the host scene.
    type Material: Clone;

    /// Identifier of this node.
    fn id(&self) -> &NodeId;

    /// Kind of this node.
    fn kind(&self) -> NodeKind;

    /// Current material assignment, `None` for nodes without one.
    fn material(&self) -> Option<&MaterialSlot<Self::Material>>;

    /// Replace the material assignment.
    fn set_material(&mut self, material: Option<MaterialSlot<Self::Material>>);

    /// Child nodes.
    fn children(&self) -> &[Self]
    where
        Self: Sized;

    /// Mutable child nodes.
    fn children_mut(&mut self) -> &mut [Self]
    where
        Self: Sized;
}

/// How a material shades a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shading {
    /// Unlit base color, RGBA.
    Flat { color: [u8; 4] },
    /// Surface normal mapped to RGB.
    Normal,
}

/// A named material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Display name.
    pub name: String,
    /// Shading model.
    #[serde(flatten)]
    pub shading: Shading,
}

impl Material {
    /// Create a flat colored material.
    pub fn flat(name: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            shading: Shading::Flat { color },
        }
    }

    /// Material that renders surface normals as color.
    pub fn normal_visualization() -> Self {
        Self {
            name: "normal".to_string(),
            shading: Shading::Normal,
        }
    }
}

/// Owned mesh hierarchy node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Node id.
    pub id: NodeId,
    /// Node kind.
    pub kind: NodeKind,
    /// Material assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialSlot<Material>>,
    /// Children in stable order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a grouping node.
    pub fn group(id: impl Into<String>, children: Vec<SceneNode>) -> Self {
        Self {
            id: NodeId::new(id),
            kind: NodeKind::Structural,
            material: None,
            children,
        }
    }

    /// Create a skinned mesh with a single material.
    pub fn skinned(id: impl Into<String>, material: Material) -> Self {
        Self {
            id: NodeId::new(id),
            kind: NodeKind::Deformable,
            material: Some(MaterialSlot::Single(material)),
            children: Vec::new(),
        }
    }

    /// Create a static mesh with a single material.
    pub fn mesh(id: impl Into<String>, material: Material) -> Self {
        Self {
            id: NodeId::new(id),
            kind: NodeKind::Other,
            material: Some(MaterialSlot::Single(material)),
            children: Vec::new(),
        }
    }

    /// Replace the material slot.
    pub fn with_material(mut self, material: MaterialSlot<Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first search by id.
    pub fn find(&self, id: &str) -> Option<&SceneNode> {
        if self.id.as_str() == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Visit every node depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

impl MeshNode for SceneNode {
    type Material = Material;

    fn id(&self) -> &NodeId {
        &self.id
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn material(&self) -> Option<&MaterialSlot<Material>> {
        self.material.as_ref()
    }

    fn set_material(&mut self, material: Option<MaterialSlot<Material>>) {
        self.material = material;
    }

    fn children(&self) -> &[SceneNode] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [SceneNode] {
        &mut self.children
    }
}
