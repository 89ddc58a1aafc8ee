//! Material snapshot, override and restore over a mesh hierarchy.
//!
//! The normal pass swaps materials on the caller's live hierarchy. A
//! [`MaterialSnapshot`] taken beforehand puts every assignment back.

use tracing::{debug, warn};

use crate::error::{ExportError, ExportResult};
use crate::scene::{MeshNode, MaterialSlot, NodeId, NodeKind};

/// Recorded material assignments, mirroring the hierarchy it was taken from.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSnapshot<M> {
    /// Id of the node this entry belongs to.
    pub id: NodeId,
    /// Assignment at capture time.
    pub material: Option<MaterialSlot<M>>,
    /// Snapshots of the node's children.
    pub children: Vec<MaterialSnapshot<M>>,
}

impl<M> MaterialSnapshot<M> {
    /// Total number of nodes recorded.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// Record the material assignment of every node under `root`.
pub fn capture<N: MeshNode>(root: &N) -> MaterialSnapshot<N::Material> {
    MaterialSnapshot {
        id: root.id().clone(),
        material: root.material().cloned(),
        children: root.children().iter().map(capture).collect(),
    }
}

/// Assign `material` to every deformable node reachable from `root`.
///
/// Deformable nodes are assigned and not descended into. Every other node
/// keeps its own material while its children are still visited, so static
/// meshes never receive the override.
pub fn override_all<N: MeshNode>(root: &mut N, material: &N::Material) -> usize {
    match root.kind() {
        NodeKind::Deformable => {
            root.set_material(Some(MaterialSlot::Single(material.clone())));
            1
        }
        NodeKind::Structural | NodeKind::Other => root
            .children_mut()
            .iter_mut()
            .map(|child| override_all(child, material))
            .sum(),
    }
}

/// Reassign every material recorded in `snapshot`.
///
/// Children are matched by id, so reordering is tolerated. Each live child
/// is claimed by at most one recorded entry; siblings sharing an id pair up
/// in their relative order. Nodes that were captured but no longer exist
/// fail with [`ExportError::SnapshotMismatch`]; every node that can be
/// matched is still restored before the first mismatch is reported.
pub fn restore<N: MeshNode>(root: &mut N, snapshot: &MaterialSnapshot<N::Material>) -> ExportResult<()> {
    if root.id() != &snapshot.id {
        return Err(ExportError::SnapshotMismatch {
            id: snapshot.id.clone(),
        });
    }

    let mut first_error = None;
    restore_node(root, snapshot, &mut first_error);
    match first_error {
        Some(err) => Err(err),
        None => {
            debug!(nodes = snapshot.node_count(), "Restored materials");
            Ok(())
        }
    }
}

fn restore_node<N: MeshNode>(
    node: &mut N,
    snapshot: &MaterialSnapshot<N::Material>,
    first_error: &mut Option<ExportError>,
) {
    node.set_material(snapshot.material.clone());

    let children = node.children_mut();
    let mut claimed = vec![false; children.len()];
    for recorded in &snapshot.children {
        let slot = children
            .iter()
            .zip(&claimed)
            .position(|(c, &taken)| !taken && c.id() == &recorded.id);
        match slot {
            Some(i) => {
                claimed[i] = true;
                restore_node(&mut children[i], recorded, first_error);
            }
            None => {
                warn!(id = %recorded.id, "Captured node missing at restore");
                first_error.get_or_insert_with(|| ExportError::SnapshotMismatch {
                    id: recorded.id.clone(),
                });
            }
        }
    }
}
