//! Render-group seam.
//!
//! The simulation never draws anything itself. It hands terrain meshes and
//! per-frame transforms to a [`RenderGroup`]; a GPU backend, an editor view
//! or the [`HeadlessScene`] used by tests and the CLI can sit behind it.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use strider_physics::Transform;

use crate::chunk::{ChunkCoord, TerrainMesh};

/// Identifier of a dynamic render node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Anything that can display terrain and moving entities.
pub trait RenderGroup {
    /// Start drawing a chunk's mesh at `origin`.
    fn attach_terrain(&mut self, coord: ChunkCoord, mesh: &TerrainMesh, origin: Vec3);

    /// Stop drawing a chunk. Unknown coordinates are ignored.
    fn detach_terrain(&mut self, coord: ChunkCoord);

    /// Publish the transform of a dynamic node for this render pass.
    fn place(&mut self, node: NodeId, transform: Transform);

    /// Stop drawing a node. Unknown nodes are ignored.
    fn remove(&mut self, node: NodeId);
}

/// Summary of an attached terrain mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainNode {
    pub origin: Vec3,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// A render group that only records what it was asked to draw.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    terrain: HashMap<ChunkCoord, TerrainNode>,
    nodes: HashMap<NodeId, Transform>,
    placements: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terrain(&self, coord: ChunkCoord) -> Option<&TerrainNode> {
        self.terrain.get(&coord)
    }

    pub fn terrain_count(&self) -> usize {
        self.terrain.len()
    }

    /// Last transform placed for `node`.
    pub fn node(&self, node: NodeId) -> Option<Transform> {
        self.nodes.get(&node).copied()
    }

    /// Total number of `place` calls received.
    pub fn placements(&self) -> u64 {
        self.placements
    }
}

impl RenderGroup for HeadlessScene {
    fn attach_terrain(&mut self, coord: ChunkCoord, mesh: &TerrainMesh, origin: Vec3) {
        self.terrain.insert(
            coord,
            TerrainNode {
                origin,
                vertex_count: mesh.vertex_count(),
                triangle_count: mesh.triangle_count(),
            },
        );
    }

    fn detach_terrain(&mut self, coord: ChunkCoord) {
        self.terrain.remove(&coord);
    }

    fn place(&mut self, node: NodeId, transform: Transform) {
        self.nodes.insert(node, transform);
        self.placements += 1;
    }

    fn remove(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }
}
