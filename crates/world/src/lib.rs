//! Strider World
//!
//! Procedural terrain built from layered noise and split into square chunks.
//!
//! - **Noise**: seeded simplex layers, summed into a height value
//! - **Chunk**: one tile with a height matrix, a render mesh and a matching
//!   collision heightfield
//! - **Grid**: the sparse set of loaded chunks, plus streaming around a point
//! - **Scene**: the [`RenderGroup`] seam that receives meshes and transforms
//!
//! ```text
//!  NoiseStack ──► Chunk ──► TerrainGrid ──┬──► PhysicsWorld (heightfield bodies)
//!                                         └──► RenderGroup  (terrain meshes)
//! ```

pub mod chunk;
pub mod config;
pub mod grid;
pub mod noise;
pub mod scene;

// Re-export main types
pub use chunk::{Chunk, ChunkCoord, HeightMatrix, TerrainMesh};
pub use config::{TerrainConfig, TerrainError};
pub use grid::{StreamStats, TerrainGrid};
pub use crate::noise::{NoiseField, NoiseLayerConfig, NoiseSeed, NoiseStack};
pub use scene::{HeadlessScene, NodeId, RenderGroup, TerrainNode};
