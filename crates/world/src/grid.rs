//! Sparse chunk grid.
//!
//! The grid owns every loaded [`Chunk`] and is the only code that registers
//! chunk collision surfaces with the physics world. It does not own the world
//! or the render group; both are passed into each mutating call, which also
//! means a chunk can never be added or removed while the world is stepping.

use std::collections::HashMap;

use glam::Vec3;
use strider_physics::{BodyDesc, BodyHandle, PhysicsWorld, ShapeDesc};

use crate::chunk::{Chunk, ChunkCoord};
use crate::config::{TerrainConfig, TerrainError};
use crate::noise::NoiseStack;
use crate::scene::RenderGroup;

/// Positions this many f32 ulps from a chunk boundary count as on it.
const SNAP_ULPS: f64 = 2.0;

struct LoadedChunk {
    chunk: Chunk,
    body: BodyHandle,
}

/// Outcome of one [`TerrainGrid::stream_around`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub added: usize,
    pub removed: usize,
    /// Chunks still missing from the target area after this call.
    pub pending: usize,
}

/// Chunks keyed by snapped grid coordinate.
pub struct TerrainGrid {
    config: TerrainConfig,
    layers: NoiseStack,
    chunks: HashMap<ChunkCoord, LoadedChunk>,
}

impl TerrainGrid {
    pub fn new(config: TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        let layers = NoiseStack::new(&config.layers);

        Ok(Self {
            config,
            layers,
            chunks: HashMap::new(),
        })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn layers(&self) -> &NoiseStack {
        &self.layers
    }

    /// World-space side length of one chunk.
    pub fn chunk_extent(&self) -> f32 {
        self.config.chunk_extent()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    // ========================================================================
    // Addressing
    // ========================================================================

    /// Grid coordinate of the chunk containing `position`.
    ///
    /// Positions within two f32 ulps of a boundary snap onto that boundary,
    /// which keeps `snap(snap_position(p)) == snap(p)` exact. Everything else
    /// is a plain floor.
    pub fn snap(&self, position: Vec3) -> ChunkCoord {
        let extent = self.chunk_extent() as f64;
        ChunkCoord::new(
            snap_axis(position.x as f64, extent),
            snap_axis(position.z as f64, extent),
        )
    }

    /// World-space origin of the chunk containing `position`.
    pub fn snap_position(&self, position: Vec3) -> Vec3 {
        self.snap(position).origin(self.chunk_extent())
    }

    /// Surface height of the noise at `(x, z)`, loaded or not.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.layers.height_at(x as f64, z as f64) as f32
    }

    // ========================================================================
    // Chunk lifecycle
    // ========================================================================

    /// Build the chunk containing `position` if it is not loaded yet.
    ///
    /// Returns `true` if a chunk was created.
    pub fn add_chunk(
        &mut self,
        world: &mut dyn PhysicsWorld,
        scene: &mut dyn RenderGroup,
        position: Vec3,
    ) -> bool {
        let coord = self.snap(position);
        self.add_chunk_at(world, scene, coord)
    }

    pub fn add_chunk_at(
        &mut self,
        world: &mut dyn PhysicsWorld,
        scene: &mut dyn RenderGroup,
        coord: ChunkCoord,
    ) -> bool {
        if self.chunks.contains_key(&coord) {
            return false;
        }

        let chunk = Chunk::new(
            coord,
            self.config.segments,
            self.config.element_size,
            &self.layers,
        );

        let desc = BodyDesc::fixed(ShapeDesc::HeightField(chunk.collision().clone()))
            .at(chunk.origin())
            .with_material(self.config.material);
        let body = world.add_body(&desc);
        scene.attach_terrain(coord, chunk.mesh(), chunk.origin());

        log::debug!("Added chunk ({}, {}) as {:?}", coord.x, coord.z, body);
        self.chunks.insert(coord, LoadedChunk { chunk, body });
        true
    }

    /// Unload the chunk containing `position`.
    ///
    /// The mesh is detached and the collision surface unregistered before the
    /// chunk leaves the grid. Returns `None` if nothing was loaded there.
    pub fn remove_chunk(
        &mut self,
        world: &mut dyn PhysicsWorld,
        scene: &mut dyn RenderGroup,
        position: Vec3,
    ) -> Option<Chunk> {
        let coord = self.snap(position);
        self.remove_chunk_at(world, scene, coord)
    }

    pub fn remove_chunk_at(
        &mut self,
        world: &mut dyn PhysicsWorld,
        scene: &mut dyn RenderGroup,
        coord: ChunkCoord,
    ) -> Option<Chunk> {
        let loaded = self.chunks.remove(&coord)?;

        scene.detach_terrain(coord);
        world.remove_body(loaded.body);

        log::debug!("Removed chunk ({}, {})", coord.x, coord.z);
        Some(loaded.chunk)
    }

    pub fn get_chunk(&self, position: Vec3) -> Option<&Chunk> {
        self.get_chunk_at(self.snap(position))
    }

    pub fn get_chunk_at(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord).map(|loaded| &loaded.chunk)
    }

    /// Collision body registered for the chunk containing `position`.
    pub fn collision_body(&self, position: Vec3) -> Option<BodyHandle> {
        self.chunks.get(&self.snap(position)).map(|loaded| loaded.body)
    }

    /// Unload every chunk.
    pub fn clear(&mut self, world: &mut dyn PhysicsWorld, scene: &mut dyn RenderGroup) {
        let coords: Vec<_> = self.chunks.keys().copied().collect();
        for coord in coords {
            self.remove_chunk_at(world, scene, coord);
        }
    }

    // ========================================================================
    // Streaming
    // ========================================================================

    /// Keep the area around `center` loaded.
    ///
    /// Missing chunks within `radius` chunk steps are built nearest first, at
    /// most `max_chunks_per_update` per call. Chunks farther than
    /// `radius + 1` steps are unloaded; the extra ring stops a player walking
    /// along a boundary from thrashing chunks in and out.
    pub fn stream_around(
        &mut self,
        world: &mut dyn PhysicsWorld,
        scene: &mut dyn RenderGroup,
        center: Vec3,
        radius: u32,
    ) -> StreamStats {
        let center = self.snap(center);
        let mut stats = StreamStats::default();

        let stale: Vec<_> = self
            .chunks
            .keys()
            .copied()
            .filter(|coord| coord.ring_distance(center) > radius + 1)
            .collect();
        for coord in stale {
            if self.remove_chunk_at(world, scene, coord).is_some() {
                stats.removed += 1;
            }
        }

        let r = radius as i32;
        let mut missing: Vec<_> = (-r..=r)
            .flat_map(|dx| (-r..=r).map(move |dz| ChunkCoord::new(center.x + dx, center.z + dz)))
            .filter(|coord| !self.chunks.contains_key(coord))
            .collect();
        missing.sort_by_key(|coord| (coord.distance_squared(center), *coord));

        let budget = self.config.max_chunks_per_update;
        for coord in missing.iter().take(budget) {
            if self.add_chunk_at(world, scene, *coord) {
                stats.added += 1;
            }
        }
        stats.pending = missing.len().saturating_sub(budget);

        stats
    }
}

/// `floor(p / extent)`, except that a position within f32 rounding of a
/// boundary snaps onto it.
fn snap_axis(p: f64, extent: f64) -> i32 {
    let q = p / extent;
    let nearest = q.round();
    let tolerance = SNAP_ULPS * f32::EPSILON as f64 * p.abs();
    let cell = if (p - nearest * extent).abs() <= tolerance {
        nearest
    } else {
        q.floor()
    };
    cell as i32
}

// ============================================================================
// Tests
// ============================================================================
