//! Terrain chunks.
//!
//! A chunk is one square tile of terrain. Its height matrix is sampled once
//! from a [`NoiseStack`] at construction, and both the render mesh and the
//! collision heightfield are derived from that same matrix. Chunks are
//! immutable; regenerating terrain means replacing the chunk.
//!
//! Every per-sample array in this module uses the same ordering: row-major
//! with `x` outer and `z` inner, i.e. index `ix * (segments + 1) + iz`.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use strider_physics::HeightFieldDesc;

use crate::noise::NoiseStack;

/// Integer grid coordinate of a chunk on the horizontal (X/Z) plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World-space corner of this chunk for a given chunk extent.
    pub fn origin(self, extent: f32) -> Vec3 {
        Vec3::new(self.x as f32 * extent, 0.0, self.z as f32 * extent)
    }

    /// Chebyshev distance in chunk steps.
    pub fn ring_distance(self, other: ChunkCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }

    /// Squared euclidean distance in chunk steps.
    pub fn distance_squared(self, other: ChunkCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }
}

/// Square matrix of sampled heights.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMatrix {
    size: usize,
    values: Vec<f32>,
}

impl HeightMatrix {
    fn sample(origin: Vec3, size: usize, element_size: f32, layers: &NoiseStack) -> Self {
        let mut values = Vec::with_capacity(size * size);
        for ix in 0..size {
            for iz in 0..size {
                let x = origin.x as f64 + ix as f64 * element_size as f64;
                let z = origin.z as f64 + iz as f64 * element_size as f64;
                values.push(layers.height_at(x, z) as f32);
            }
        }
        Self { size, values }
    }

    /// Samples per side (`segments + 1`).
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, ix: usize, iz: usize) -> f32 {
        self.values[ix * self.size + iz]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Renderable triangle mesh in chunk-local coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Linear RGB per vertex.
    pub colors: Vec<[f32; 3]>,
    /// Counter-clockwise when viewed from above.
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Height colour ramp, low to high.
const HEIGHT_GRADIENT: [[f32; 3]; 5] = [
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 0.0],
];

fn gradient_color(t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0) * (HEIGHT_GRADIENT.len() - 1) as f32;
    let lower = (t.floor() as usize).min(HEIGHT_GRADIENT.len() - 2);
    let f = t - lower as f32;
    let (a, b) = (HEIGHT_GRADIENT[lower], HEIGHT_GRADIENT[lower + 1]);
    [
        a[0] + (b[0] - a[0]) * f,
        a[1] + (b[1] - a[1]) * f,
        a[2] + (b[2] - a[2]) * f,
    ]
}

/// One terrain tile.
#[derive(Debug, Clone)]
pub struct Chunk {
    coord: ChunkCoord,
    segments: u32,
    element_size: f32,
    origin: Vec3,
    heights: HeightMatrix,
    mesh: TerrainMesh,
    collision: HeightFieldDesc,
}

impl Chunk {
    /// Build the chunk at `coord`.
    ///
    /// Pure function of its arguments.
    ///
    /// # Panics
    ///
    /// Panics if `segments` is zero, `element_size` is not positive, or the
    /// derived mesh and collision surface disagree on sample count.
    pub fn new(coord: ChunkCoord, segments: u32, element_size: f32, layers: &NoiseStack) -> Self {
        assert!(segments > 0, "chunk needs at least one segment");
        assert!(
            element_size.is_finite() && element_size > 0.0,
            "invalid element size {}",
            element_size
        );

        let size = segments as usize + 1;
        let origin = coord.origin(segments as f32 * element_size);
        let heights = HeightMatrix::sample(origin, size, element_size, layers);
        let mesh = build_mesh(origin, &heights, element_size, layers);
        let collision = HeightFieldDesc::new(size, size, element_size, heights.values().to_vec())
            .unwrap_or_else(|err| panic!("chunk {:?} collision surface: {}", coord, err));

        assert_eq!(heights.values().len(), size * size);
        assert_eq!(
            mesh.vertex_count(),
            collision.samples_x() * collision.samples_z(),
            "mesh and collision surface disagree on sample count"
        );

        Self {
            coord,
            segments,
            element_size,
            origin,
            heights,
            mesh,
            collision,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn element_size(&self) -> f32 {
        self.element_size
    }

    /// World-space `(0, 0)` corner.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn extent(&self) -> f32 {
        self.segments as f32 * self.element_size
    }

    pub fn heights(&self) -> &HeightMatrix {
        &self.heights
    }

    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    pub fn collision(&self) -> &HeightFieldDesc {
        &self.collision
    }

    /// World position of lattice point `(ix, iz)`.
    pub fn world_position(&self, ix: usize, iz: usize) -> Vec3 {
        self.origin + self.mesh.positions[ix * self.heights.size() + iz]
    }
}

fn build_mesh(
    origin: Vec3,
    heights: &HeightMatrix,
    element_size: f32,
    layers: &NoiseStack,
) -> TerrainMesh {
    let size = heights.size();
    let amplitude = layers.amplitude() as f32;
    let step = element_size as f64;

    let mut mesh = TerrainMesh {
        positions: Vec::with_capacity(size * size),
        normals: Vec::with_capacity(size * size),
        colors: Vec::with_capacity(size * size),
        indices: Vec::with_capacity((size - 1) * (size - 1) * 6),
    };

    for ix in 0..size {
        for iz in 0..size {
            let h = heights.get(ix, iz);
            let local = Vec2::new(ix as f32, iz as f32) * element_size;
            mesh.positions.push(Vec3::new(local.x, h, local.y));

            // Central differences on the noise itself, so edge normals match
            // the neighbouring chunk.
            let x = origin.x as f64 + local.x as f64;
            let z = origin.z as f64 + local.y as f64;
            let dx = layers.height_at(x - step, z) - layers.height_at(x + step, z);
            let dz = layers.height_at(x, z - step) - layers.height_at(x, z + step);
            mesh.normals
                .push(Vec3::new(dx as f32, 2.0 * element_size, dz as f32).normalize());

            let t = if amplitude > 0.0 {
                (h + amplitude) / (2.0 * amplitude)
            } else {
                0.5
            };
            mesh.colors.push(gradient_color(t));
        }
    }

    let index = |ix: usize, iz: usize| (ix * size + iz) as u32;
    for ix in 0..size - 1 {
        for iz in 0..size - 1 {
            let (a, b) = (index(ix, iz), index(ix + 1, iz));
            let (c, d) = (index(ix, iz + 1), index(ix + 1, iz + 1));
            mesh.indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    mesh
}

// ============================================================================
// Tests
// ============================================================================
