//! Seeded, deterministic noise fields.
//!
//! A [`NoiseField`] is a single simplex layer with its own frequency and
//! amplitude. Terrain height is the sum of an ordered [`NoiseStack`].

use std::fmt;

use ::noise::{NoiseFn, Simplex};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh32::xxh32;

/// Seed for a noise layer. Text seeds are hashed to a stable integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoiseSeed {
    Number(u32),
    Text(String),
}

impl NoiseSeed {
    /// Integer seed fed to the generator.
    ///
    /// xxh32 with a fixed seed, so the value is identical across processes
    /// and platforms.
    pub fn to_u32(&self) -> u32 {
        match self {
            NoiseSeed::Number(n) => *n,
            NoiseSeed::Text(text) => xxh32(text.as_bytes(), 0),
        }
    }
}

impl From<u32> for NoiseSeed {
    fn from(n: u32) -> Self {
        NoiseSeed::Number(n)
    }
}

impl From<&str> for NoiseSeed {
    fn from(text: &str) -> Self {
        NoiseSeed::Text(text.to_string())
    }
}

/// Parameters of one noise layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayerConfig {
    pub seed: NoiseSeed,

    /// Frequency multiplier applied to world coordinates.
    pub resolution: f64,

    /// Amplitude multiplier applied to the raw value.
    pub height: f64,
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self {
            seed: NoiseSeed::Number(0),
            resolution: 1.0,
            height: 1.0,
        }
    }
}

impl NoiseLayerConfig {
    pub fn new(seed: impl Into<NoiseSeed>, resolution: f64, height: f64) -> Self {
        Self {
            seed: seed.into(),
            resolution,
            height,
        }
    }
}

/// A single immutable noise layer.
#[derive(Clone)]
pub struct NoiseField {
    config: NoiseLayerConfig,
    generator: Simplex,
}

impl fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseField")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NoiseField {
    pub fn new(config: &NoiseLayerConfig) -> Self {
        Self {
            generator: Simplex::new(config.seed.to_u32()),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &NoiseLayerConfig {
        &self.config
    }

    /// Unscaled simplex value in `[-1, 1]`.
    pub fn raw(&self, x: f64, z: f64) -> f64 {
        self.generator.get([x, z]).clamp(-1.0, 1.0)
    }

    /// Height contribution of this layer at world position `(x, z)`.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let res = self.config.resolution;
        self.raw(x * res, z * res) * self.config.height
    }

    /// Largest magnitude [`sample`](Self::sample) can return.
    pub fn amplitude(&self) -> f64 {
        self.config.height.abs()
    }
}

/// Ordered list of layers summed into one height value.
#[derive(Debug, Clone, Default)]
pub struct NoiseStack {
    layers: Vec<NoiseField>,
}

impl NoiseStack {
    pub fn new(configs: &[NoiseLayerConfig]) -> Self {
        Self {
            layers: configs.iter().map(NoiseField::new).collect(),
        }
    }

    pub fn push(&mut self, field: NoiseField) {
        self.layers.push(field);
    }

    pub fn layers(&self) -> &[NoiseField] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Sum of every layer at world position `(x, z)`, in layer order.
    pub fn height_at(&self, x: f64, z: f64) -> f64 {
        self.layers.iter().map(|layer| layer.sample(x, z)).sum()
    }

    /// Bound on `|height_at|`.
    pub fn amplitude(&self) -> f64 {
        self.layers.iter().map(NoiseField::amplitude).sum()
    }
}
