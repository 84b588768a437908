//! Terrain configuration.

use serde::{Deserialize, Serialize};
use strider_physics::Material;
use thiserror::Error;

use crate::noise::NoiseLayerConfig;

/// Errors from validating a [`TerrainConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("chunk segments must be at least 1")]
    NoSegments,

    #[error("element size must be finite and positive, got {0}")]
    ElementSize(f32),

    #[error("terrain needs at least one noise layer")]
    NoLayers,

    #[error("noise layer {index} has non-finite parameters")]
    InvalidLayer { index: usize },

    #[error("max_chunks_per_update must be at least 1")]
    NoStreamingBudget,
}

/// Configuration for procedural terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    // ========================================================================
    // Chunk Shape
    // ========================================================================
    /// Cells per chunk side. Each chunk has `segments + 1` samples per axis.
    pub segments: u32,

    /// Distance between neighbouring samples (meters).
    pub element_size: f32,

    // ========================================================================
    // Surface
    // ========================================================================
    /// Noise layers summed into the surface height, in order.
    pub layers: Vec<NoiseLayerConfig>,

    /// Contact response of the collision surface.
    pub material: Material,

    // ========================================================================
    // Streaming
    // ========================================================================
    /// Keep chunks loaded within this many chunk steps of the player.
    /// `None` disables streaming.
    pub stream_radius: Option<u32>,

    /// Most chunks built by a single streaming update.
    pub max_chunks_per_update: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            segments: 16,
            element_size: 1.0,
            layers: vec![NoiseLayerConfig::new("pizza", 0.1, 1.0)],
            material: Material {
                friction: 0.05,
                restitution: 0.0,
            },
            stream_radius: Some(1),
            max_chunks_per_update: 4,
        }
    }
}

impl TerrainConfig {
    /// World-space side length of one chunk.
    pub fn chunk_extent(&self) -> f32 {
        self.segments as f32 * self.element_size
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.segments == 0 {
            return Err(TerrainError::NoSegments);
        }
        if !(self.element_size.is_finite() && self.element_size > 0.0) {
            return Err(TerrainError::ElementSize(self.element_size));
        }
        if self.layers.is_empty() {
            return Err(TerrainError::NoLayers);
        }
        if let Some(index) = self
            .layers
            .iter()
            .position(|l| !(l.resolution.is_finite() && l.height.is_finite()))
        {
            return Err(TerrainError::InvalidLayer { index });
        }
        if self.max_chunks_per_update == 0 {
            return Err(TerrainError::NoStreamingBudget);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TerrainConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.chunk_extent(), 16.0);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = TerrainConfig {
            segments: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(TerrainError::NoSegments));

        config.segments = 8;
        config.element_size = -1.0;
        assert_eq!(config.validate(), Err(TerrainError::ElementSize(-1.0)));

        config.element_size = 0.5;
        config.layers[0].height = f64::INFINITY;
        assert_eq!(config.validate(), Err(TerrainError::InvalidLayer { index: 0 }));

        config.layers.clear();
        assert_eq!(config.validate(), Err(TerrainError::NoLayers));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TerrainConfig = serde_json::from_str(r#"{ "segments": 32 }"#).unwrap();
        assert_eq!(config.segments, 32);
        assert_eq!(config.element_size, 1.0);
        assert_eq!(config.layers.len(), 1);
    }
}
