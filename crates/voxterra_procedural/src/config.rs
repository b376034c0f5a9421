//! # Session Configuration
//!
//! Every parameter here is fixed for the lifetime of a world session.
//! Configs are loaded once at startup, from TOML or from code, and
//! validated before any chunk is generated.
//!
//! ## TOML Format
//!
//! ```toml
//! seed = 7000
//! chunk_size = 8
//! block_scale = 2.0
//! view_distance = 3
//! max_height = 12
//! height_octaves = 4
//! cave_octaves = 3
//! cave_threshold = 0.55
//! ```
//!
//! Missing keys take their default; unknown keys are rejected.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::coords::CoordSpace;
use crate::error::{TerrainError, TerrainResult};
use crate::noise::WorldSeed;

/// Fixed parameters of a world session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerrainConfig {
    /// World seed.
    pub seed: u64,
    /// Columns per chunk edge. Must be positive.
    pub chunk_size: i64,
    /// World units per block. Must be positive and finite.
    pub block_scale: f64,
    /// Chebyshev radius, in chunks, kept loaded around the observer.
    /// Must not be negative.
    pub view_distance: i64,
    /// Ceiling on column height, in blocks. Must be positive.
    pub max_height: i64,
    /// Octaves of the surface height noise. Must be positive.
    pub height_octaves: u32,
    /// Octaves of the cave carving noise. Must be positive.
    pub cave_octaves: u32,
    /// Cells whose cave sample does not exceed this are carved out.
    /// In `[0, 1]`; lower means more open caves.
    pub cave_threshold: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 7000,
            chunk_size: 8,
            block_scale: 2.0,
            view_distance: 3,
            max_height: 12,
            height_octaves: 4,
            cave_octaves: 3,
            cave_threshold: 0.55,
        }
    }
}

impl TerrainConfig {
    /// Range fresh seeds are drawn from.
    pub const RANDOM_SEED_RANGE: std::ops::RangeInclusive<u64> = 5000..=9000;

    /// Default config with a freshly drawn seed.
    #[must_use]
    pub fn with_random_seed() -> Self {
        Self {
            seed: rand::thread_rng().gen_range(Self::RANDOM_SEED_RANGE),
            ..Self::default()
        }
    }

    /// Parses and validates a TOML config.
    ///
    /// # Errors
    ///
    /// `ConfigParse` for malformed TOML, `InvalidConfig` for out-of-range
    /// values.
    pub fn from_toml_str(text: &str) -> TerrainResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| TerrainError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// `ConfigIo` if the file cannot be read, otherwise as `from_toml_str`.
    pub fn load(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TerrainError::ConfigIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Serializes this config to TOML.
    ///
    /// # Errors
    ///
    /// `ConfigParse` if serialization fails.
    pub fn to_toml_string(&self) -> TerrainResult<String> {
        toml::to_string(self).map_err(|e| TerrainError::ConfigParse(e.to_string()))
    }

    /// Checks every parameter, reporting the first one out of range.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the offending field.
    pub fn validate(&self) -> TerrainResult<()> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> TerrainResult<()> {
            Err(TerrainError::InvalidConfig {
                field,
                reason: reason.into(),
            })
        }

        if self.chunk_size <= 0 {
            return invalid("chunk_size", format!("must be positive, got {}", self.chunk_size));
        }
        if !self.block_scale.is_finite() || self.block_scale <= 0.0 {
            return invalid(
                "block_scale",
                format!("must be positive and finite, got {}", self.block_scale),
            );
        }
        if self.view_distance < 0 {
            return invalid(
                "view_distance",
                format!("must not be negative, got {}", self.view_distance),
            );
        }
        if self.max_height <= 0 {
            return invalid("max_height", format!("must be positive, got {}", self.max_height));
        }
        if self.height_octaves == 0 {
            return invalid("height_octaves", "must be positive, got 0");
        }
        if self.cave_octaves == 0 {
            return invalid("cave_octaves", "must be positive, got 0");
        }
        if !(0.0..=1.0).contains(&self.cave_threshold) {
            return invalid(
                "cave_threshold",
                format!("must be within [0, 1], got {}", self.cave_threshold),
            );
        }
        Ok(())
    }

    /// The world seed.
    #[inline]
    #[must_use]
    pub const fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(self.seed)
    }

    /// The coordinate space defined by `chunk_size` and `block_scale`.
    #[inline]
    #[must_use]
    pub const fn space(&self) -> CoordSpace {
        CoordSpace::new(self.chunk_size, self.block_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_field(config: &TerrainConfig) -> &'static str {
        match config.validate() {
            Err(TerrainError::InvalidConfig { field, .. }) => field,
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert_eq!(TerrainConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_non_positive_parameters() {
        let base = TerrainConfig::default();

        let cases = [
            (TerrainConfig { chunk_size: 0, ..base.clone() }, "chunk_size"),
            (TerrainConfig { chunk_size: -8, ..base.clone() }, "chunk_size"),
            (TerrainConfig { block_scale: 0.0, ..base.clone() }, "block_scale"),
            (TerrainConfig { block_scale: f64::NAN, ..base.clone() }, "block_scale"),
            (TerrainConfig { view_distance: -1, ..base.clone() }, "view_distance"),
            (TerrainConfig { max_height: 0, ..base.clone() }, "max_height"),
            (TerrainConfig { height_octaves: 0, ..base.clone() }, "height_octaves"),
            (TerrainConfig { cave_octaves: 0, ..base.clone() }, "cave_octaves"),
            (TerrainConfig { cave_threshold: 1.5, ..base.clone() }, "cave_threshold"),
            (TerrainConfig { cave_threshold: f64::NAN, ..base.clone() }, "cave_threshold"),
        ];

        for (config, field) in &cases {
            assert_eq!(rejected_field(config), *field);
        }
    }

    #[test]
    fn test_zero_view_distance_is_valid() {
        let config = TerrainConfig {
            view_distance: 0,
            ..TerrainConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = TerrainConfig::from_toml_str("seed = 1234\nview_distance = 5\n").unwrap();

        assert_eq!(config.seed, 1234);
        assert_eq!(config.view_distance, 5);
        assert_eq!(config.chunk_size, TerrainConfig::default().chunk_size);
    }

    #[test]
    fn test_from_toml_rejects_unknown_and_invalid() {
        assert!(matches!(
            TerrainConfig::from_toml_str("gravity = -25.0\n"),
            Err(TerrainError::ConfigParse(_))
        ));
        assert!(matches!(
            TerrainConfig::from_toml_str("chunk_size = 0\n"),
            Err(TerrainError::InvalidConfig { field: "chunk_size", .. })
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TerrainConfig {
            seed: 8123,
            cave_threshold: 0.4,
            ..TerrainConfig::default()
        };

        let text = config.to_toml_string().unwrap();
        assert_eq!(TerrainConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("voxterra_missing_config.toml");
        assert!(matches!(
            TerrainConfig::load(&path),
            Err(TerrainError::ConfigIo { .. })
        ));
    }

    #[test]
    fn test_random_seed_in_range() {
        for _ in 0..32 {
            let config = TerrainConfig::with_random_seed();
            assert!(TerrainConfig::RANDOM_SEED_RANGE.contains(&config.seed));
            assert_eq!(config.validate(), Ok(()));
        }
    }
}
