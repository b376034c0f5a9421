//! # Terrain Error Types
//!
//! All errors that can occur in a terrain session.
//!
//! Noise evaluation and chunk generation cannot fail once a configuration
//! is valid; everything here is either a startup configuration problem or
//! a rejected block mutation.

use thiserror::Error;

use crate::coords::{BlockCoord, ChunkCoord};

/// Errors that can occur in the terrain system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    /// A fixed session parameter is out of range. Fatal: no generation
    /// may start.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        /// The offending parameter.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Configuration text could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(String),

    /// Configuration file could not be read.
    #[error("cannot read configuration {path}: {reason}")]
    ConfigIo {
        /// Path that was read.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },

    /// A chunk was inserted over one that is already loaded.
    #[error("chunk {0} is already loaded")]
    ChunkAlreadyLoaded(ChunkCoord),

    /// A block mutation targeted a chunk that is not loaded.
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkCoord),

    /// A block was placed where a block already exists.
    #[error("block {0} is already occupied")]
    BlockOccupied(BlockCoord),

    /// A block was removed where there is only air.
    #[error("no block at {0}")]
    BlockMissing(BlockCoord),
}

/// Result type for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;
