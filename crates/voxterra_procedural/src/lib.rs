//! # VOXTERRA Procedural Generation
//!
//! Deterministic, effectively infinite voxel terrain, streamed in and out
//! of memory around a moving observer.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Chunked**: Terrain is generated in column chunks
//! 3. **Streamable**: Chunks are generated and discarded independently,
//!    and never persisted
//! 4. **Host-driven**: No global state and no event loop; the host owns a
//!    session and calls it once per tick
//!
//! ## Core Components
//!
//! - `PerlinNoise3D`: 3D gradient noise, fractal sums, warped cave density
//! - `CoordSpace`: world / block / chunk coordinate conversion
//! - `ChunkGenerator`: produces chunks from noise
//! - `ChunkStore`: owns the loaded chunks
//! - `StreamingController`: per-tick load/evict reconciliation
//! - `TerrainWorld`: the session tying them together
//!
//! ## Example
//!
//! ```rust
//! use voxterra_procedural::{TerrainConfig, TerrainWorld, WorldPos};
//!
//! let mut world = TerrainWorld::new(TerrainConfig::default()).unwrap();
//!
//! // Observer spawns above the origin
//! let report = world.tick(WorldPos::new(0.0, 0.0, 50.0)).unwrap();
//! assert_eq!(world.loaded_chunk_count(), 49);
//! assert!(report.evicted.is_empty());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod coords;
pub mod error;
pub mod noise;
pub mod store;
pub mod streaming;
pub mod world;

pub use chunk::{layer_material, Block, Chunk, ChunkGenerator, Material};
pub use config::TerrainConfig;
pub use coords::{BlockCoord, ChunkCoord, CoordSpace, WorldPos};
pub use error::{TerrainError, TerrainResult};
pub use noise::{PerlinNoise3D, WorldSeed};
pub use store::ChunkStore;
pub use streaming::{ReconcileReport, StreamingController, StreamingStats};
pub use world::TerrainWorld;
