//! # Terrain World
//!
//! One world session: the validated config, the generator (and its noise
//! field), the chunk store, and the streaming controller, owned together.
//!
//! This is the surface the engine layer talks to. It calls `tick` once per
//! frame with the observer position, reads blocks back for rendering and
//! collision, and forwards block placement and removal once it has
//! resolved which cell the player targeted.
//!
//! Edits live in the loaded chunk only. Evicting the chunk discards them;
//! the next load regenerates pristine terrain from the seed.

use crate::chunk::{Block, Chunk, ChunkGenerator, Material};
use crate::config::TerrainConfig;
use crate::coords::{BlockCoord, ChunkCoord, CoordSpace, WorldPos};
use crate::error::{TerrainError, TerrainResult};
use crate::store::ChunkStore;
use crate::streaming::{ReconcileReport, StreamingController, StreamingStats};

/// A world session.
///
/// # Example
///
/// ```rust
/// use voxterra_procedural::{TerrainConfig, TerrainWorld, WorldPos};
///
/// let mut world = TerrainWorld::new(TerrainConfig::default()).unwrap();
/// let report = world.tick(WorldPos::new(0.0, 0.0, 50.0)).unwrap();
///
/// assert_eq!(report.generated.len(), 49);
/// assert!(world.surface_height(0, 0).is_some());
/// ```
#[derive(Debug)]
pub struct TerrainWorld {
    config: TerrainConfig,
    generator: ChunkGenerator,
    store: ChunkStore,
    streaming: StreamingController,
}

impl TerrainWorld {
    /// Starts a session.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if any fixed parameter is out of range. Nothing is
    /// generated in that case.
    pub fn new(config: TerrainConfig) -> TerrainResult<Self> {
        let generator = ChunkGenerator::new(&config)?;
        let streaming = StreamingController::new(config.space(), config.view_distance);

        tracing::info!(
            seed = config.seed,
            chunk_size = config.chunk_size,
            view_distance = config.view_distance,
            "terrain session started"
        );

        Ok(Self {
            config,
            generator,
            store: ChunkStore::new(),
            streaming,
        })
    }

    /// Reconciles loaded chunks against the observer's position. Call once
    /// per tick.
    ///
    /// # Errors
    ///
    /// Propagates `StreamingController::reconcile` errors.
    pub fn tick(&mut self, observer: WorldPos) -> TerrainResult<ReconcileReport> {
        self.streaming
            .reconcile(observer, &mut self.store, &self.generator)
    }

    /// The session config.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// The coordinate space.
    #[inline]
    #[must_use]
    pub const fn space(&self) -> &CoordSpace {
        self.generator.space()
    }

    /// The chunk generator.
    #[inline]
    #[must_use]
    pub const fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    /// The loaded chunks.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Cumulative streaming statistics.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> StreamingStats {
        self.streaming.stats()
    }

    /// Number of loaded chunks.
    #[inline]
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.store.len()
    }

    /// Gets a loaded chunk.
    #[inline]
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.store.get(coord)
    }

    /// Gets the block at a coordinate. `None` for air or unloaded chunks.
    #[must_use]
    pub fn block_at(&self, coord: BlockCoord) -> Option<&Block> {
        self.store
            .get(self.space().chunk_of(coord))
            .and_then(|chunk| chunk.block(coord))
    }

    /// Z of the topmost solid block in a loaded column, for spawning.
    #[must_use]
    pub fn surface_height(&self, block_x: i64, block_y: i64) -> Option<i64> {
        let chunk = self.store.get(self.space().block_to_chunk(block_x, block_y))?;
        chunk
            .column(block_x, block_y)
            .next_back()
            .map(|block| block.coord.z)
    }

    /// Places a block.
    ///
    /// # Errors
    ///
    /// `ChunkNotLoaded` if the owning chunk is not resident,
    /// `BlockOccupied` if a block is already there.
    pub fn place_block(&mut self, coord: BlockCoord, material: Material) -> TerrainResult<()> {
        let chunk_coord = self.space().chunk_of(coord);
        let Some(chunk) = self.store.get_mut(chunk_coord) else {
            tracing::warn!(block = %coord, chunk = %chunk_coord, "placement outside loaded chunks");
            return Err(TerrainError::ChunkNotLoaded(chunk_coord));
        };
        if !chunk.place(Block::new(coord, material)) {
            tracing::warn!(block = %coord, "placement onto occupied cell");
            return Err(TerrainError::BlockOccupied(coord));
        }
        tracing::debug!(block = %coord, %material, "placed block");
        Ok(())
    }

    /// Removes a block and returns it.
    ///
    /// # Errors
    ///
    /// `ChunkNotLoaded` if the owning chunk is not resident, `BlockMissing`
    /// if the cell is air.
    pub fn remove_block(&mut self, coord: BlockCoord) -> TerrainResult<Block> {
        let chunk_coord = self.space().chunk_of(coord);
        let Some(chunk) = self.store.get_mut(chunk_coord) else {
            tracing::warn!(block = %coord, chunk = %chunk_coord, "removal outside loaded chunks");
            return Err(TerrainError::ChunkNotLoaded(chunk_coord));
        };
        let Some(block) = chunk.take(coord) else {
            tracing::warn!(block = %coord, "removal of air");
            return Err(TerrainError::BlockMissing(coord));
        };
        tracing::debug!(block = %coord, material = %block.material, "removed block");
        Ok(block)
    }

    /// Places a block at the cell nearest a world position.
    ///
    /// # Errors
    ///
    /// As `place_block`.
    pub fn place_block_at_world(&mut self, pos: WorldPos, material: Material) -> TerrainResult<()> {
        let coord = self.space().world_to_block(pos);
        self.place_block(coord, material)
    }

    /// Removes the block at the cell nearest a world position.
    ///
    /// # Errors
    ///
    /// As `remove_block`.
    pub fn remove_block_at_world(&mut self, pos: WorldPos) -> TerrainResult<Block> {
        let coord = self.space().world_to_block(pos);
        self.remove_block(coord)
    }

    /// Iterates `(world position, material)` for every loaded block, chunks
    /// in coordinate order.
    pub fn loaded_blocks(&self) -> impl Iterator<Item = (WorldPos, Material)> + '_ {
        let space = self.space();
        self.store
            .iter()
            .flat_map(move |chunk| chunk.world_blocks(space))
    }
}
