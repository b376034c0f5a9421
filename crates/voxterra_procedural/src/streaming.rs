//! # Chunk Streaming
//!
//! Keeps the chunk store in step with the observer. The host calls
//! `reconcile` once per tick with the observer's world position:
//!
//! 1. Observer position → block → chunk `(pcx, pcy)`
//! 2. Desired set: every chunk within Chebyshev distance `view_distance`
//! 3. Evict loaded chunks outside the desired set
//! 4. Generate desired chunks that are not loaded
//!
//! Both steps run in ascending coordinate order and complete before the
//! pass returns, so the store is consistent at every tick boundary.
//!
//! While the observer stays in the same chunk and the store still holds
//! exactly the view square, a pass returns at once without building any
//! sets.
//!
//! ## Cost
//!
//! Generation runs inline. A teleport that exposes the whole view square
//! stalls that tick for `(2 * view_distance + 1)^2` chunk generations.

use std::collections::BTreeSet;

use crate::chunk::ChunkGenerator;
use crate::coords::{ChunkCoord, CoordSpace, WorldPos};
use crate::error::TerrainResult;
use crate::store::ChunkStore;

/// What one reconcile pass changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Chunk the observer was in.
    pub observer_chunk: ChunkCoord,
    /// Chunks generated and loaded, in ascending order.
    pub generated: Vec<ChunkCoord>,
    /// Chunks unloaded, in ascending order.
    pub evicted: Vec<ChunkCoord>,
}

impl ReconcileReport {
    /// Returns true if the pass changed nothing.
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.generated.is_empty() && self.evicted.is_empty()
    }
}

/// Cumulative streaming statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Reconcile passes run.
    pub passes: u64,
    /// Passes in which the observer entered a different chunk.
    pub chunk_crossings: u64,
    /// Chunks generated this session.
    pub generated_total: u64,
    /// Chunks evicted this session.
    pub evicted_total: u64,
}

/// Reconciles the loaded chunk set against the observer's surroundings.
#[derive(Clone, Debug)]
pub struct StreamingController {
    space: CoordSpace,
    view_distance: i64,
    last_observer_chunk: Option<ChunkCoord>,
    stats: StreamingStats,
}

impl StreamingController {
    /// Creates a controller.
    ///
    /// `view_distance` is the Chebyshev radius in chunks and must not be
    /// negative.
    #[must_use]
    pub const fn new(space: CoordSpace, view_distance: i64) -> Self {
        Self {
            space,
            view_distance,
            last_observer_chunk: None,
            stats: StreamingStats {
                passes: 0,
                chunk_crossings: 0,
                generated_total: 0,
                evicted_total: 0,
            },
        }
    }

    /// Chebyshev radius in chunks.
    #[inline]
    #[must_use]
    pub const fn view_distance(&self) -> i64 {
        self.view_distance
    }

    /// Chunk the observer was in at the last pass.
    #[inline]
    #[must_use]
    pub const fn last_observer_chunk(&self) -> Option<ChunkCoord> {
        self.last_observer_chunk
    }

    /// Cumulative statistics.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> StreamingStats {
        self.stats
    }

    /// Chunk containing a world position.
    #[inline]
    #[must_use]
    pub fn observer_chunk(&self, observer: WorldPos) -> ChunkCoord {
        self.space.world_to_chunk(observer)
    }

    /// Every chunk within Chebyshev distance `view_distance` of `center`:
    /// a `(2 * view_distance + 1)` square.
    #[must_use]
    pub fn desired_set(&self, center: ChunkCoord) -> BTreeSet<ChunkCoord> {
        self.desired_coords(center).collect()
    }

    fn desired_coords(&self, center: ChunkCoord) -> impl Iterator<Item = ChunkCoord> {
        let r = self.view_distance;
        (-r..=r).flat_map(move |dx| (-r..=r).map(move |dy| center.offset(dx, dy)))
    }

    /// True if the store holds exactly the view square around `center`.
    fn store_matches(&self, center: ChunkCoord, store: &ChunkStore) -> bool {
        let mut count = 0usize;
        let all_loaded = self.desired_coords(center).all(|coord| {
            count += 1;
            store.has(coord)
        });
        all_loaded && count == store.len()
    }

    /// Runs one reconcile pass: evicts chunks outside the view square, then
    /// generates the missing ones.
    ///
    /// # Errors
    ///
    /// `ChunkAlreadyLoaded` if the store was changed mid-pass; cannot occur
    /// when this controller is the store's only writer.
    pub fn reconcile(
        &mut self,
        observer: WorldPos,
        store: &mut ChunkStore,
        generator: &ChunkGenerator,
    ) -> TerrainResult<ReconcileReport> {
        let center = self.observer_chunk(observer);

        self.stats.passes += 1;
        if self.last_observer_chunk == Some(center) {
            if self.store_matches(center, store) {
                return Ok(ReconcileReport {
                    observer_chunk: center,
                    generated: Vec::new(),
                    evicted: Vec::new(),
                });
            }
        } else {
            if let Some(previous) = self.last_observer_chunk {
                self.stats.chunk_crossings += 1;
                tracing::debug!(from = %previous, to = %center, "observer crossed chunk border");
            }
            self.last_observer_chunk = Some(center);
        }

        let desired = self.desired_set(center);
        let loaded = store.keys();

        let mut evicted = Vec::new();
        for &coord in loaded.difference(&desired) {
            if let Some(chunk) = store.remove(coord) {
                tracing::debug!(chunk = %coord, blocks = chunk.len(), "evicted chunk");
                evicted.push(coord);
            }
        }

        let mut generated = Vec::new();
        for &coord in desired.difference(&loaded) {
            let chunk = generator.generate(coord);
            tracing::debug!(chunk = %coord, blocks = chunk.len(), "generated chunk");
            store.insert(coord, chunk)?;
            generated.push(coord);
        }

        self.stats.generated_total += generated.len() as u64;
        self.stats.evicted_total += evicted.len() as u64;

        let report = ReconcileReport {
            observer_chunk: center,
            generated,
            evicted,
        };
        if !report.is_noop() {
            tracing::info!(
                observer = %center,
                generated = report.generated.len(),
                evicted = report.evicted.len(),
                loaded = store.len(),
                "reconciled chunks"
            );
        }
        Ok(report)
    }
}
