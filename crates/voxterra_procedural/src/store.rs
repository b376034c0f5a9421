//! # Chunk Store
//!
//! Owns every loaded chunk. A coordinate is either fully loaded (present
//! here with all its blocks) or absent; there is no partial state.
//!
//! The store is an owned value handed to the streaming controller by
//! reference, never ambient global state.

use std::collections::{BTreeMap, BTreeSet};

use crate::chunk::Chunk;
use crate::coords::ChunkCoord;
use crate::error::{TerrainError, TerrainResult};

/// Loaded chunks, keyed and iterated in coordinate order.
#[derive(Clone, Debug, Default)]
pub struct ChunkStore {
    chunks: BTreeMap<ChunkCoord, Chunk>,
}

impl ChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the chunk is loaded.
    #[inline]
    #[must_use]
    pub fn has(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Loads a chunk.
    ///
    /// # Errors
    ///
    /// `ChunkAlreadyLoaded` if the coordinate is occupied; the loaded chunk
    /// is kept and `chunk` is dropped.
    pub fn insert(&mut self, coord: ChunkCoord, chunk: Chunk) -> TerrainResult<()> {
        if self.chunks.contains_key(&coord) {
            return Err(TerrainError::ChunkAlreadyLoaded(coord));
        }
        self.chunks.insert(coord, chunk);
        Ok(())
    }

    /// Unloads a chunk, handing it back so the caller can release anything
    /// tied to its blocks.
    pub fn remove(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        self.chunks.remove(&coord)
    }

    /// Coordinates of every loaded chunk.
    #[must_use]
    pub fn keys(&self) -> BTreeSet<ChunkCoord> {
        self.chunks.keys().copied().collect()
    }

    /// Gets a loaded chunk.
    #[inline]
    #[must_use]
    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Gets a loaded chunk mutably.
    #[inline]
    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    /// Iterates loaded chunks in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Number of loaded chunks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if nothing is loaded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkGenerator;
    use crate::config::TerrainConfig;

    #[test]
    fn test_insert_has_remove() {
        let gen = ChunkGenerator::new(&TerrainConfig::default()).unwrap();
        let mut store = ChunkStore::new();
        let coord = ChunkCoord::new(-1, 4);

        assert!(!store.has(coord));
        store.insert(coord, gen.generate(coord)).unwrap();
        assert!(store.has(coord));
        assert_eq!(store.len(), 1);

        let chunk = store.remove(coord).unwrap();
        assert_eq!(chunk.coord(), coord);
        assert!(store.is_empty());
        assert!(store.remove(coord).is_none());
    }

    #[test]
    fn test_insert_rejects_overwrite() {
        let gen = ChunkGenerator::new(&TerrainConfig::default()).unwrap();
        let mut store = ChunkStore::new();
        let coord = ChunkCoord::new(0, 0);

        store.insert(coord, gen.generate(coord)).unwrap();
        let original = store.get(coord).unwrap().created_at();

        assert_eq!(
            store.insert(coord, gen.generate(coord)),
            Err(TerrainError::ChunkAlreadyLoaded(coord))
        );
        assert_eq!(store.get(coord).unwrap().created_at(), original);
    }

    #[test]
    fn test_keys_are_sorted() {
        let gen = ChunkGenerator::new(&TerrainConfig::default()).unwrap();
        let mut store = ChunkStore::new();

        for coord in [ChunkCoord::new(2, 0), ChunkCoord::new(-3, 5), ChunkCoord::new(0, -1)] {
            store.insert(coord, gen.generate(coord)).unwrap();
        }

        let keys: Vec<ChunkCoord> = store.keys().into_iter().collect();
        assert_eq!(
            keys,
            vec![ChunkCoord::new(-3, 5), ChunkCoord::new(0, -1), ChunkCoord::new(2, 0)]
        );
        let iterated: Vec<ChunkCoord> = store.iter().map(Chunk::coord).collect();
        assert_eq!(iterated, keys);
    }
}
