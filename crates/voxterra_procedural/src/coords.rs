//! # Coordinate Spaces
//!
//! Pure conversions between the three spaces terrain lives in:
//!
//! - **World**: continuous positions, in world units (`WorldPos`)
//! - **Block**: integer cells, one per `block_scale` world units (`BlockCoord`)
//! - **Chunk**: integer column groups, `chunk_size` x `chunk_size` blocks
//!   wide and unbounded in height (`ChunkCoord`)
//!
//! Block to chunk uses floor division, so block `-1` lives in chunk `-1`,
//! never in chunk `0`.

use std::fmt;

/// A continuous position in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPos {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate (up).
    pub z: f64,
}

impl WorldPos {
    /// Creates a new world position.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for WorldPos {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Block coordinate. `z` is the vertical axis.
///
/// Ordered x, then y, then z, so a column's blocks are contiguous and
/// sorted bottom to top in ordered maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockCoord {
    /// X coordinate (in blocks).
    pub x: i64,
    /// Y coordinate (in blocks).
    pub y: i64,
    /// Z coordinate (in blocks, up).
    pub z: i64,
}

impl BlockCoord {
    /// Creates a new block coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk coordinate (identifies a column chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i64,
    /// Y coordinate (in chunks, not blocks).
    pub y: i64,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance in chunks: the larger of the axis differences.
    #[inline]
    #[must_use]
    pub const fn chebyshev_distance(self, other: Self) -> u64 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy {
            dx
        } else {
            dy
        }
    }

    /// Offsets this coordinate, saturating at the edges of the grid.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// The two fixed scale factors relating the coordinate spaces.
///
/// Both are validated positive by `TerrainConfig::validate` before a
/// `CoordSpace` is built from a config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordSpace {
    chunk_size: i64,
    block_scale: f64,
}

impl CoordSpace {
    /// Creates a coordinate space.
    ///
    /// `chunk_size` and `block_scale` must be positive.
    #[inline]
    #[must_use]
    pub const fn new(chunk_size: i64, block_scale: f64) -> Self {
        Self {
            chunk_size,
            block_scale,
        }
    }

    /// Columns per chunk edge.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> i64 {
        self.chunk_size
    }

    /// World units per block.
    #[inline]
    #[must_use]
    pub const fn block_scale(&self) -> f64 {
        self.block_scale
    }

    /// Converts a world position to the nearest block coordinate.
    ///
    /// Each axis is `round(world / block_scale)` with exact halves going to
    /// the even block, so at scale 2 world `-1.0` and `1.0` are both block
    /// 0. Positions beyond the `i64` range saturate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_block(&self, pos: WorldPos) -> BlockCoord {
        let to_block = |w: f64| round_half_even(w / self.block_scale) as i64;
        BlockCoord::new(to_block(pos.x), to_block(pos.y), to_block(pos.z))
    }

    /// Converts a block coordinate to its world position.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn block_to_world(&self, block: BlockCoord) -> WorldPos {
        let s = self.block_scale;
        WorldPos::new(block.x as f64 * s, block.y as f64 * s, block.z as f64 * s)
    }

    /// Returns the chunk owning a block column.
    ///
    /// Floor division: correct for negative coordinates where plain
    /// integer division would truncate toward zero.
    #[inline]
    #[must_use]
    pub const fn block_to_chunk(&self, block_x: i64, block_y: i64) -> ChunkCoord {
        ChunkCoord::new(
            block_x.div_euclid(self.chunk_size),
            block_y.div_euclid(self.chunk_size),
        )
    }

    /// Returns the chunk owning a block.
    #[inline]
    #[must_use]
    pub const fn chunk_of(&self, block: BlockCoord) -> ChunkCoord {
        self.block_to_chunk(block.x, block.y)
    }

    /// Returns the chunk containing a world position.
    #[inline]
    #[must_use]
    pub fn world_to_chunk(&self, pos: WorldPos) -> ChunkCoord {
        self.chunk_of(self.world_to_block(pos))
    }

    /// Block coordinate of a chunk's origin column (its minimum corner).
    #[inline]
    #[must_use]
    pub const fn chunk_origin(&self, chunk: ChunkCoord) -> (i64, i64) {
        (
            chunk.x.saturating_mul(self.chunk_size),
            chunk.y.saturating_mul(self.chunk_size),
        )
    }

    /// Offset of a block column inside its chunk, each axis in
    /// `[0, chunk_size)`.
    #[inline]
    #[must_use]
    pub const fn local_in_chunk(&self, block_x: i64, block_y: i64) -> (i64, i64) {
        (
            block_x.rem_euclid(self.chunk_size),
            block_y.rem_euclid(self.chunk_size),
        )
    }

    /// Iterates the block columns `(bx, by)` a chunk owns, x-major:
    /// `bx` in `[cx * chunk_size, cx * chunk_size + chunk_size)`, `by` likewise.
    pub fn footprint(&self, chunk: ChunkCoord) -> impl Iterator<Item = (i64, i64)> {
        let size = self.chunk_size;
        let (base_x, base_y) = self.chunk_origin(chunk);
        (0..size).flat_map(move |lx| {
            (0..size).map(move |ly| (base_x.saturating_add(lx), base_y.saturating_add(ly)))
        })
    }
}

/// Rounds to the nearest integer; exact halves go to the even neighbour.
#[inline]
#[allow(clippy::float_cmp)]
fn round_half_even(v: f64) -> f64 {
    if (v - v.trunc()).abs() == 0.5 {
        2.0 * (v / 2.0).round()
    } else {
        v.round()
    }
}
