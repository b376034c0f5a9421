//! # Chunk System
//!
//! Terrain is column-based: a chunk owns a `chunk_size` x `chunk_size` grid
//! of block columns and the full height of each column.
//!
//! ## Generation
//!
//! For every column:
//! 1. Surface height from fractal noise, clamped to at least 2
//! 2. Cells above the two-block floor are carved where the cave sample
//!    does not exceed the threshold
//! 3. Surviving cells get a material from the layer rules
//!
//! Only solid blocks are stored. Absence from a chunk IS air.
//!
//! Chunks are never saved: they are regenerated from the seed on demand.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::TerrainConfig;
use crate::coords::{BlockCoord, ChunkCoord, CoordSpace, WorldPos};
use crate::error::TerrainResult;
use crate::noise::PerlinNoise3D;

/// Block material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Material {
    /// Deep rock, everything below the surface layers.
    Stone = 0,
    /// Two cells below the dirt.
    Sand = 1,
    /// Two cells below the cap.
    Dirt = 2,
    /// The top cell of a column.
    Grass = 3,
}

impl Material {
    /// All materials, in id order.
    pub const ALL: [Self; 4] = [Self::Stone, Self::Sand, Self::Dirt, Self::Grass];

    /// Lowercase name, as used in config files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stone => "stone",
            Self::Sand => "sand",
            Self::Dirt => "dirt",
            Self::Grass => "grass",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown material '{s}'"))
    }
}

/// A solid block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Position in block space.
    pub coord: BlockCoord,
    /// What the block is made of.
    pub material: Material,
}

impl Block {
    /// Creates a block.
    #[inline]
    #[must_use]
    pub const fn new(coord: BlockCoord, material: Material) -> Self {
        Self { coord, material }
    }

    /// The block's position in world units.
    #[inline]
    #[must_use]
    pub fn world_position(&self, space: &CoordSpace) -> WorldPos {
        space.block_to_world(self.coord)
    }
}

/// One layering rule: cells matching `applies(bz, column_height)` take
/// `material`.
#[derive(Clone, Copy)]
struct LayerRule {
    applies: fn(i64, i64) -> bool,
    material: Material,
}

fn any_depth(_bz: i64, _height: i64) -> bool {
    true
}

fn within_five_of_top(bz: i64, height: i64) -> bool {
    bz > height - 5
}

fn within_three_of_top(bz: i64, height: i64) -> bool {
    bz > height - 3
}

fn is_top(bz: i64, height: i64) -> bool {
    bz == height - 1
}

/// Layer rules in priority order. The last matching rule wins.
const LAYER_RULES: [LayerRule; 4] = [
    LayerRule {
        applies: any_depth,
        material: Material::Stone,
    },
    LayerRule {
        applies: within_five_of_top,
        material: Material::Sand,
    },
    LayerRule {
        applies: within_three_of_top,
        material: Material::Dirt,
    },
    LayerRule {
        applies: is_top,
        material: Material::Grass,
    },
];

/// Material of the cell at depth `bz` in a column of height `column_height`.
///
/// Grass caps the column, the two cells below are dirt, the next two sand,
/// and everything deeper is stone.
#[must_use]
pub fn layer_material(bz: i64, column_height: i64) -> Material {
    LAYER_RULES
        .iter()
        .rev()
        .find(|rule| (rule.applies)(bz, column_height))
        .map_or(Material::Stone, |rule| rule.material)
}

/// A chunk of world data.
///
/// Exclusively owns every solid block in its footprint. Dropping the chunk
/// releases all of them.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// Chunk position in the world.
    coord: ChunkCoord,
    /// Solid blocks, sorted by coordinate.
    blocks: BTreeMap<BlockCoord, Block>,
    /// Generated column heights (indexed as `[lx * chunk_size + ly]`).
    heights: Vec<i64>,
    /// Columns per chunk edge.
    chunk_size: i64,
    /// When generation finished.
    created_at: Instant,
    /// Whether a block was placed or removed since generation.
    modified: bool,
}

impl Chunk {
    /// Chunk position in the world.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// When this chunk was generated.
    #[inline]
    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether a block was placed or removed since generation.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Number of solid blocks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the chunk holds no blocks.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Gets the block at a coordinate, `None` for air.
    #[inline]
    #[must_use]
    pub fn block(&self, coord: BlockCoord) -> Option<&Block> {
        self.blocks.get(&coord)
    }

    /// Iterates all solid blocks in coordinate order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Iterates the solid blocks of one column, bottom to top.
    pub fn column(&self, block_x: i64, block_y: i64) -> impl DoubleEndedIterator<Item = &Block> {
        let low = BlockCoord::new(block_x, block_y, i64::MIN);
        let high = BlockCoord::new(block_x, block_y, i64::MAX);
        self.blocks.range(low..=high).map(|(_, block)| block)
    }

    /// Generated height of a column, by local offset in `[0, chunk_size)`.
    ///
    /// This is the height before cave carving and ignores later edits.
    #[must_use]
    pub fn column_height(&self, local_x: i64, local_y: i64) -> Option<i64> {
        if !(0..self.chunk_size).contains(&local_x) || !(0..self.chunk_size).contains(&local_y) {
            return None;
        }
        let index = usize::try_from(local_x * self.chunk_size + local_y).ok()?;
        self.heights.get(index).copied()
    }

    /// Iterates `(world position, material)` for every block, the form the
    /// render and collision collaborators consume.
    pub fn world_blocks<'a>(
        &'a self,
        space: &'a CoordSpace,
    ) -> impl Iterator<Item = (WorldPos, Material)> + 'a {
        self.blocks
            .values()
            .map(move |block| (block.world_position(space), block.material))
    }

    /// Adds a block. Returns false, leaving the chunk unchanged, if the
    /// cell is occupied.
    pub(crate) fn place(&mut self, block: Block) -> bool {
        if self.blocks.contains_key(&block.coord) {
            return false;
        }
        self.blocks.insert(block.coord, block);
        self.modified = true;
        true
    }

    /// Removes and returns the block at a coordinate.
    pub(crate) fn take(&mut self, coord: BlockCoord) -> Option<Block> {
        let block = self.blocks.remove(&coord)?;
        self.modified = true;
        Some(block)
    }
}

/// Chunk generator using procedural noise.
///
/// Generation is a pure function of `(seed, chunk coordinate, config)`.
#[derive(Clone, Debug)]
pub struct ChunkGenerator {
    /// Noise field shared by height and cave sampling.
    noise: PerlinNoise3D,
    /// Chunk size and block scale.
    space: CoordSpace,
    /// Ceiling on column height.
    max_height: i64,
    /// Octaves of the surface height noise.
    height_octaves: u32,
    /// Octaves of the cave carving noise.
    cave_octaves: u32,
    /// Carve threshold.
    cave_threshold: f64,
}

impl ChunkGenerator {
    /// Input scaling of surface height sampling.
    pub const HEIGHT_FREQUENCY: f64 = 0.05;
    /// Input scaling of cave carving sampling.
    pub const CAVE_FREQUENCY: f64 = 0.08;
    /// Lowest column height; also the depth of the uncarvable floor.
    pub const MIN_COLUMN_HEIGHT: i64 = 2;

    /// Creates a generator for a session config.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the config does not validate; no generator is
    /// built from an invalid config.
    pub fn new(config: &TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;
        Ok(Self {
            noise: PerlinNoise3D::new(config.world_seed()),
            space: config.space(),
            max_height: config.max_height,
            height_octaves: config.height_octaves,
            cave_octaves: config.cave_octaves,
            cave_threshold: config.cave_threshold,
        })
    }

    /// The noise field.
    #[inline]
    #[must_use]
    pub const fn noise(&self) -> &PerlinNoise3D {
        &self.noise
    }

    /// The coordinate space.
    #[inline]
    #[must_use]
    pub const fn space(&self) -> &CoordSpace {
        &self.space
    }

    /// Surface height of a column, before cave carving. Always at least
    /// `MIN_COLUMN_HEIGHT`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn column_height(&self, block_x: i64, block_y: i64) -> i64 {
        let f = Self::HEIGHT_FREQUENCY;
        let height_noise = self.noise.fractal(
            block_x as f64 * f,
            block_y as f64 * f,
            0.0,
            self.height_octaves,
        );
        let height = (height_noise * self.max_height as f64).floor() as i64;
        height.max(Self::MIN_COLUMN_HEIGHT)
    }

    /// Whether a cell is carved out by caves.
    ///
    /// The floor (`bz < MIN_COLUMN_HEIGHT`) is never carved. Above it, a
    /// cell stays solid only if its cave sample strictly exceeds the
    /// threshold.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_carved(&self, block_x: i64, block_y: i64, block_z: i64) -> bool {
        if block_z < Self::MIN_COLUMN_HEIGHT {
            return false;
        }
        let f = Self::CAVE_FREQUENCY;
        let cave_value = self.noise.fractal(
            block_x as f64 * f,
            block_y as f64 * f,
            block_z as f64 * f,
            self.cave_octaves,
        );
        cave_value <= self.cave_threshold
    }

    /// Generates the chunk at the given coordinates.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> Chunk {
        let mut blocks = BTreeMap::new();
        let mut heights = Vec::with_capacity(self.heights_capacity());

        for (block_x, block_y) in self.space.footprint(coord) {
            let height = self.column_height(block_x, block_y);
            heights.push(height);
            self.generate_column(&mut blocks, block_x, block_y, height);
        }

        Chunk {
            coord,
            blocks,
            heights,
            chunk_size: self.space.chunk_size(),
            created_at: Instant::now(),
            modified: false,
        }
    }

    /// Fills one column, bottom to top.
    fn generate_column(
        &self,
        blocks: &mut BTreeMap<BlockCoord, Block>,
        block_x: i64,
        block_y: i64,
        height: i64,
    ) {
        for block_z in 0..height {
            if self.is_carved(block_x, block_y, block_z) {
                continue;
            }
            let coord = BlockCoord::new(block_x, block_y, block_z);
            blocks.insert(coord, Block::new(coord, layer_material(block_z, height)));
        }
    }

    fn heights_capacity(&self) -> usize {
        usize::try_from(self.space.chunk_size()).map_or(0, |size| size.saturating_mul(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::WorldSeed;

    fn generator(config: &TerrainConfig) -> ChunkGenerator {
        ChunkGenerator::new(config).unwrap()
    }

    #[test]
    fn test_layer_materials_for_height_ten() {
        let height = 10;

        assert_eq!(layer_material(9, height), Material::Grass);
        assert_eq!(layer_material(8, height), Material::Dirt);
        assert_eq!(layer_material(7, height), Material::Dirt);
        assert_eq!(layer_material(6, height), Material::Sand);
        assert_eq!(layer_material(5, height), Material::Sand);
        for bz in 0..=4 {
            assert_eq!(layer_material(bz, height), Material::Stone, "bz = {bz}");
        }
    }

    #[test]
    fn test_layer_materials_for_minimum_column() {
        // Height 2: the cap is grass and the floor cell falls in the dirt band
        assert_eq!(layer_material(1, 2), Material::Grass);
        assert_eq!(layer_material(0, 2), Material::Dirt);
    }

    #[test]
    fn test_material_names_round_trip() {
        for material in Material::ALL {
            assert_eq!(material.name().parse::<Material>(), Ok(material));
        }
        assert!("bedrock".parse::<Material>().is_err());
    }

    #[test]
    fn test_generator_rejects_invalid_config() {
        let config = TerrainConfig {
            chunk_size: 0,
            ..TerrainConfig::default()
        };
        assert!(ChunkGenerator::new(&config).is_err());

        let config = TerrainConfig {
            max_height: -3,
            ..TerrainConfig::default()
        };
        assert!(ChunkGenerator::new(&config).is_err());
    }

    #[test]
    fn test_chunk_generation_determinism() {
        let config = TerrainConfig::default();
        let gen1 = generator(&config);
        let gen2 = generator(&config);

        for coord in [ChunkCoord::new(5, 10), ChunkCoord::new(-3, -7)] {
            let chunk1 = gen1.generate(coord);
            let chunk2 = gen2.generate(coord);

            assert!(!chunk1.is_empty());
            assert!(
                chunk1.blocks().eq(chunk2.blocks()),
                "Chunk {coord} should regenerate identically"
            );
        }
    }

    #[test]
    fn test_blocks_stay_in_footprint() {
        let config = TerrainConfig::default();
        let gen = generator(&config);
        let coord = ChunkCoord::new(-1, 2);

        let chunk = gen.generate(coord);

        for block in chunk.blocks() {
            assert_eq!(gen.space().chunk_of(block.coord), coord);
            assert!(block.coord.z >= 0);
        }
    }

    #[test]
    fn test_floor_is_never_carved() {
        let config = TerrainConfig {
            cave_threshold: 1.0,
            ..TerrainConfig::default()
        };
        let gen = generator(&config);
        let chunk = gen.generate(ChunkCoord::new(0, 0));

        for (bx, by) in gen.space().footprint(chunk.coord()) {
            for bz in 0..ChunkGenerator::MIN_COLUMN_HEIGHT {
                assert!(
                    chunk.block(BlockCoord::new(bx, by, bz)).is_some(),
                    "Floor missing at ({bx}, {by}, {bz})"
                );
            }
            // Threshold 1.0 carves everything above the floor
            assert_eq!(chunk.column(bx, by).count(), 2);
        }
    }

    #[test]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn test_column_height_follows_surface_noise() {
        let config = TerrainConfig::default();
        let gen = generator(&config);
        let noise = PerlinNoise3D::new(WorldSeed::new(config.seed));

        for (bx, by) in [(0, 0), (-13, 7), (250, -999), (3, 3)] {
            let sample =
                noise.fractal(bx as f64 * 0.05, by as f64 * 0.05, 0.0, config.height_octaves);
            let expected = ((sample * config.max_height as f64).floor() as i64).max(2);
            assert_eq!(gen.column_height(bx, by), expected, "column ({bx}, {by})");
        }
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_cave_carving_matches_samples() {
        let config = TerrainConfig {
            max_height: 40,
            ..TerrainConfig::default()
        };
        let gen = generator(&config);
        let noise = PerlinNoise3D::new(WorldSeed::new(config.seed));
        let coord = ChunkCoord::new(2, -1);
        let chunk = gen.generate(coord);

        let mut carved = 0;
        for (bx, by) in gen.space().footprint(coord) {
            let height = gen.column_height(bx, by);
            for bz in 0..height {
                let present = chunk.block(BlockCoord::new(bx, by, bz)).is_some();
                let sample = noise.fractal(
                    bx as f64 * 0.08,
                    by as f64 * 0.08,
                    bz as f64 * 0.08,
                    config.cave_octaves,
                );
                let solid = bz <= 1 || sample > config.cave_threshold;
                assert_eq!(present, solid, "Carving mismatch at ({bx}, {by}, {bz})");
                if !solid {
                    carved += 1;
                }
            }
            assert!(
                chunk.block(BlockCoord::new(bx, by, height)).is_none(),
                "Nothing above the column height"
            );
        }
        assert!(carved > 0, "Chunk should contain carved cells");
    }

    #[test]
    fn test_uncarved_columns_are_layered() {
        // Threshold 0 keeps every cell (samples are never exactly 0 here)
        let config = TerrainConfig {
            cave_threshold: 0.0,
            max_height: 30,
            ..TerrainConfig::default()
        };
        let gen = generator(&config);
        let chunk = gen.generate(ChunkCoord::new(0, 0));

        for (bx, by) in gen.space().footprint(chunk.coord()) {
            let height = gen.column_height(bx, by);
            let column: Vec<&Block> = chunk.column(bx, by).collect();

            assert_eq!(i64::try_from(column.len()).unwrap(), height);
            for block in column {
                assert_eq!(block.material, layer_material(block.coord.z, height));
            }
        }
    }

    #[test]
    fn test_column_heights_recorded() {
        let config = TerrainConfig::default();
        let gen = generator(&config);
        let coord = ChunkCoord::new(-4, 1);
        let chunk = gen.generate(coord);
        let (base_x, base_y) = gen.space().chunk_origin(coord);

        for lx in 0..config.chunk_size {
            for ly in 0..config.chunk_size {
                let height = chunk.column_height(lx, ly).unwrap();
                assert_eq!(height, gen.column_height(base_x + lx, base_y + ly));
                assert!(height >= ChunkGenerator::MIN_COLUMN_HEIGHT);
                assert!(height <= config.max_height + 1);
            }
        }
        assert_eq!(chunk.column_height(config.chunk_size, 0), None);
        assert_eq!(chunk.column_height(-1, 0), None);
    }

    #[test]
    fn test_world_blocks_are_scaled() {
        let config = TerrainConfig::default();
        let gen = generator(&config);
        let chunk = gen.generate(ChunkCoord::new(1, 1));

        for ((pos, material), block) in chunk.world_blocks(gen.space()).zip(chunk.blocks()) {
            assert_eq!(material, block.material);
            assert_eq!(gen.space().world_to_block(pos), block.coord);
        }
    }

    #[test]
    fn test_place_and_take_mark_modified() {
        let gen = generator(&TerrainConfig::default());
        let mut chunk = gen.generate(ChunkCoord::new(0, 0));
        let floor = BlockCoord::new(0, 0, 0);
        let above = BlockCoord::new(0, 0, 100);

        assert!(!chunk.is_modified());
        assert!(!chunk.place(Block::new(floor, Material::Sand)), "Floor is occupied");
        assert!(!chunk.is_modified());

        assert!(chunk.place(Block::new(above, Material::Grass)));
        assert_eq!(chunk.take(above).map(|b| b.material), Some(Material::Grass));
        assert!(chunk.take(above).is_none());
        assert!(chunk.is_modified());
    }
}
