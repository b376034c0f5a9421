//! # Improved Perlin Noise
//!
//! Deterministic 3D gradient noise, fractal (octave-summed) noise, and the
//! domain-warped cave density built on top of them.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, this implementation will produce
//! **exactly** the same values on any platform, any time.
//!
//! The permutation table is a Fisher-Yates shuffle of `0..=255` driven by
//! `ChaCha8Rng::seed_from_u64(seed)`: for `i` from 255 down to 1, swap
//! `perm[i]` with `perm[next_u64() % (i + 1)]`. ChaCha output is
//! value-stable, so tables are reproducible across builds of this crate.
//! They are not bit-compatible with other implementations' shuffles.

use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Pre-computed permutation table for noise.
///
/// Computed once from the seed and never mutated afterwards.
#[derive(Clone, Debug)]
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];

        // Initialize with identity permutation
        for (value, slot) in (0..=u8::MAX).zip(perm.iter_mut()) {
            *slot = value;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed.value());
        for i in (1..256usize).rev() {
            #[allow(clippy::cast_possible_truncation)]
            let j = (rng.next_u64() % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        // Double the table so lattice lookups never wrap
        let (low, high) = perm.split_at_mut(256);
        high.copy_from_slice(low);

        Self { perm }
    }

    /// Gets a permutation value.
    ///
    /// Callers keep `index < 512`: every lookup is a masked lattice index
    /// (at most 256) plus a previous table value (at most 255).
    #[inline]
    fn get(&self, index: usize) -> usize {
        usize::from(self.perm[index])
    }
}

/// 3D improved Perlin noise generator.
///
/// `noise` produces values nominally in `[0, 1]`; classic gradient noise
/// may stray marginally outside near lattice boundaries.
///
/// # Example
///
/// ```rust
/// use voxterra_procedural::{PerlinNoise3D, WorldSeed};
///
/// let noise = PerlinNoise3D::new(WorldSeed::new(42));
/// let value = noise.noise(1.5, 2.25, 0.0);
/// assert!((-0.01..=1.01).contains(&value));
///
/// // Integer lattice points always sample the midpoint
/// assert_eq!(noise.noise(3.0, -7.0, 12.0), 0.5);
/// ```
#[derive(Clone, Debug)]
pub struct PerlinNoise3D {
    seed: WorldSeed,
    perm_table: PermutationTable,
}

impl PerlinNoise3D {
    /// Default per-octave frequency multiplier.
    pub const DEFAULT_LACUNARITY: f64 = 2.0;
    /// Default per-octave amplitude multiplier.
    pub const DEFAULT_GAIN: f64 = 0.5;
    /// Threshold below which `cave_density` reports open space.
    pub const DEFAULT_CAVE_THRESHOLD: f64 = 0.45;

    /// Input scaling of both cave density samples.
    const CAVE_BASE_FREQUENCY: f64 = 0.05;
    /// Octaves of both cave density samples.
    const CAVE_OCTAVES: u32 = 4;
    /// Input scaling of the warp sample.
    const WARP_FREQUENCY: f64 = 0.1;
    /// Warp offset magnitude, in input units.
    const WARP_STRENGTH: f64 = 4.0;

    /// Creates a new noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            seed,
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Returns the seed this field was built from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Samples 3D gradient noise.
    ///
    /// # Returns
    ///
    /// A value approximately in `[0, 1]`. Exactly `0.5` at integer lattice
    /// points.
    #[must_use]
    #[allow(clippy::many_single_char_names, clippy::similar_names)]
    pub fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, xf) = lattice(x);
        let (yi, yf) = lattice(y);
        let (zi, zf) = lattice(z);

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let p = &self.perm_table;
        let a = p.get(xi) + yi;
        let b = p.get(xi + 1) + yi;

        // Corner hashes, named by (x, y, z) offset: 0 = low, 1 = high
        let h000 = p.get(p.get(a) + zi);
        let h010 = p.get(p.get(a + 1) + zi);
        let h001 = p.get(p.get(a) + zi + 1);
        let h011 = p.get(p.get(a + 1) + zi + 1);
        let h100 = p.get(p.get(b) + zi);
        let h110 = p.get(p.get(b + 1) + zi);
        let h101 = p.get(p.get(b) + zi + 1);
        let h111 = p.get(p.get(b + 1) + zi + 1);

        let x1 = lerp(grad(h000, xf, yf, zf), grad(h100, xf - 1.0, yf, zf), u);
        let x2 = lerp(
            grad(h010, xf, yf - 1.0, zf),
            grad(h110, xf - 1.0, yf - 1.0, zf),
            u,
        );
        let y1 = lerp(x1, x2, v);

        let x3 = lerp(
            grad(h001, xf, yf, zf - 1.0),
            grad(h101, xf - 1.0, yf, zf - 1.0),
            u,
        );
        let x4 = lerp(
            grad(h011, xf, yf - 1.0, zf - 1.0),
            grad(h111, xf - 1.0, yf - 1.0, zf - 1.0),
            u,
        );
        let y2 = lerp(x3, x4, v);

        (lerp(y1, y2, w) + 1.0) / 2.0
    }

    /// Generates fractal (octave-summed) noise.
    ///
    /// Each octave multiplies frequency by `lacunarity` and amplitude by
    /// `gain`, both starting at 1.0. The sum is normalized by the total
    /// amplitude, so a single octave returns exactly `noise(x, y, z)`.
    ///
    /// # Arguments
    ///
    /// * `x`, `y`, `z` - Coordinates
    /// * `octaves` - Number of noise layers; zero yields 0.0
    /// * `lacunarity` - Frequency increase per octave (typically 2.0)
    /// * `gain` - Amplitude decay per octave (typically 0.5)
    #[must_use]
    pub fn fractal_noise(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        lacunarity: f64,
        gain: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.noise(x * frequency, y * frequency, z * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= gain;
            frequency *= lacunarity;
        }

        if max_amplitude == 0.0 {
            return 0.0;
        }
        total / max_amplitude
    }

    /// Fractal noise with the default lacunarity and gain.
    #[inline]
    #[must_use]
    pub fn fractal(&self, x: f64, y: f64, z: f64, octaves: u32) -> f64 {
        self.fractal_noise(
            x,
            y,
            z,
            octaves,
            Self::DEFAULT_LACUNARITY,
            Self::DEFAULT_GAIN,
        )
    }

    /// Domain-warped cave density at a point.
    ///
    /// Averages two 4-octave fractal samples at base frequency 0.05: one at
    /// the point itself, one with every input coordinate offset by a warp
    /// scalar taken from a single `noise` sample at frequency 0.1.
    #[must_use]
    pub fn cave_density_value(&self, x: f64, y: f64, z: f64) -> f64 {
        let f = Self::CAVE_BASE_FREQUENCY;
        let d = self.fractal(x * f, y * f, z * f, Self::CAVE_OCTAVES);

        let wf = Self::WARP_FREQUENCY;
        let warp = self.noise(x * wf, y * wf, z * wf) * Self::WARP_STRENGTH;
        let d2 = self.fractal(
            (x + warp) * f,
            (y + warp) * f,
            (z + warp) * f,
            Self::CAVE_OCTAVES,
        );

        (d + d2) * 0.5
    }

    /// Returns true when the point is open (carved), i.e. its cave density
    /// is below `threshold`.
    #[inline]
    #[must_use]
    pub fn cave_density(&self, x: f64, y: f64, z: f64, threshold: f64) -> bool {
        self.cave_density_value(x, y, z) < threshold
    }
}

/// Splits a coordinate into its lattice cell (masked to `0..=255`) and the
/// fractional offset within it.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lattice(v: f64) -> (usize, f64) {
    let floor = v.floor();
    ((floor as i64 & 255) as usize, v - floor)
}

/// Quintic smoothing curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Pseudo-gradient dot product: picks two of the offset components from
/// the low four hash bits and flips their signs from bits 0 and 1.
#[inline]
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}
