//! # Style Fields
//!
//! Smooth scalar fields that bias local dungeon style.
//!
//! Three channels are sampled per chunk:
//!
//! - `alpha`: room density and tablet richness
//! - `beta`: extra hallway connectivity (cycles)
//! - `spatial_variation`: room size spread
//!
//! Each channel is a sum of two sinusoids of `(cx, cy)` whose
//! wavelengths and phases are drawn once from the world seed, so the
//! field is a pure function of `(seed, cx, cy)` and varies slowly
//! across neighboring chunks.

use std::f64::consts::TAU;

use crate::chunk::ChunkCoord;
use crate::rng::{ChunkRng, Stream, WorldSeed};

/// Shortest wavelength a channel can be assigned, in chunks.
const WAVELENGTH_MIN: f64 = 16.0;

/// Longest wavelength a channel can be assigned, in chunks.
const WAVELENGTH_MAX: f64 = 160.0;

/// Style values for one chunk, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkStyle {
    /// Room density / tablet richness channel.
    pub alpha: f64,
    /// Hallway cycle channel.
    pub beta: f64,
    /// Room size spread channel.
    pub spatial_variation: f64,
}

/// One sinusoid pair of a style channel.
#[derive(Clone, Copy, Debug)]
struct Wave {
    wavelength_x: f64,
    wavelength_y: f64,
    phase_x: f64,
    phase_y: f64,
}

impl Wave {
    fn draw(rng: &mut ChunkRng) -> Self {
        let span = WAVELENGTH_MAX - WAVELENGTH_MIN;
        Self {
            wavelength_x: WAVELENGTH_MIN + rng.next_f64() * span,
            wavelength_y: WAVELENGTH_MIN + rng.next_f64() * span,
            phase_x: rng.next_f64() * TAU,
            phase_y: rng.next_f64() * TAU,
        }
    }

    /// Samples the wave at a chunk coordinate, yielding `[0, 1]`.
    fn sample(&self, coord: ChunkCoord) -> f64 {
        let x = f64::from(coord.x);
        let y = f64::from(coord.y);
        0.5 + 0.25 * (TAU * x / self.wavelength_x + self.phase_x).sin()
            + 0.25 * (TAU * y / self.wavelength_y + self.phase_y).sin()
    }
}

/// Samples the three style channels for any chunk coordinate.
#[derive(Clone, Debug)]
pub struct StyleSampler {
    alpha: Wave,
    beta: Wave,
    spatial: Wave,
}

impl StyleSampler {
    /// Creates a sampler with seed-derived wavelengths.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        let mut rng = ChunkRng::new(seed, Stream::Field, 0, 0);
        Self {
            alpha: Wave::draw(&mut rng),
            beta: Wave::draw(&mut rng),
            spatial: Wave::draw(&mut rng),
        }
    }

    /// Samples all channels at a chunk coordinate.
    #[must_use]
    pub fn sample(&self, coord: ChunkCoord) -> ChunkStyle {
        ChunkStyle {
            alpha: self.alpha.sample(coord),
            beta: self.beta.sample(coord),
            spatial_variation: self.spatial.sample(coord),
        }
    }

    /// Human-readable wavelength summary, one line per channel.
    ///
    /// Surfaced verbatim in the debug payload.
    #[must_use]
    pub fn wavelengths(&self) -> Vec<String> {
        [
            ("alpha", &self.alpha),
            ("beta", &self.beta),
            ("spatial_variation", &self.spatial),
        ]
        .into_iter()
        .map(|(name, wave)| {
            format!(
                "{name}: {:.1} x {:.1} chunks",
                wave.wavelength_x, wave.wavelength_y
            )
        })
        .collect()
    }
}
