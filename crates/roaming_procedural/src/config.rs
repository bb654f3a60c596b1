//! # World Configuration
//!
//! Tunables for the dungeon generator and chunk cache.
//!
//! The configuration is established once at startup and treated as
//! immutable afterwards: tablet coordinates handed to the external
//! tablet store are only stable for a fixed `(seed, config)` pair.

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};
use crate::rng::WorldSeed;

/// Configuration for a [`WorldManager`](crate::world::WorldManager).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// 64-bit world seed.
    pub world_seed: u64,
    /// Side length of a chunk grid, in cells.
    pub chunk_size: usize,
    /// Minimum rooms per chunk.
    pub rooms_min: usize,
    /// Maximum rooms per chunk.
    pub rooms_max: usize,
    /// Minimum room width.
    pub room_w_min: usize,
    /// Maximum room width.
    pub room_w_max: usize,
    /// Minimum room height.
    pub room_h_min: usize,
    /// Maximum room height.
    pub room_h_max: usize,
    /// Minimum corridor openings per chunk edge.
    pub openings_min: usize,
    /// Maximum corridor openings per chunk edge.
    pub openings_max: usize,
    /// Room placement attempts per chunk.
    pub placement_attempts: usize,
    /// Per-room tablet probability (weighted by the local style field).
    pub tablet_prob: f64,
    /// Maximum tablets per chunk.
    pub tablets_max: usize,
    /// Chunk cache capacity, in entries.
    pub cache_capacity: usize,
}

impl WorldConfig {
    /// Smallest grid the generator accepts.
    pub const MIN_CHUNK_SIZE: usize = 16;

    /// Production configuration: 48x48 chunks, 4096 cached entries.
    #[must_use]
    pub fn production() -> Self {
        Self {
            world_seed: WorldSeed::default().value(),
            chunk_size: 48,
            rooms_min: 3,
            rooms_max: 8,
            room_w_min: 4,
            room_w_max: 10,
            room_h_min: 4,
            room_h_max: 10,
            openings_min: 1,
            openings_max: 3,
            placement_attempts: 40,
            tablet_prob: 0.15,
            tablets_max: 3,
            cache_capacity: 4096,
        }
    }

    /// Compact configuration for tests: small grid, tiny cache.
    #[must_use]
    pub fn compact() -> Self {
        Self {
            chunk_size: 24,
            rooms_max: 5,
            room_w_max: 6,
            room_h_max: 6,
            cache_capacity: 64,
            ..Self::production()
        }
    }

    /// Returns the world seed as a typed value.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        WorldSeed::new(self.world_seed)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] for a grid below
    /// [`Self::MIN_CHUNK_SIZE`], inverted min/max ranges, a tablet
    /// probability outside `[0, 1]`, or a zero-capacity cache.
    pub fn validate(&self) -> WorldResult<()> {
        if self.chunk_size < Self::MIN_CHUNK_SIZE {
            return Err(invalid(format!(
                "chunk_size {} below minimum {}",
                self.chunk_size,
                Self::MIN_CHUNK_SIZE
            )));
        }
        if self.rooms_min > self.rooms_max {
            return Err(invalid(format!(
                "rooms_min {} exceeds rooms_max {}",
                self.rooms_min, self.rooms_max
            )));
        }
        if self.room_w_min > self.room_w_max || self.room_h_min > self.room_h_max {
            return Err(invalid("inverted room size range".to_owned()));
        }
        if self.room_w_min < 2 || self.room_h_min < 2 {
            return Err(invalid("rooms must be at least 2 cells wide".to_owned()));
        }
        if self.room_w_max + 4 > self.chunk_size || self.room_h_max + 4 > self.chunk_size {
            return Err(invalid(format!(
                "rooms of {}x{} cannot fit a {} cell chunk interior",
                self.room_w_max, self.room_h_max, self.chunk_size
            )));
        }
        if self.openings_min > self.openings_max {
            return Err(invalid(format!(
                "openings_min {} exceeds openings_max {}",
                self.openings_min, self.openings_max
            )));
        }
        if !(0.0..=1.0).contains(&self.tablet_prob) {
            return Err(invalid(format!(
                "tablet_prob {} outside [0, 1]",
                self.tablet_prob
            )));
        }
        if self.cache_capacity == 0 {
            return Err(invalid("cache_capacity must be positive".to_owned()));
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::production()
    }
}

fn invalid(reason: String) -> WorldError {
    WorldError::InvalidConfig { reason }
}
