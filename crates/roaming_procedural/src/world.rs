//! # World Manager
//!
//! Thin facade over the generator and the chunk cache.
//!
//! `chunk()` is the single entry point the host exposes: it validates
//! the coordinate, consults the cache, and on a miss runs the
//! generator followed by the consistency self-check before the result
//! is published. The generator itself is pure, so any number of
//! managers built from the same configuration serve bit-identical
//! worlds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::ChunkCache;
use crate::chunk::{Chunk, ChunkCoord};
use crate::config::WorldConfig;
use crate::error::{WorldError, WorldResult};
use crate::generator::DungeonGenerator;
use crate::protocol::{ChunkDebugPayload, ChunkPayload};

/// Counters describing a manager's lifetime so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Generator invocations (cache misses that ran a build).
    pub generated: u64,
    /// Entries currently held by the cache.
    pub cached: usize,
}

/// Serves chunks of one world: cache in front, generator behind.
pub struct WorldManager {
    config: WorldConfig,
    generator: DungeonGenerator,
    cache: ChunkCache,
    generated: AtomicU64,
}

impl WorldManager {
    /// Largest absolute chunk coordinate the facade accepts.
    pub const COORD_LIMIT: i32 = 1_000_000;

    /// Creates a manager after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] when the configuration
    /// fails [`WorldConfig::validate`].
    pub fn new(config: WorldConfig) -> WorldResult<Self> {
        config.validate()?;
        Ok(Self {
            generator: DungeonGenerator::new(&config),
            cache: ChunkCache::new(config.cache_capacity),
            config,
            generated: AtomicU64::new(0),
        })
    }

    /// The configuration this world was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the chunk at `coord`, generating it at most once.
    ///
    /// Concurrent requests for the same coordinate coalesce onto a
    /// single build; requests for different coordinates are
    /// independent. A freshly built chunk passes the consistency
    /// self-check before publication.
    ///
    /// # Errors
    ///
    /// [`WorldError::CoordinateOutOfRange`] for coordinates beyond
    /// [`Self::COORD_LIMIT`]; [`WorldError::ConsistencyViolation`] if
    /// the self-check fails (never cached).
    pub fn chunk(&self, coord: ChunkCoord) -> WorldResult<Arc<Chunk>> {
        if coord.x.abs() > Self::COORD_LIMIT || coord.y.abs() > Self::COORD_LIMIT {
            return Err(WorldError::CoordinateOutOfRange {
                cx: coord.x,
                cy: coord.y,
            });
        }

        self.cache.get_or_build(coord, || {
            let build_start = Instant::now();
            self.generated.fetch_add(1, Ordering::SeqCst);
            let mut chunk = self.generator.generate(coord);
            self.generator.verify(&chunk)?;
            chunk.record_overhead(build_start.elapsed());
            Ok(chunk)
        })
    }

    /// The chunk at `coord` in wire form.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::chunk`].
    pub fn payload(&self, coord: ChunkCoord) -> WorldResult<ChunkPayload> {
        Ok(ChunkPayload::from_chunk(self.chunk(coord)?.as_ref()))
    }

    /// The chunk at `coord` in wire form with debug metadata.
    ///
    /// The metadata describes the build that produced the chunk; a
    /// cache hit returns the stored first-build timings.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::chunk`].
    pub fn payload_debug(&self, coord: ChunkCoord) -> WorldResult<ChunkDebugPayload> {
        Ok(ChunkDebugPayload::from_chunk(self.chunk(coord)?.as_ref()))
    }

    /// Tablet positions of the chunk at `coord`, in placement order.
    ///
    /// The external tablet store keys its content by
    /// `(cx, cy, local_x, local_y)`; for a fixed seed and
    /// configuration this list is stable across reloads.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::chunk`].
    pub fn tablet_locations(&self, coord: ChunkCoord) -> WorldResult<Vec<(usize, usize)>> {
        Ok(self.chunk(coord)?.tablets().to_vec())
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            generated: self.generated.load(Ordering::SeqCst),
            cached: self.cache.len(),
        }
    }
}
