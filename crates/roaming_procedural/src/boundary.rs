//! # Boundary Oracle
//!
//! Deterministic edge profiles shared between neighboring chunks.
//!
//! Every edge of the chunk grid is identified by a *canonical* key:
//! the east edge of `(cx, cy)` and the west edge of `(cx+1, cy)` are
//! the same edge and must normalize to the same key before seeding.
//! Both incident chunks then derive the same RNG stream and therefore
//! see the same corridor openings, without ever generating each other.

use crate::chunk::ChunkCoord;
use crate::config::WorldConfig;
use crate::rng::{ChunkRng, Stream, WorldSeed};

/// A side of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The y = 0 row.
    North,
    /// The x = size-1 column.
    East,
    /// The y = size-1 row.
    South,
    /// The x = 0 column.
    West,
}

impl Side {
    /// All four sides, in stamping order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Chunk-coordinate offset of the neighbor across this side.
    #[inline]
    #[must_use]
    pub const fn neighbor_offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Canonical identity of one shared edge.
///
/// `Horizontal { x, y }` is the edge between the south row of
/// `(x, y-1)` and the north row of `(x, y)`. `Vertical { x, y }` is
/// the edge between the east column of `(x-1, y)` and the west column
/// of `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKey {
    /// A shared north/south row.
    Horizontal {
        /// Chunk X of both incident chunks.
        x: i32,
        /// Chunk Y of the southern incident chunk.
        y: i32,
    },
    /// A shared east/west column.
    Vertical {
        /// Chunk X of the eastern incident chunk.
        x: i32,
        /// Chunk Y of both incident chunks.
        y: i32,
    },
}

impl EdgeKey {
    /// Canonicalizes `side` of the chunk at `coord`.
    #[must_use]
    pub const fn for_side(coord: ChunkCoord, side: Side) -> Self {
        match side {
            Side::North => Self::Horizontal {
                x: coord.x,
                y: coord.y,
            },
            Side::South => Self::Horizontal {
                x: coord.x,
                y: coord.y + 1,
            },
            Side::West => Self::Vertical {
                x: coord.x,
                y: coord.y,
            },
            Side::East => Self::Vertical {
                x: coord.x + 1,
                y: coord.y,
            },
        }
    }

    /// Addressing words for the edge RNG stream.
    ///
    /// The orientation is folded into the low bit of the first word so
    /// `Horizontal { x, y }` and `Vertical { x, y }` never seed the
    /// same stream.
    #[must_use]
    const fn seed_words(self) -> (i64, i64) {
        match self {
            Self::Horizontal { x, y } => ((x as i64) << 1, y as i64),
            Self::Vertical { x, y } => (((x as i64) << 1) | 1, y as i64),
        }
    }
}

/// Corridor openings along one edge, sorted ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeProfile {
    length: usize,
    openings: Vec<usize>,
}

impl EdgeProfile {
    /// Opening positions along the edge, sorted ascending.
    ///
    /// Positions are local offsets along the edge axis, always inside
    /// `[2, length - 3]` so no opening can sit on a corner.
    #[inline]
    #[must_use]
    pub fn openings(&self) -> &[usize] {
        &self.openings
    }

    /// Number of openings.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.openings.len()
    }

    /// Edge length in cells (the chunk size).
    #[inline]
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Returns true if `pos` is an opening.
    #[must_use]
    pub fn is_open(&self, pos: usize) -> bool {
        self.openings.binary_search(&pos).is_ok()
    }
}

/// Produces the deterministic profile of any chunk edge.
#[derive(Clone, Debug)]
pub struct BoundaryOracle {
    seed: WorldSeed,
    size: usize,
    openings_min: usize,
    openings_max: usize,
}

impl BoundaryOracle {
    /// Minimum distance between two openings on the same edge.
    const MIN_SPACING: usize = 2;

    /// Position redraws allowed before the opening count is reduced.
    const ATTEMPT_BUDGET: usize = 16;

    /// Creates an oracle for the given seed and configuration.
    #[must_use]
    pub fn new(seed: WorldSeed, config: &WorldConfig) -> Self {
        Self {
            seed,
            size: config.chunk_size,
            openings_min: config.openings_min,
            openings_max: config.openings_max,
        }
    }

    /// Returns the profile of `side` of the chunk at `coord`.
    ///
    /// Stateless beyond the seed: both chunks incident to the edge
    /// observe the identical profile.
    #[must_use]
    pub fn profile(&self, coord: ChunkCoord, side: Side) -> EdgeProfile {
        let (a, b) = EdgeKey::for_side(coord, side).seed_words();
        let mut rng = ChunkRng::new(self.seed, Stream::Edge, a, b);

        let lo = 2;
        let hi = self.size - 3;
        let mut count =
            rng.range_i32(self.openings_min as i32, self.openings_max as i32) as usize;

        let mut openings: Vec<usize> = Vec::with_capacity(count);
        let mut attempts = 0;
        while openings.len() < count {
            if attempts == Self::ATTEMPT_BUDGET {
                // Could not fit another opening; degrade rather than spin.
                count -= 1;
                attempts = 0;
                continue;
            }
            attempts += 1;

            let pos = rng.range_i32(lo as i32, hi as i32) as usize;
            if openings
                .iter()
                .all(|&q| q.abs_diff(pos) >= Self::MIN_SPACING)
            {
                openings.push(pos);
                attempts = 0;
            }
        }

        openings.sort_unstable();
        EdgeProfile {
            length: self.size,
            openings,
        }
    }
}
