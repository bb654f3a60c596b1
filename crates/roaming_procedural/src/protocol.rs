//! # Wire Protocol Types
//!
//! Serialized chunk shapes consumed by the HTTP layer.
//!
//! The non-debug response is exactly the grid: `S` strings of `S`
//! glyphs, top row first. The debug response wraps the same grid with
//! the style scalars, wavelength summary and integer-millisecond
//! phase timings of the build that produced the chunk.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunk::{Cell, Chunk, ChunkDebug, PhaseTimings};

/// Rounds a duration to whole milliseconds.
fn millis(duration: Duration) -> u64 {
    (duration.as_secs_f64() * 1000.0).round() as u64
}

/// A chunk grid on the wire: `S` rows of `S` glyphs, top row first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkPayload {
    /// Grid rows, each `chunk_size` glyphs long.
    pub rows: Vec<String>,
}

impl ChunkPayload {
    /// Serializes a chunk's grid.
    #[must_use]
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self { rows: chunk.rows() }
    }

    /// Reads the cell at local coordinates from the wire form.
    ///
    /// Rows shorter than `x` and missing rows read as walls, matching
    /// the in-memory out-of-bounds behavior.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.rows
            .get(y)
            .and_then(|row| row.chars().nth(x))
            .map_or(Cell::Wall, Cell::from_glyph)
    }
}

/// Phase timings in integer milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingsMs {
    /// Seed and style field setup.
    pub setup: u64,
    /// Grid allocation and boundary stamping.
    pub init: u64,
    /// Stub carving.
    pub boundary_corridors: u64,
    /// Room placement.
    pub room_generation: u64,
    /// Room carving.
    pub room_floors: u64,
    /// Hallway carving.
    pub room_hallways: u64,
    /// Stub-to-room connections.
    pub boundary_connections: u64,
    /// Whole generator pipeline.
    pub total: u64,
    /// Pipeline plus facade overhead (verification, publication).
    pub total_with_overhead: u64,
}

impl From<&PhaseTimings> for TimingsMs {
    fn from(timings: &PhaseTimings) -> Self {
        Self {
            setup: millis(timings.setup),
            init: millis(timings.init),
            boundary_corridors: millis(timings.boundary_corridors),
            room_generation: millis(timings.room_generation),
            room_floors: millis(timings.room_floors),
            room_hallways: millis(timings.room_hallways),
            boundary_connections: millis(timings.boundary_connections),
            total: millis(timings.total),
            total_with_overhead: millis(timings.total_with_overhead),
        }
    }
}

/// Debug metadata attached to a chunk response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Room density / tablet richness channel at this chunk.
    pub alpha: f64,
    /// Hallway cycle channel at this chunk.
    pub beta: f64,
    /// Room size spread channel at this chunk.
    pub spatial_variation: f64,
    /// Generator pipeline time of the original build, in milliseconds.
    pub generation_time: u64,
    /// Style field wavelength summary, one line per channel.
    pub wavelengths: Vec<String>,
    /// Per-phase timings of the original build.
    pub timings: TimingsMs,
}

impl From<&ChunkDebug> for DebugInfo {
    fn from(debug: &ChunkDebug) -> Self {
        Self {
            alpha: debug.alpha,
            beta: debug.beta,
            spatial_variation: debug.spatial_variation,
            generation_time: millis(debug.timings.total),
            wavelengths: debug.wavelengths.clone(),
            timings: TimingsMs::from(&debug.timings),
        }
    }
}

/// Debug variant of the chunk response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkDebugPayload {
    /// Grid rows, as in the non-debug response.
    pub data: Vec<String>,
    /// Build metadata.
    pub debug: DebugInfo,
}

impl ChunkDebugPayload {
    /// Serializes a chunk with its stored build metadata.
    ///
    /// Cache hits reuse the metadata of the build that produced the
    /// chunk; the timings describe that one build, not the hit.
    #[must_use]
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            data: chunk.rows(),
            debug: DebugInfo::from(chunk.debug()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkCoord;
    use crate::config::WorldConfig;
    use crate::generator::DungeonGenerator;

    #[test]
    fn test_payload_matches_grid() {
        let gen = DungeonGenerator::new(&WorldConfig::compact());
        let chunk = gen.generate(ChunkCoord::new(-3, 5));
        let payload = ChunkPayload::from_chunk(&chunk);

        assert_eq!(payload.rows.len(), chunk.size());
        for y in 0..chunk.size() {
            for x in 0..chunk.size() {
                assert_eq!(payload.cell(x, y), chunk.get(x, y), "mismatch at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_payload_out_of_bounds_reads_wall() {
        let payload = ChunkPayload {
            rows: vec!["# ".to_owned()],
        };
        assert_eq!(payload.cell(0, 0), Cell::Wall);
        assert_eq!(payload.cell(1, 0), Cell::Floor);
        assert_eq!(payload.cell(5, 0), Cell::Wall);
        assert_eq!(payload.cell(0, 5), Cell::Wall);
    }

    #[test]
    fn test_millis_rounding() {
        assert_eq!(millis(Duration::from_micros(400)), 0);
        assert_eq!(millis(Duration::from_micros(500)), 1);
        assert_eq!(millis(Duration::from_millis(12)), 12);
    }

    #[test]
    fn test_debug_payload_carries_build_metadata() {
        let gen = DungeonGenerator::new(&WorldConfig::compact());
        let chunk = gen.generate(ChunkCoord::new(4, 4));
        let payload = ChunkDebugPayload::from_chunk(&chunk);

        assert_eq!(payload.data, chunk.rows());
        assert_eq!(payload.debug.alpha, chunk.debug().alpha);
        assert_eq!(payload.debug.wavelengths.len(), 3);
        assert_eq!(
            payload.debug.generation_time,
            millis(chunk.debug().timings.total)
        );
    }
}
