//! # Rooms of Roaming: Procedural Dungeon Core
//!
//! Deterministic chunked dungeon generation for a shared, infinite
//! ASCII world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: a chunk is a pure function of the world seed
//!    and its coordinate: same inputs, same grid, on any platform
//! 2. **Seamless**: adjacent chunks agree along their shared edge
//!    without ever generating each other
//! 3. **Chunked**: the world is served one fixed-size grid at a time
//!    and never materialized as a whole
//! 4. **Bounded**: generated chunks are memoized with single-flight
//!    builds and LRU eviction
//!
//! ## Core Components
//!
//! - `ChunkRng` / `WorldSeed`: coordinate-addressable random streams
//! - `BoundaryOracle`: deterministic edge profiles shared by neighbors
//! - `DungeonGenerator`: rooms, hallways and tablets under boundary
//!   constraints
//! - `ChunkCache`: request-coalescing memo over coordinates
//! - `WorldManager`: the `chunk(coord)` entry point hosts build on
//!
//! ## Example
//!
//! ```rust,ignore
//! use roaming_procedural::{ChunkCoord, WorldConfig, WorldManager};
//!
//! let world = WorldManager::new(WorldConfig::production())?;
//! let chunk = world.chunk(ChunkCoord::new(0, 0))?;
//!
//! // Adjacent chunks join seamlessly.
//! let east = world.chunk(ChunkCoord::new(1, 0))?;
//! assert_eq!(chunk.east_column(), east.west_column());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod boundary;
pub mod cache;
pub mod chunk;
pub mod config;
pub mod error;
pub mod field;
pub mod generator;
pub mod protocol;
pub mod rng;
pub mod world;

pub use boundary::{BoundaryOracle, EdgeKey, EdgeProfile, Side};
pub use cache::ChunkCache;
pub use chunk::{Cell, Chunk, ChunkCoord, ChunkDebug, PhaseTimings};
pub use config::WorldConfig;
pub use error::{WorldError, WorldResult};
pub use field::{ChunkStyle, StyleSampler};
pub use generator::DungeonGenerator;
pub use protocol::{ChunkDebugPayload, ChunkPayload, DebugInfo, TimingsMs};
pub use rng::{ChunkRng, Stream, WorldSeed};
pub use world::{WorldManager, WorldStats};
