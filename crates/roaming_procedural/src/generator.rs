//! # Dungeon Generator
//!
//! Produces a full chunk grid consistent with its four boundary
//! profiles: carves rooms, connects them internally, joins them to the
//! boundary openings, and places tablets.
//!
//! ## Pipeline
//!
//! 1. `setup`: open the chunk RNG stream, sample style fields, ask
//!    the boundary oracle for all four edge profiles
//! 2. `init`: all-wall grid, stamp openings into the frame
//! 3. `boundary_corridors`: carve a perpendicular stub inward from
//!    every opening
//! 4. `room_generation`: place non-overlapping room rectangles
//! 5. `room_floors`: carve the accepted rectangles
//! 6. `room_hallways`: chain rooms with L-shaped corridors, plus
//!    style-driven extra connections
//! 7. `boundary_connections`: join every stub tip to its nearest room
//! 8. tablets, then final assembly with per-phase timings
//!
//! The pipeline is pure: output depends on `(seed, config, cx, cy)`
//! alone, and iteration order everywhere is list order driven by the
//! RNG stream, never hash iteration.

use std::time::Instant;

use crate::boundary::{BoundaryOracle, EdgeProfile, Side};
use crate::chunk::{Cell, Chunk, ChunkCoord, ChunkDebug, PhaseTimings};
use crate::config::WorldConfig;
use crate::error::{WorldError, WorldResult};
use crate::field::{ChunkStyle, StyleSampler};
use crate::rng::{ChunkRng, Stream, WorldSeed};

/// Longest boundary stub, in cells inward from the opening.
const STUB_MAX: i32 = 6;

/// Shortest boundary stub.
const STUB_MIN: i32 = 2;

/// Most extra hallway edges the style fields can request.
const EXTRA_HALLWAYS_MAX: f64 = 2.0;

/// Placement retries for a tablet inside one room.
const TABLET_ATTEMPTS: usize = 8;

/// Placement retries per forced room in the degraded mode.
const FORCED_ROOM_ATTEMPTS: usize = 50;

/// An axis-aligned room rectangle in local cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Room {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl Room {
    /// Center cell of the room.
    fn center(&self) -> (usize, usize) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// True if the rectangles expanded by `padding` touch.
    fn intersects(&self, other: &Self, padding: usize) -> bool {
        !(self.x + self.width + padding <= other.x
            || other.x + other.width + padding <= self.x
            || self.y + self.height + padding <= other.y
            || other.y + other.height + padding <= self.y)
    }

    /// True if the rectangle expanded by `margin` covers `(x, y)`.
    fn covers_with_margin(&self, x: usize, y: usize, margin: usize) -> bool {
        x + margin >= self.x
            && x < self.x + self.width + margin
            && y + margin >= self.y
            && y < self.y + self.height + margin
    }

    /// True if `(x, y)` lies strictly inside the room border.
    fn interior_contains(&self, x: usize, y: usize) -> bool {
        self.width >= 3
            && self.height >= 3
            && x > self.x
            && x < self.x + self.width - 1
            && y > self.y
            && y < self.y + self.height - 1
    }
}

/// Working grid state while one chunk is being carved.
struct Carver<'a> {
    config: &'a WorldConfig,
    size: usize,
    cells: Vec<Cell>,
    /// Every cell belonging to a boundary stub, opening included.
    stub_cells: Vec<(usize, usize)>,
    /// Innermost cell of each stub, in carving order.
    stub_tips: Vec<(usize, usize)>,
    rooms: Vec<Room>,
}

impl<'a> Carver<'a> {
    fn new(config: &'a WorldConfig) -> Self {
        let size = config.chunk_size;
        Self {
            config,
            size,
            cells: vec![Cell::Wall; size * size],
            stub_cells: Vec::new(),
            stub_tips: Vec::new(),
            rooms: Vec::new(),
        }
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    #[inline]
    fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[self.idx(x, y)]
    }

    /// Carves `(x, y)` to floor. Re-carving a floor cell is a no-op.
    #[inline]
    fn carve(&mut self, x: usize, y: usize) {
        let idx = self.idx(x, y);
        self.cells[idx] = Cell::Floor;
    }

    /// Local cell of an opening at offset `pos` along `side`.
    fn opening_cell(&self, side: Side, pos: usize) -> (usize, usize) {
        match side {
            Side::North => (pos, 0),
            Side::South => (pos, self.size - 1),
            Side::West => (0, pos),
            Side::East => (self.size - 1, pos),
        }
    }

    /// Stamps every opening of all four profiles into the frame.
    ///
    /// All other border cells stay walls.
    fn stamp_openings(&mut self, profiles: &[EdgeProfile; 4]) {
        for (side, profile) in Side::ALL.into_iter().zip(profiles) {
            for &pos in profile.openings() {
                let (x, y) = self.opening_cell(side, pos);
                self.carve(x, y);
            }
        }
    }

    /// Carves a one-cell stub inward from every opening.
    ///
    /// Stubs are the fixed anchors all later carving must reach.
    fn carve_stubs(&mut self, rng: &mut ChunkRng, profiles: &[EdgeProfile; 4]) {
        for (side, profile) in Side::ALL.into_iter().zip(profiles) {
            for &pos in profile.openings() {
                let depth = rng.range_i32(STUB_MIN, STUB_MAX) as usize;
                let (ox, oy) = self.opening_cell(side, pos);
                self.stub_cells.push((ox, oy));

                let mut tip = (ox, oy);
                for step in 1..=depth {
                    let (x, y) = match side {
                        Side::North => (pos, step),
                        Side::South => (pos, self.size - 1 - step),
                        Side::West => (step, pos),
                        Side::East => (self.size - 1 - step, pos),
                    };
                    self.carve(x, y);
                    self.stub_cells.push((x, y));
                    tip = (x, y);
                }
                self.stub_tips.push(tip);
            }
        }
    }

    /// True if `room` would swallow or touch a boundary stub.
    fn blocks_stub(&self, room: &Room) -> bool {
        self.stub_cells
            .iter()
            .any(|&(x, y)| room.covers_with_margin(x, y, 1))
    }

    /// Attempts room placements until the style-driven target count is
    /// reached or the attempt budget runs out.
    fn place_rooms(&mut self, rng: &mut ChunkRng, style: ChunkStyle) {
        let config = self.config;
        let span = config.rooms_max - config.rooms_min;

        // Blend the density channels with a per-chunk draw so style
        // biases the count without fixing it.
        let bias = 0.6 * style.alpha + 0.4 * style.spatial_variation;
        let weight = (bias + rng.next_f64()) * 0.5;
        let target = config.rooms_min + (span as f64 * weight).round() as usize;
        let target = target.clamp(config.rooms_min, config.rooms_max);

        // Larger spatial_variation widens the room size draw.
        let w_hi = config.room_w_min
            + ((config.room_w_max - config.room_w_min) as f64
                * (0.5 + 0.5 * style.spatial_variation))
                .round() as usize;
        let h_hi = config.room_h_min
            + ((config.room_h_max - config.room_h_min) as f64
                * (0.5 + 0.5 * style.spatial_variation))
                .round() as usize;

        for _ in 0..config.placement_attempts {
            if self.rooms.len() >= target {
                break;
            }
            let width = rng.range_i32(config.room_w_min as i32, w_hi as i32) as usize;
            let height = rng.range_i32(config.room_h_min as i32, h_hi as i32) as usize;
            let x = rng.range_i32(2, (self.size - 2 - width) as i32) as usize;
            let y = rng.range_i32(2, (self.size - 2 - height) as i32) as usize;
            let room = Room {
                x,
                y,
                width,
                height,
            };

            let overlaps = self.rooms.iter().any(|other| room.intersects(other, 1));
            if !overlaps && !self.blocks_stub(&room) {
                self.rooms.push(room);
            }
        }

        if self.rooms.len() < config.rooms_min {
            self.force_place_rooms(rng, config.rooms_min - self.rooms.len());
        }
        if self.rooms.is_empty() {
            self.place_fallback_room();
        }
    }

    /// Degraded placement: smaller rectangles, relaxed padding.
    fn force_place_rooms(&mut self, rng: &mut ChunkRng, deficit: usize) {
        let config = self.config;
        let w_hi = (config.room_w_min + 2).min(config.room_w_max);
        let h_hi = (config.room_h_min + 2).min(config.room_h_max);

        for _ in 0..deficit {
            for _ in 0..FORCED_ROOM_ATTEMPTS {
                let width = rng.range_i32(config.room_w_min as i32, w_hi as i32) as usize;
                let height = rng.range_i32(config.room_h_min as i32, h_hi as i32) as usize;
                let x = rng.range_i32(2, (self.size - 2 - width) as i32) as usize;
                let y = rng.range_i32(2, (self.size - 2 - height) as i32) as usize;
                let room = Room {
                    x,
                    y,
                    width,
                    height,
                };

                let overlaps = self.rooms.iter().any(|other| room.intersects(other, 0));
                if !overlaps && !self.blocks_stub(&room) {
                    self.rooms.push(room);
                    break;
                }
            }
        }
    }

    /// Last resort: one central room that every stub can reach.
    fn place_fallback_room(&mut self) {
        let side = (self.size / 3).max(4);
        let origin = (self.size - side) / 2;
        self.rooms.push(Room {
            x: origin,
            y: origin,
            width: side,
            height: side,
        });
    }

    /// Carves every accepted room rectangle to floor.
    fn carve_room_floors(&mut self) {
        for i in 0..self.rooms.len() {
            let room = self.rooms[i];
            for y in room.y..room.y + room.height {
                for x in room.x..room.x + room.width {
                    self.carve(x, y);
                }
            }
        }
    }

    /// Horizontal corridor from `x1` to `x2` at row `y`, one cell wide.
    ///
    /// Clamped to the interior so hallways never cross the frame.
    fn carve_horizontal(&mut self, x1: usize, x2: usize, y: usize) {
        let y = y.clamp(1, self.size - 2);
        let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        for x in lo.max(1)..=hi.min(self.size - 2) {
            self.carve(x, y);
        }
    }

    /// Vertical corridor from `y1` to `y2` at column `x`, one cell wide.
    fn carve_vertical(&mut self, y1: usize, y2: usize, x: usize) {
        let x = x.clamp(1, self.size - 2);
        let (lo, hi) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        for y in lo.max(1)..=hi.min(self.size - 2) {
            self.carve(x, y);
        }
    }

    /// L-shaped corridor between two points, elbow chosen by the RNG.
    fn carve_l(&mut self, rng: &mut ChunkRng, from: (usize, usize), to: (usize, usize)) {
        if rng.chance(0.5) {
            // Horizontal first, then vertical.
            self.carve_horizontal(from.0, to.0, from.1);
            self.carve_vertical(from.1, to.1, to.0);
        } else {
            // Vertical first, then horizontal.
            self.carve_vertical(from.1, to.1, from.0);
            self.carve_horizontal(from.0, to.0, to.1);
        }
    }

    /// Chains rooms with corridors and adds style-driven extra edges.
    fn carve_hallways(&mut self, rng: &mut ChunkRng, style: ChunkStyle) {
        // Deterministic room order: left-to-right, then top-to-bottom.
        self.rooms
            .sort_unstable_by_key(|room| (room.center().0, room.center().1));

        if self.rooms.len() < 2 {
            return;
        }

        for i in 0..self.rooms.len() - 1 {
            let from = self.rooms[i].center();
            let to = self.rooms[i + 1].center();
            self.carve_l(rng, from, to);
        }

        // Close the chain into a loop once there are enough rooms.
        if self.rooms.len() >= 3 {
            let first = self.rooms[0].center();
            let last = self.rooms[self.rooms.len() - 1].center();
            self.carve_l(rng, first, last);
        }

        // Extra cycles scale with the beta channel.
        if self.rooms.len() >= 4 {
            let extra = (style.beta * EXTRA_HALLWAYS_MAX).round() as usize;
            for _ in 0..extra {
                let a = rng.index(self.rooms.len());
                let b = rng.index(self.rooms.len());
                if a != b {
                    let from = self.rooms[a].center();
                    let to = self.rooms[b].center();
                    self.carve_l(rng, from, to);
                }
            }
        }
    }

    /// Joins every stub tip to the room center nearest by Manhattan
    /// distance, making each opening reachable from the room graph.
    fn connect_stubs(&mut self, rng: &mut ChunkRng) {
        for i in 0..self.stub_tips.len() {
            let tip = self.stub_tips[i];
            let nearest = self
                .rooms
                .iter()
                .map(Room::center)
                .min_by_key(|&(cx, cy)| cx.abs_diff(tip.0) + cy.abs_diff(tip.1));
            if let Some(center) = nearest {
                self.carve_l(rng, tip, center);
            }
        }
    }

    /// Stamps tablets into room interiors.
    ///
    /// Draws from its own stream so room policy changes cannot move
    /// tablets in unrelated chunks.
    fn place_tablets(&mut self, rng: &mut ChunkRng, style: ChunkStyle) -> Vec<(usize, usize)> {
        let config = self.config;
        let p = (config.tablet_prob * (0.5 + style.alpha)).clamp(0.0, 1.0);
        let mut tablets = Vec::new();

        for i in 0..self.rooms.len() {
            if tablets.len() >= config.tablets_max {
                break;
            }
            let room = self.rooms[i];
            if !rng.chance(p) {
                continue;
            }

            for _ in 0..TABLET_ATTEMPTS {
                if room.width < 3 || room.height < 3 {
                    break;
                }
                let x = rng.range_i32((room.x + 1) as i32, (room.x + room.width - 2) as i32)
                    as usize;
                let y = rng.range_i32((room.y + 1) as i32, (room.y + room.height - 2) as i32)
                    as usize;

                debug_assert!(room.interior_contains(x, y));
                if self.get(x, y) == Cell::Floor {
                    let idx = self.idx(x, y);
                    self.cells[idx] = Cell::Tablet;
                    tablets.push((x, y));
                    break;
                }
            }
        }

        tablets
    }
}

/// The chunked deterministic dungeon generator.
///
/// # Purity
///
/// `generate` is a pure function of `(seed, config, coord)`: calling
/// it any number of times, from any thread, yields bit-identical
/// chunks. It cannot fail on a validated configuration; internal
/// budget exhaustion degrades to fewer rooms and simpler corridors.
#[derive(Clone, Debug)]
pub struct DungeonGenerator {
    seed: WorldSeed,
    config: WorldConfig,
    oracle: BoundaryOracle,
    styles: StyleSampler,
}

impl DungeonGenerator {
    /// Creates a generator for a validated configuration.
    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        let seed = config.seed();
        Self {
            seed,
            config: config.clone(),
            oracle: BoundaryOracle::new(seed, config),
            styles: StyleSampler::new(seed),
        }
    }

    /// The boundary oracle this generator constrains chunks with.
    #[inline]
    #[must_use]
    pub const fn oracle(&self) -> &BoundaryOracle {
        &self.oracle
    }

    /// Generates the chunk at `coord`.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> Chunk {
        let start = Instant::now();
        let mut timings = PhaseTimings::default();

        // setup
        let phase = Instant::now();
        let mut rng =
            ChunkRng::new(self.seed, Stream::Chunk, i64::from(coord.x), i64::from(coord.y));
        let style = self.styles.sample(coord);
        let profiles = Side::ALL.map(|side| self.oracle.profile(coord, side));
        timings.setup = phase.elapsed();

        // init
        let phase = Instant::now();
        let mut carver = Carver::new(&self.config);
        carver.stamp_openings(&profiles);
        timings.init = phase.elapsed();

        // boundary_corridors
        let phase = Instant::now();
        carver.carve_stubs(&mut rng, &profiles);
        timings.boundary_corridors = phase.elapsed();

        // room_generation
        let phase = Instant::now();
        carver.place_rooms(&mut rng, style);
        timings.room_generation = phase.elapsed();

        // room_floors
        let phase = Instant::now();
        carver.carve_room_floors();
        timings.room_floors = phase.elapsed();

        // room_hallways
        let phase = Instant::now();
        carver.carve_hallways(&mut rng, style);
        timings.room_hallways = phase.elapsed();

        // boundary_connections
        let phase = Instant::now();
        carver.connect_stubs(&mut rng);
        timings.boundary_connections = phase.elapsed();

        // tablets + finalize
        let mut tablet_rng =
            ChunkRng::new(self.seed, Stream::Tablet, i64::from(coord.x), i64::from(coord.y));
        let tablets = carver.place_tablets(&mut tablet_rng, style);
        timings.total = start.elapsed();

        Chunk::from_parts(
            coord,
            carver.size,
            carver.cells.into_boxed_slice(),
            tablets,
            ChunkDebug {
                alpha: style.alpha,
                beta: style.beta,
                spatial_variation: style.spatial_variation,
                wavelengths: self.styles.wavelengths(),
                timings,
            },
        )
    }

    /// Post-generation self-check.
    ///
    /// Recomputes the four edge profiles and verifies the frame
    /// matches them, that no tablet touches the frame or sits outside
    /// the strict interior, and that every walkable cell (openings
    /// and room floors included) lies in one 4-connected component.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ConsistencyViolation`] describing the
    /// first defect found. A failure marks a generator bug; the caller
    /// must not cache the chunk.
    pub fn verify(&self, chunk: &Chunk) -> WorldResult<()> {
        let size = chunk.size();
        let coord = chunk.coord();
        let violation = |detail: String| WorldError::ConsistencyViolation {
            cx: coord.x,
            cy: coord.y,
            detail,
        };

        // Frame agreement with the oracle.
        for side in Side::ALL {
            let profile = self.oracle.profile(coord, side);
            for pos in 0..size {
                let (x, y) = match side {
                    Side::North => (pos, 0),
                    Side::South => (pos, size - 1),
                    Side::West => (0, pos),
                    Side::East => (size - 1, pos),
                };
                let cell = chunk.get(x, y);
                if cell == Cell::Tablet {
                    return Err(violation(format!("tablet on the frame at ({x}, {y})")));
                }
                let open = profile.is_open(pos);
                if open && cell != Cell::Floor {
                    return Err(violation(format!(
                        "declared opening at ({x}, {y}) is not a floor"
                    )));
                }
                if !open && cell != Cell::Wall {
                    return Err(violation(format!(
                        "frame cell ({x}, {y}) is open without a declared opening"
                    )));
                }
            }
        }

        // Tablets strictly interior, on recorded coordinates.
        for &(x, y) in chunk.tablets() {
            if x == 0 || y == 0 || x >= size - 1 || y >= size - 1 {
                return Err(violation(format!("tablet at ({x}, {y}) touches the frame")));
            }
            if chunk.get(x, y) != Cell::Tablet {
                return Err(violation(format!(
                    "tablet list names ({x}, {y}) but the cell is not a tablet"
                )));
            }
        }

        // Single walkable component.
        let walkable: Vec<(usize, usize)> = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .filter(|&(x, y)| chunk.get(x, y).is_walkable())
            .collect();
        if let Some(&start) = walkable.first() {
            let mut seen = vec![false; size * size];
            let mut queue = std::collections::VecDeque::new();
            seen[start.1 * size + start.0] = true;
            queue.push_back(start);
            let mut reached = 0usize;

            while let Some((x, y)) = queue.pop_front() {
                reached += 1;
                let neighbors = [
                    (x.wrapping_sub(1), y),
                    (x + 1, y),
                    (x, y.wrapping_sub(1)),
                    (x, y + 1),
                ];
                for (nx, ny) in neighbors {
                    if nx < size && ny < size && chunk.get(nx, ny).is_walkable() {
                        let idx = ny * size + nx;
                        if !seen[idx] {
                            seen[idx] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }

            if reached != walkable.len() {
                return Err(violation(format!(
                    "floor graph split: reached {reached} of {} walkable cells",
                    walkable.len()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> DungeonGenerator {
        DungeonGenerator::new(&WorldConfig::production())
    }

    #[test]
    fn test_generation_determinism() {
        let gen1 = generator();
        let gen2 = generator();
        let coord = ChunkCoord::new(5, -10);

        let chunk1 = gen1.generate(coord);
        let chunk2 = gen2.generate(coord);

        assert_eq!(chunk1.rows(), chunk2.rows(), "grids must be identical");
        assert_eq!(chunk1.tablets(), chunk2.tablets(), "tablets must be identical");
    }

    #[test]
    fn test_frame_matches_oracle() {
        let gen = generator();

        for x in -5..5 {
            let chunk = gen.generate(ChunkCoord::new(x, 2 * x + 1));
            gen.verify(&chunk).expect("self-check should pass");
        }
    }

    #[test]
    fn test_openings_are_floor() {
        let gen = generator();
        let coord = ChunkCoord::new(-3, 8);
        let chunk = gen.generate(coord);

        let profile = gen.oracle().profile(coord, Side::North);
        for &pos in profile.openings() {
            assert_eq!(chunk.get(pos, 0), Cell::Floor, "opening at x={pos} closed");
        }
    }

    #[test]
    fn test_corners_are_wall() {
        let gen = generator();
        let chunk = gen.generate(ChunkCoord::new(11, -7));
        let last = chunk.size() - 1;

        for (x, y) in [(0, 0), (0, last), (last, 0), (last, last)] {
            assert_eq!(chunk.get(x, y), Cell::Wall, "corner ({x}, {y}) not wall");
        }
    }

    #[test]
    fn test_tablets_interior_and_capped() {
        let config = WorldConfig::production();
        let gen = generator();

        for x in -15..15 {
            let chunk = gen.generate(ChunkCoord::new(x, -x * 2));
            assert!(chunk.tablets().len() <= config.tablets_max);
            for &(tx, ty) in chunk.tablets() {
                assert!(tx >= 1 && tx <= chunk.size() - 2, "tablet x={tx} on frame");
                assert!(ty >= 1 && ty <= chunk.size() - 2, "tablet y={ty} on frame");
                assert_eq!(chunk.get(tx, ty), Cell::Tablet);
            }
        }
    }

    #[test]
    fn test_zero_room_config_still_connects() {
        let config = WorldConfig {
            rooms_min: 0,
            rooms_max: 0,
            ..WorldConfig::production()
        };
        let gen = DungeonGenerator::new(&config);

        for y in -4..4 {
            let chunk = gen.generate(ChunkCoord::new(1, y));
            gen.verify(&chunk)
                .expect("fallback central room should keep openings reachable");
        }
    }

    #[test]
    fn test_compact_grid_self_check() {
        let gen = DungeonGenerator::new(&WorldConfig::compact());

        for x in -6..6 {
            let chunk = gen.generate(ChunkCoord::new(x, x * 3 - 1));
            assert_eq!(chunk.size(), WorldConfig::compact().chunk_size);
            gen.verify(&chunk).expect("self-check should pass");
        }
    }

    #[test]
    fn test_room_chain_reaches_every_opening() {
        let gen = generator();
        let coord = ChunkCoord::new(0, 0);
        let chunk = gen.generate(coord);

        // verify() flood-fills the walkable graph; a split component
        // (an opening cut off from the rooms) would fail it.
        gen.verify(&chunk).expect("all openings must reach the rooms");

        let total_openings: usize = Side::ALL
            .into_iter()
            .map(|side| gen.oracle().profile(coord, side).count())
            .sum();
        assert!(total_openings >= 4, "production config opens every side");
    }

    #[test]
    fn test_debug_metadata_populated() {
        let gen = generator();
        let chunk = gen.generate(ChunkCoord::new(2, 2));
        let debug = chunk.debug();

        assert!((0.0..=1.0).contains(&debug.alpha));
        assert!((0.0..=1.0).contains(&debug.beta));
        assert!((0.0..=1.0).contains(&debug.spatial_variation));
        assert_eq!(debug.wavelengths.len(), 3);
        assert!(debug.timings.total >= debug.timings.room_generation);
    }
}
