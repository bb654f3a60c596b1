//! # Chunk Cache
//!
//! Keyed, concurrent memoization of generated chunks.
//!
//! ## Contract
//!
//! - **At-most-once generation**: concurrent requests for the same
//!   coordinate run exactly one build; the rest wait and observe the
//!   same result.
//! - **Publication**: a chunk becomes visible only after its build
//!   completes. A failed build publishes the error to its waiters and
//!   leaves nothing cached.
//! - **No lock across generation**: the table lock is held for
//!   lookup and publication only; the build runs unlocked.
//! - **Eviction**: least-recently-used ready entries are dropped once
//!   the table exceeds capacity. Eviction is safe because generation is pure:
//!   re-generation yields the identical chunk.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::chunk::{Chunk, ChunkCoord};
use crate::error::WorldResult;

/// A build in progress, shared between the builder and its waiters.
struct PendingBuild {
    result: Mutex<Option<WorldResult<Arc<Chunk>>>>,
    ready: Condvar,
}

impl PendingBuild {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Blocks until the builder publishes, then returns its result.
    fn wait(&self) -> WorldResult<Arc<Chunk>> {
        let mut slot = self.result.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            self.ready.wait(&mut slot);
        }
    }

    /// Publishes the build result and wakes every waiter.
    fn publish(&self, result: WorldResult<Arc<Chunk>>) {
        *self.result.lock() = Some(result);
        self.ready.notify_all();
    }
}

/// One table slot: either a published chunk or a build in flight.
enum Slot {
    Ready { chunk: Arc<Chunk>, last_used: u64 },
    Pending(Arc<PendingBuild>),
}

/// Table state behind the cache lock.
struct CacheState {
    entries: HashMap<ChunkCoord, Slot>,
    /// Monotonic access counter driving LRU eviction.
    tick: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Drops least-recently-used ready entries down to `capacity`.
    ///
    /// Pending entries are never evicted; their builders publish into
    /// the table regardless of who is still waiting.
    fn evict_to(&mut self, capacity: usize) {
        while self.entries.len() > capacity {
            let oldest = self
                .entries
                .iter()
                .filter_map(|(coord, slot)| match slot {
                    Slot::Ready { last_used, .. } => Some((*last_used, *coord)),
                    Slot::Pending(_) => None,
                })
                .min_by_key(|&(last_used, _)| last_used);
            match oldest {
                Some((_, coord)) => self.entries.remove(&coord),
                None => break,
            };
        }
    }
}

/// Concurrent memo of `(cx, cy) -> Chunk` with LRU eviction.
pub struct ChunkCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl ChunkCache {
    /// Creates a cache bounded to `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                tick: 0,
            }),
            capacity,
        }
    }

    /// Configured capacity, in entries.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently held (ready and in flight).
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the chunk at `coord`, building it at most once.
    ///
    /// On a hit the stored chunk is returned and its LRU stamp
    /// refreshed. On a miss `build` runs outside the table lock;
    /// concurrent requesters for the same coordinate block until that
    /// one build publishes. A requester that abandons the wait does
    /// not cancel the build: it still completes and publishes for
    /// later callers.
    ///
    /// # Errors
    ///
    /// Propagates the builder's error to every coalesced waiter; a
    /// failed build is not cached.
    pub fn get_or_build<F>(&self, coord: ChunkCoord, build: F) -> WorldResult<Arc<Chunk>>
    where
        F: FnOnce() -> WorldResult<Chunk>,
    {
        enum Lookup {
            Hit(Arc<Chunk>),
            Wait(Arc<PendingBuild>),
            Build(Arc<PendingBuild>),
        }

        let lookup = {
            let mut state = self.state.lock();
            let tick = state.next_tick();
            if let Some(slot) = state.entries.get_mut(&coord) {
                match slot {
                    Slot::Ready { chunk, last_used } => {
                        *last_used = tick;
                        Lookup::Hit(chunk.clone())
                    }
                    Slot::Pending(pending) => Lookup::Wait(pending.clone()),
                }
            } else {
                let pending = Arc::new(PendingBuild::new());
                state
                    .entries
                    .insert(coord, Slot::Pending(pending.clone()));
                Lookup::Build(pending)
            }
        };

        let pending = match lookup {
            Lookup::Hit(chunk) => return Ok(chunk),
            Lookup::Wait(pending) => return pending.wait(),
            Lookup::Build(pending) => pending,
        };

        // Build with no lock held.
        let result = build().map(Arc::new);

        // Publish: waiters first, then the table.
        pending.publish(result.clone());
        {
            let mut state = self.state.lock();
            match &result {
                Ok(chunk) => {
                    let tick = state.next_tick();
                    state.entries.insert(
                        coord,
                        Slot::Ready {
                            chunk: chunk.clone(),
                            last_used: tick,
                        },
                    );
                    state.evict_to(self.capacity);
                }
                Err(_) => {
                    state.entries.remove(&coord);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::chunk::ChunkCoord;
    use crate::config::WorldConfig;
    use crate::generator::DungeonGenerator;

    fn build_chunk(coord: ChunkCoord) -> WorldResult<Chunk> {
        Ok(DungeonGenerator::new(&WorldConfig::compact()).generate(coord))
    }

    #[test]
    fn test_hit_returns_same_chunk() {
        let cache = ChunkCache::new(8);
        let coord = ChunkCoord::new(1, 2);

        let first = cache.get_or_build(coord, || build_chunk(coord)).unwrap();
        let second = cache.get_or_build(coord, || build_chunk(coord)).unwrap();

        assert!(Arc::ptr_eq(&first, &second), "hit should reuse the entry");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_requests_build_once() {
        let cache = Arc::new(ChunkCache::new(8));
        let builds = Arc::new(AtomicUsize::new(0));
        let coord = ChunkCoord::new(7, 7);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let builds = builds.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_build(coord, || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            // Widen the race window.
                            std::thread::sleep(Duration::from_millis(20));
                            build_chunk(coord)
                        })
                        .unwrap()
                })
            })
            .collect();

        let chunks: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(builds.load(Ordering::SeqCst), 1, "exactly one build");
        for chunk in &chunks[1..] {
            assert!(Arc::ptr_eq(&chunks[0], chunk));
        }
    }

    #[test]
    fn test_failed_build_not_cached() {
        let cache = ChunkCache::new(8);
        let coord = ChunkCoord::new(0, 0);

        let err = cache.get_or_build(coord, || {
            Err(crate::error::WorldError::ConsistencyViolation {
                cx: 0,
                cy: 0,
                detail: "injected".to_owned(),
            })
        });
        assert!(err.is_err());
        assert_eq!(cache.len(), 0, "failed build must leave nothing behind");

        // A later request builds fresh and succeeds.
        let chunk = cache.get_or_build(coord, || build_chunk(coord)).unwrap();
        assert_eq!(chunk.coord(), coord);
    }

    #[test]
    fn test_lru_eviction_bound() {
        let cache = ChunkCache::new(4);

        for x in 0..20 {
            let coord = ChunkCoord::new(x, 0);
            cache.get_or_build(coord, || build_chunk(coord)).unwrap();
            assert!(cache.len() <= 4, "cache exceeded capacity");
        }
    }

    #[test]
    fn test_lru_keeps_recently_used() {
        let cache = ChunkCache::new(2);
        let hot = ChunkCoord::new(0, 0);

        cache.get_or_build(hot, || build_chunk(hot)).unwrap();

        for x in 1..6 {
            let coord = ChunkCoord::new(x, 0);
            // Touch the hot entry before each insertion.
            let before = cache.get_or_build(hot, || build_chunk(hot)).unwrap();
            let _ = cache.get_or_build(coord, || build_chunk(coord)).unwrap();
            let after = cache.get_or_build(hot, || build_chunk(hot)).unwrap();
            assert!(
                Arc::ptr_eq(&before, &after),
                "recently used entry was evicted"
            );
        }
    }

    #[test]
    fn test_eviction_then_regeneration_identical() {
        let cache = ChunkCache::new(1);
        let coord = ChunkCoord::new(3, -3);

        let first = cache.get_or_build(coord, || build_chunk(coord)).unwrap();
        let rows = first.rows();

        // Push the entry out, then regenerate.
        let other = ChunkCoord::new(9, 9);
        cache.get_or_build(other, || build_chunk(other)).unwrap();
        let again = cache.get_or_build(coord, || build_chunk(coord)).unwrap();

        assert!(!Arc::ptr_eq(&first, &again), "entry should have been evicted");
        assert_eq!(rows, again.rows(), "regeneration must be bit-identical");
    }
}
