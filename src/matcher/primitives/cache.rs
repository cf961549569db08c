use crate::graph::{NetworkSegment, SegmentId};
use crate::matcher::PointKey;

use log::debug;
use lru::LruCache;
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Start candidates around a point, closest first, paired with their distance.
pub type Candidates = Vec<(Arc<NetworkSegment>, f64)>;

/// A shortest path between two segments, both included. `None` when none exists.
pub type CachedPath = Option<Vec<Arc<NetworkSegment>>>;

/// A bounded read-through cache, evicting the least recently used entry.
///
/// Values are handed out behind a reference counter, so they do not
/// need to be `Clone` and stay valid after eviction.
pub struct BoundedCache<K, V>
where
    K: Hash + Eq,
{
    map: LruCache<K, Arc<V>>,

    hits: usize,
    misses: usize,
}

impl<K, V> Debug for BoundedCache<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BoundedCache({}/{} entries, {} hits, {} misses)",
            self.map.len(),
            self.map.cap(),
            self.hits,
            self.misses
        )
    }
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq,
{
    pub fn new(capacity: usize) -> Self {
        BoundedCache {
            map: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the cached value for the key, calculating and storing it when absent.
    ///
    /// Failed calculations are not cached.
    pub fn query<E>(&mut self, key: K, calculate: impl FnOnce() -> Result<V, E>) -> Result<Arc<V>, E> {
        if let Some(value) = self.map.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(value));
        }

        self.misses += 1;
        let calculated = Arc::new(calculate()?);
        self.map.put(key, Arc::clone(&calculated));

        Ok(calculated)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn hits(&self) -> usize {
        self.hits
    }

    #[inline]
    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// Key of the start-candidate cache: the point plus the query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub point: PointKey,
    pub radius_cm: u64,
    pub max_count: usize,
}

/// Key of the path cache: both segments and the hop budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub from: SegmentId,
    pub to: SegmentId,
    pub max_hops: usize,
}

/// The caches owned by one matcher instance.
#[derive(Debug)]
pub struct MatchCaches {
    pub candidates: BoundedCache<CandidateKey, Candidates>,
    pub paths: BoundedCache<PathKey, CachedPath>,
}

impl MatchCaches {
    pub fn new(candidate_capacity: usize, path_capacity: usize) -> Self {
        MatchCaches {
            candidates: BoundedCache::new(candidate_capacity),
            paths: BoundedCache::new(path_capacity),
        }
    }

    pub fn clear(&mut self) {
        debug!("Clearing match caches: {:?}, {:?}", self.candidates, self.paths);
        self.candidates.clear();
        self.paths.clear();
    }
}
