//! Pairwise cost cache with optional JSON persistence.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::models::{CoordKey, Coordinate};

/// On-disk record. Non-finite values are never written.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    from: CoordKey,
    to: CoordKey,
    value: f64,
}

/// Ordered-pair distance cache keyed by quantized coordinates.
///
/// Entries are created lazily and never invalidated; the cache lives for
/// the process lifetime and can be persisted between runs with
/// [`save`](Self::save) / [`load`](Self::load).
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::Coordinate;
/// use u_tabu_routing::oracle::CostCache;
///
/// let a = Coordinate::new(1.0, 2.0);
/// let b = Coordinate::new(3.0, 4.0);
/// let mut cache = CostCache::new();
/// cache.insert_symmetric(a, b, 7.5);
/// assert_eq!(cache.get(a, b), Some(7.5));
/// assert_eq!(cache.get(b, a), Some(7.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CostCache {
    entries: FxHashMap<(CoordKey, CoordKey), f64>,
}

impl CostCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `a → b`, if present.
    pub fn get(&self, a: Coordinate, b: Coordinate) -> Option<f64> {
        self.entries.get(&(a.key(), b.key())).copied()
    }

    /// Returns `true` if `a → b` is cached.
    pub fn contains(&self, a: Coordinate, b: Coordinate) -> bool {
        self.entries.contains_key(&(a.key(), b.key()))
    }

    /// Caches `a → b` only.
    pub fn insert(&mut self, a: Coordinate, b: Coordinate, value: f64) {
        self.entries.insert((a.key(), b.key()), value);
    }

    /// Caches `a → b` and `b → a` with the same value.
    pub fn insert_symmetric(&mut self, a: Coordinate, b: Coordinate, value: f64) {
        self.entries.insert((a.key(), b.key()), value);
        self.entries.insert((b.key(), a.key()), value);
    }

    /// Copies every entry of `other` into this cache, overwriting duplicates.
    pub fn merge(&mut self, other: CostCache) {
        self.entries.extend(other.entries);
    }

    /// Number of cached ordered pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a cache previously written with [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let records: Vec<CacheRecord> = serde_json::from_reader(std::io::BufReader::new(file))?;
        let mut entries = FxHashMap::default();
        entries.reserve(records.len());
        for r in records {
            if r.value.is_finite() && r.value >= 0.0 {
                entries.insert((r.from, r.to), r.value);
            }
        }
        Ok(Self { entries })
    }

    /// Writes all finite entries as JSON, sorted for stable output.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let mut records: Vec<CacheRecord> = self
            .entries
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(&(from, to), &value)| CacheRecord { from, to, value })
            .collect();
        records.sort_by(|a, b| (a.from, a.to).cmp(&(b.from, b.to)));
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), &records)?;
        Ok(())
    }
}
