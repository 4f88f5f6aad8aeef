//! Caching oracle with bulk precompute, retry, and fallback.
//!
//! # Precompute
//!
//! 1. Merge the on-disk cache, if configured.
//! 2. If every pair is already cached, stop: no provider calls.
//! 3. Bulk: one `table` request over depot + customers, retried up to
//!    `max_attempts` times with a fixed backoff. Point sets larger than
//!    `max_table_points` are tiled into blocks that each include the depot,
//!    and every block pair is requested so cross-block pairs are covered.
//! 4. Pairwise: each pair still missing is requested individually, with a
//!    short delay between requests to respect provider rate limits.
//! 5. Persist the cache and report success iff at least one off-diagonal
//!    pair has a finite value.
//!
//! After precompute, lookups never touch the network: a pair missing from
//! the cache costs `+INF` and is logged.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::cache::CostCache;
use super::provider::DistanceProvider;
use super::terrain::TerrainModel;
use super::CostOracle;
use crate::models::{Coordinate, ProblemInstance};

/// Retry and batching parameters for [`CachedOracle::precompute`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_tabu_routing::oracle::OracleConfig;
///
/// let config = OracleConfig::default()
///     .with_max_attempts(5)
///     .with_retry_backoff(Duration::from_millis(500));
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_table_points, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Attempts per bulk request before falling back.
    pub max_attempts: usize,
    /// Sleep between failed bulk attempts.
    pub retry_backoff: Duration,
    /// Sleep between consecutive pairwise requests.
    pub pair_delay: Duration,
    /// Largest point set sent in one table request.
    pub max_table_points: usize,
    /// JSON file used to persist the cache between runs.
    pub cache_path: Option<PathBuf>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_secs(2),
            pair_delay: Duration::from_millis(200),
            max_table_points: 100,
            cache_path: None,
        }
    }
}

impl OracleConfig {
    /// Sets how many times a failed bulk request is tried in total.
    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n;
        self
    }

    /// Sets the sleep between failed bulk attempts.
    pub fn with_retry_backoff(mut self, d: Duration) -> Self {
        self.retry_backoff = d;
        self
    }

    /// Sets the sleep between consecutive pairwise requests.
    pub fn with_pair_delay(mut self, d: Duration) -> Self {
        self.pair_delay = d;
        self
    }

    /// Sets the largest point set sent in one table request; larger sets are tiled.
    pub fn with_max_table_points(mut self, n: usize) -> Self {
        self.max_table_points = n;
        self
    }

    /// Persists the cache to `path`, loading it first if it exists.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Configuration with no sleeping, for tests and offline providers.
    pub fn no_delay() -> Self {
        Self::default()
            .with_retry_backoff(Duration::ZERO)
            .with_pair_delay(Duration::ZERO)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be >= 1".into());
        }
        if self.max_table_points < 2 {
            return Err("max_table_points must be >= 2".into());
        }
        Ok(())
    }
}

/// Runs `op` up to `max_attempts` times, sleeping `retry_backoff` between failures.
fn with_retries<T>(
    config: &OracleConfig,
    what: &str,
    mut op: impl FnMut() -> anyhow::Result<T>,
) -> Option<T> {
    let attempts = config.max_attempts.max(1);
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Some(value),
            Err(err) => {
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}",
                    what,
                    attempt,
                    attempts,
                    err
                );
                if attempt < attempts && !config.retry_backoff.is_zero() {
                    std::thread::sleep(config.retry_backoff);
                }
            }
        }
    }
    None
}

/// A [`CostOracle`] that front-loads provider I/O into a cache.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
/// use u_tabu_routing::oracle::{CachedOracle, CostOracle, OracleConfig, PlanarProvider};
///
/// let instance = ProblemInstance::new(
///     Coordinate::planar(0.0, 0.0),
///     vec![Customer::new(1, Coordinate::planar(3.0, 4.0), 1.0)],
///     10.0,
///     1,
/// )
/// .unwrap();
///
/// let mut oracle = CachedOracle::new(PlanarProvider).with_config(OracleConfig::no_delay());
/// assert!(oracle.precompute(&instance));
/// assert!((oracle.distance(instance.location(0), instance.location(1)) - 5.0).abs() < 1e-10);
/// ```
pub struct CachedOracle<P> {
    provider: P,
    config: OracleConfig,
    cache: CostCache,
    terrain: Option<TerrainModel>,
    misses: AtomicUsize,
}

impl<P: DistanceProvider> CachedOracle<P> {
    /// Creates an oracle with the default configuration and an empty cache.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: OracleConfig::default(),
            cache: CostCache::new(),
            terrain: None,
            misses: AtomicUsize::new(0),
        }
    }

    /// Replaces the retry, batching and persistence settings.
    pub fn with_config(mut self, config: OracleConfig) -> Self {
        self.config = config;
        self
    }

    /// Folds load and terrain into [`cost`](CostOracle::cost).
    pub fn with_terrain(mut self, terrain: TerrainModel) -> Self {
        self.terrain = Some(terrain);
        self
    }

    /// Seeds the cache, e.g. with one shared from a previous run.
    pub fn with_cache(mut self, cache: CostCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn cache(&self) -> &CostCache {
        &self.cache
    }

    pub fn terrain(&self) -> Option<&TerrainModel> {
        self.terrain.as_ref()
    }

    /// Number of lookups that missed the cache so far.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Pairs `(i, j)` of `points` with no cached value. Symmetric
    /// providers only need `i < j`.
    fn missing_pairs(&self, points: &[Coordinate]) -> Vec<(usize, usize)> {
        let symmetric = self.provider.is_symmetric();
        let mut missing = Vec::new();
        for i in 0..points.len() {
            for j in 0..points.len() {
                if i == j || (symmetric && j < i) || points[i].key() == points[j].key() {
                    continue;
                }
                if !self.cache.contains(points[i], points[j]) {
                    missing.push((i, j));
                }
            }
        }
        missing
    }

    /// Stores valid entries of a table response. Returns how many were new.
    fn store_table(
        &mut self,
        sources: &[Coordinate],
        destinations: &[Coordinate],
        table: &[Vec<f64>],
    ) -> usize {
        let symmetric = self.provider.is_symmetric();
        let mut stored = 0;
        for (s, row) in sources.iter().zip(table) {
            for (d, &value) in destinations.iter().zip(row) {
                if s.key() == d.key() || !value.is_finite() || value < 0.0 {
                    continue;
                }
                if self.cache.contains(*s, *d) {
                    continue;
                }
                if symmetric {
                    self.cache.insert_symmetric(*s, *d, value);
                } else {
                    self.cache.insert(*s, *d, value);
                }
                stored += 1;
            }
        }
        stored
    }

    fn request_table(
        &self,
        sources: &[Coordinate],
        destinations: &[Coordinate],
        what: &str,
    ) -> Option<Vec<Vec<f64>>> {
        with_retries(&self.config, what, || {
            let table = self.provider.table(sources, destinations)?;
            anyhow::ensure!(
                table.len() == sources.len()
                    && table.iter().all(|row| row.len() == destinations.len()),
                "table shape mismatch: expected {}x{}",
                sources.len(),
                destinations.len()
            );
            Ok(table)
        })
    }

    fn fill_full(&mut self, points: &[Coordinate]) {
        if let Some(table) = self.request_table(points, points, "distance table") {
            let stored = self.store_table(points, points, &table);
            tracing::debug!("bulk table stored {} pairs", stored);
        }
    }

    /// Tiles the customers into depot-sharing blocks and requests every block pair.
    fn fill_tiles(&mut self, points: &[Coordinate]) {
        let Some((&depot, customers)) = points.split_first() else {
            return;
        };
        let block = self.config.max_table_points.saturating_sub(1).max(1);
        let blocks: Vec<Vec<Coordinate>> = customers
            .chunks(block)
            .map(|chunk| std::iter::once(depot).chain(chunk.iter().copied()).collect())
            .collect();
        let symmetric = self.provider.is_symmetric();
        tracing::info!(
            "requesting {} point blocks of up to {} customers",
            blocks.len(),
            block
        );

        for (bi, src) in blocks.iter().enumerate() {
            for (bj, dst) in blocks.iter().enumerate() {
                if symmetric && bj < bi {
                    continue;
                }
                let what = format!("distance table block ({bi}, {bj})");
                match self.request_table(src, dst, &what) {
                    Some(table) => {
                        self.store_table(src, dst, &table);
                    }
                    None => tracing::warn!("{} left for pairwise fallback", what),
                }
            }
        }
    }

    fn fill_pairwise(&mut self, points: &[Coordinate], pairs: &[(usize, usize)]) {
        tracing::info!("falling back to {} pairwise requests", pairs.len());
        let symmetric = self.provider.is_symmetric();
        let mut failures = 0usize;
        for (n, &(i, j)) in pairs.iter().enumerate() {
            if n > 0 && !self.config.pair_delay.is_zero() {
                std::thread::sleep(self.config.pair_delay);
            }
            let (a, b) = (points[i], points[j]);
            match self.provider.route(a, b) {
                Ok(d) if d.is_finite() && d >= 0.0 => {
                    if symmetric {
                        self.cache.insert_symmetric(a, b, d);
                    } else {
                        self.cache.insert(a, b, d);
                    }
                }
                Ok(_) => failures += 1,
                Err(err) => {
                    failures += 1;
                    tracing::debug!("pairwise request {} -> {} failed: {}", i, j, err);
                }
            }
        }
        if failures > 0 {
            tracing::warn!(
                "{} of {} pairwise requests returned no distance",
                failures,
                pairs.len()
            );
        }
    }

    /// `(finite, total)` off-diagonal pairs over `points`.
    fn coverage(&self, points: &[Coordinate]) -> (usize, usize) {
        let mut finite = 0;
        let mut total = 0;
        for a in points {
            for b in points {
                if a.key() == b.key() {
                    continue;
                }
                total += 1;
                if self.cache.get(*a, *b).is_some_and(f64::is_finite) {
                    finite += 1;
                }
            }
        }
        (finite, total)
    }
}

impl<P: DistanceProvider> CostOracle for CachedOracle<P> {
    fn distance(&self, a: Coordinate, b: Coordinate) -> f64 {
        if a.key() == b.key() {
            return 0.0;
        }
        match self.cache.get(a, b) {
            Some(d) => d,
            None => {
                let n = self.misses.fetch_add(1, Ordering::Relaxed) + 1;
                if n.is_power_of_two() {
                    tracing::warn!(
                        "cost cache miss for {:?} -> {:?}; treating as unreachable ({} misses so far)",
                        a,
                        b,
                        n
                    );
                }
                f64::INFINITY
            }
        }
    }

    fn cost(&self, a: Coordinate, b: Coordinate, load: f64) -> f64 {
        let d = self.distance(a, b);
        match &self.terrain {
            Some(terrain) if d.is_finite() => terrain.cost(d, a, b, load),
            _ => d,
        }
    }

    fn precompute(&mut self, instance: &ProblemInstance) -> bool {
        let points = instance.locations();

        if let Some(path) = self.config.cache_path.clone() {
            if path.exists() {
                match CostCache::load(&path) {
                    Ok(disk) => {
                        tracing::info!("loaded {} cached pairs from {}", disk.len(), path.display());
                        self.cache.merge(disk);
                    }
                    Err(err) => tracing::warn!("ignoring unreadable cache {}: {}", path.display(), err),
                }
            }
        }

        let missing = self.missing_pairs(&points);
        if !missing.is_empty() {
            if points.len() <= self.config.max_table_points {
                self.fill_full(&points);
            } else {
                self.fill_tiles(&points);
            }
            let still_missing = self.missing_pairs(&points);
            if !still_missing.is_empty() {
                self.fill_pairwise(&points, &still_missing);
            }
        }

        if let Some(terrain) = self.terrain.as_mut() {
            let config = &self.config;
            match with_retries(config, "elevation lookup", || terrain.prefetch(&points)) {
                Some(known) if known < points.len() => tracing::warn!(
                    "elevation known for {} of {} points; the rest count as flat",
                    known,
                    points.len()
                ),
                Some(_) => {}
                None => tracing::warn!("elevation unavailable; terrain effects disabled for this run"),
            }
        }

        let (finite, total) = self.coverage(&points);
        if total == 0 {
            return true;
        }
        tracing::info!(
            "precompute cached {} of {} pairs ({:.1}%)",
            finite,
            total,
            100.0 * finite as f64 / total as f64
        );
        if finite == 0 {
            return false;
        }
        if finite < total {
            tracing::warn!("{} pairs remain unknown and will cost +INF", total - finite);
        }

        if let Some(path) = &self.config.cache_path {
            if let Err(err) = self.cache.save(path) {
                tracing::warn!("failed to persist cache to {}: {}", path.display(), err);
            }
        }
        true
    }
}
