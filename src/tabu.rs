//! Adaptive tabu memory.
//!
//! # Structure
//!
//! - A FIFO ring of recently accepted tours whose capacity grows by one
//!   each time it fills, up to a maximum.
//! - A frequency map counting how often each tour signature was accepted.
//!   Tours accepted only once are forgotten when they leave the ring, so
//!   the map holds the ring plus the tours that actually recur.
//! - A best-known objective watermark and a small elite list.
//!
//! # Admission
//!
//! [`TabuMemory::forbidden`] checks, in order:
//!
//! 1. **Aspiration** — a candidate better than the watermark by more than
//!    `aspiration_margin` (relative) is always admitted and becomes elite.
//! 2. **Frequency** — forbidden if the tour, counting near-duplicates in
//!    the ring, recurred more than `max_frequency` times. The similarity
//!    needed to count as a near-duplicate drops by `similarity_step` for
//!    each repeat of the ring entry, down to `similarity_floor`.
//! 3. **Recency** — forbidden if it equals one of the last
//!    `recency_window` accepted tours.
//!
//! # Reference
//!
//! Glover, F. (1990). "Tabu Search—Part II", *ORSA Journal on Computing* 2(1), 4-32.

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::models::Tour;

/// Tuning for [`TabuMemory`] admission rules.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::tabu::TabuConfig;
///
/// let config = TabuConfig::default()
///     .with_aspiration_margin(0.1)
///     .with_max_frequency(5);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.recency_window, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabuConfig {
    /// Relative improvement over the watermark that overrides tabu status.
    pub aspiration_margin: f64,
    /// Recurrences tolerated before a tour is forbidden.
    pub max_frequency: usize,
    /// Number of most recent tours forbidden outright.
    pub recency_window: usize,
    /// Positional similarity for a first-time ring entry to count as a near-duplicate.
    pub similarity_threshold: f64,
    /// Threshold reduction per additional repeat of a ring entry.
    pub similarity_step: f64,
    /// Lowest threshold reachable by repeats.
    pub similarity_floor: f64,
    /// Number of elite tours retained.
    pub elite_capacity: usize,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            aspiration_margin: 0.05,
            max_frequency: 3,
            recency_window: 5,
            similarity_threshold: 0.95,
            similarity_step: 0.05,
            similarity_floor: 0.8,
            elite_capacity: 10,
        }
    }
}

impl TabuConfig {
    pub fn with_aspiration_margin(mut self, margin: f64) -> Self {
        self.aspiration_margin = margin;
        self
    }

    pub fn with_max_frequency(mut self, n: usize) -> Self {
        self.max_frequency = n;
        self
    }

    pub fn with_recency_window(mut self, n: usize) -> Self {
        self.recency_window = n;
        self
    }

    pub fn with_similarity(mut self, threshold: f64, step: f64, floor: f64) -> Self {
        self.similarity_threshold = threshold;
        self.similarity_step = step;
        self.similarity_floor = floor;
        self
    }

    pub fn with_elite_capacity(mut self, n: usize) -> Self {
        self.elite_capacity = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.aspiration_margin) {
            return Err("aspiration_margin must be in [0, 1)".into());
        }
        if !(0.0..=1.0).contains(&self.similarity_floor)
            || !(self.similarity_floor..=1.0).contains(&self.similarity_threshold)
        {
            return Err("need 0 <= similarity_floor <= similarity_threshold <= 1".into());
        }
        if self.similarity_step < 0.0 {
            return Err("similarity_step must be >= 0".into());
        }
        if self.elite_capacity == 0 {
            return Err("elite_capacity must be >= 1".into());
        }
        Ok(())
    }
}

/// One accepted tour in the ring.
#[derive(Debug, Clone, PartialEq)]
pub struct TabuEntry {
    pub signature: u64,
    pub tour: Tour,
    pub insertion_order: u64,
    /// Frequency of this signature when it was inserted.
    pub hit_count: usize,
}

/// Hash signature of a tour.
pub fn signature(tour: &[usize]) -> u64 {
    let mut hasher = FxHasher::default();
    tour.hash(&mut hasher);
    hasher.finish()
}

/// Fraction of positions at which two tours agree.
pub fn similarity(a: &[usize], b: &[usize]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    if a.is_empty() {
        return 1.0;
    }
    let same = a.iter().zip(b).filter(|(x, y)| x == y).count();
    same as f64 / a.len() as f64
}

/// Short-term memory with frequency penalties and aspiration.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::tabu::{TabuConfig, TabuMemory};
///
/// let mut memory = TabuMemory::new(4, 8, TabuConfig::default());
/// memory.record_elite(&[1, 2, 3], 100.0);
/// memory.add(&[1, 2, 3]);
///
/// // Recently visited and not good enough to aspire.
/// assert!(memory.forbidden(&[1, 2, 3], 99.0, 100.0));
/// // Far better than anything seen: admitted despite being tabu.
/// assert!(!memory.forbidden(&[1, 2, 3], 50.0, 100.0));
/// assert_eq!(memory.best_known(), 50.0);
/// ```
#[derive(Debug, Clone)]
pub struct TabuMemory {
    config: TabuConfig,
    ring: VecDeque<TabuEntry>,
    initial_capacity: usize,
    capacity: usize,
    max_capacity: usize,
    frequency: FxHashMap<u64, usize>,
    best_known: f64,
    elite: Vec<(f64, Tour)>,
    next_order: u64,
}

impl TabuMemory {
    /// Creates an empty memory with ring capacity `capacity`, growable to `max_capacity`.
    pub fn new(capacity: usize, max_capacity: usize, config: TabuConfig) -> Self {
        let capacity = capacity.max(1);
        let max_capacity = max_capacity.max(capacity);
        Self {
            config,
            ring: VecDeque::with_capacity(max_capacity),
            initial_capacity: capacity,
            capacity,
            max_capacity,
            frequency: FxHashMap::default(),
            best_known: f64::INFINITY,
            elite: Vec::new(),
            next_order: 0,
        }
    }

    /// Records an accepted tour.
    pub fn add(&mut self, tour: &[usize]) {
        if self.ring.len() >= self.capacity && self.capacity < self.max_capacity {
            self.capacity += 1;
        }
        while self.ring.len() >= self.capacity {
            self.evict_oldest();
        }
        let sig = signature(tour);
        let count = self.frequency.entry(sig).or_insert(0);
        *count += 1;
        self.ring.push_back(TabuEntry {
            signature: sig,
            tour: tour.to_vec(),
            insertion_order: self.next_order,
            hit_count: *count,
        });
        self.next_order += 1;
    }

    /// Returns `true` if `tour` must not be taken as the next current tour.
    ///
    /// Admission through aspiration updates the watermark and the elite list.
    pub fn forbidden(
        &mut self,
        tour: &[usize],
        candidate_objective: f64,
        incumbent_objective: f64,
    ) -> bool {
        if self.aspires(candidate_objective, incumbent_objective) {
            tracing::debug!(
                "aspiration admits candidate {:.3} (watermark {:.3})",
                candidate_objective,
                self.best_known
            );
            self.record_elite(tour, candidate_objective);
            return false;
        }

        let sig = signature(tour);
        if self.recurrences(tour, sig) > self.config.max_frequency {
            return true;
        }

        self.ring
            .iter()
            .rev()
            .take(self.config.recency_window)
            .any(|e| e.signature == sig && e.tour == tour)
    }

    fn aspires(&self, candidate: f64, incumbent: f64) -> bool {
        if !candidate.is_finite() {
            return false;
        }
        let reference = if self.best_known.is_finite() {
            self.best_known
        } else {
            incumbent
        };
        if !reference.is_finite() {
            return true;
        }
        candidate < reference - self.config.aspiration_margin * reference.abs()
    }

    /// Exact repeats plus near-duplicate ring entries.
    fn recurrences(&self, tour: &[usize], sig: u64) -> usize {
        let exact = self.frequency.get(&sig).copied().unwrap_or(0);
        let near = self
            .ring
            .iter()
            .filter(|e| e.signature != sig)
            .filter(|e| {
                let repeats = self.frequency.get(&e.signature).copied().unwrap_or(1);
                similarity(&e.tour, tour) >= self.near_threshold(repeats)
            })
            .count();
        exact + near
    }

    /// Similarity needed for an entry seen `repeats` times to count as a near-duplicate.
    fn near_threshold(&self, repeats: usize) -> f64 {
        let drop = self.config.similarity_step * repeats.saturating_sub(1) as f64;
        (self.config.similarity_threshold - drop).max(self.config.similarity_floor)
    }

    /// Adds a tour to the elite list and lowers the watermark if needed.
    pub fn record_elite(&mut self, tour: &[usize], objective: f64) {
        if !objective.is_finite() {
            return;
        }
        if objective < self.best_known {
            self.best_known = objective;
        }
        if let Some(pos) = self.elite.iter().position(|(_, t)| t.as_slice() == tour) {
            if self.elite[pos].0 <= objective {
                return;
            }
            self.elite.remove(pos);
        }
        let pos = self.elite.partition_point(|(o, _)| *o <= objective);
        self.elite.insert(pos, (objective, tour.to_vec()));
        self.elite.truncate(self.config.elite_capacity.max(1));
    }

    /// Drops recency and frequency state; keeps the elite list and watermark.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.frequency.clear();
        self.capacity = self.initial_capacity;
        if let Some((best, _)) = self.elite.first() {
            self.best_known = *best;
        }
    }

    /// Sets the ring capacity (clamped to `1..=max_capacity`), evicting the oldest entries.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity.clamp(1, self.max_capacity);
        while self.ring.len() > self.capacity {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(old) = self.ring.pop_front() {
            if self.frequency.get(&old.signature) == Some(&1) {
                self.frequency.remove(&old.signature);
            }
        }
    }

    /// Returns `true` if `tour` is in the ring.
    pub fn contains(&self, tour: &[usize]) -> bool {
        let sig = signature(tour);
        self.ring.iter().any(|e| e.signature == sig && e.tour == tour)
    }

    /// Times `tour` was added since the last clear.
    pub fn frequency_of(&self, tour: &[usize]) -> usize {
        self.frequency.get(&signature(tour)).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Best objective known to aspiration.
    pub fn best_known(&self) -> f64 {
        self.best_known
    }

    /// Elite tours, best first.
    pub fn elite(&self) -> &[(f64, Tour)] {
        &self.elite
    }

    /// Ring entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &TabuEntry> {
        self.ring.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    fn with_swap(mut t: Vec<usize>, i: usize) -> Vec<usize> {
        t.swap(i, i + 1);
        t
    }

    #[test]
    fn test_capacity_grows_when_full() {
        let mut m = TabuMemory::new(2, 4, TabuConfig::default());
        for i in 0..6 {
            m.add(&with_swap(base(10), i));
        }
        assert_eq!(m.capacity(), 4);
        assert_eq!(m.len(), 4);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut m = TabuMemory::new(2, 2, TabuConfig::default());
        let (a, b, c) = (with_swap(base(6), 0), with_swap(base(6), 2), with_swap(base(6), 4));
        m.add(&a);
        m.add(&b);
        m.add(&c);
        assert!(!m.contains(&a));
        assert!(m.contains(&b) && m.contains(&c));
        let orders: Vec<u64> = m.entries().map(|e| e.insertion_order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn test_recency_window() {
        let mut m = TabuMemory::new(20, 20, TabuConfig::default().with_similarity(1.0, 0.0, 1.0));
        let tours: Vec<Vec<usize>> = (0..7).map(|i| with_swap(base(20), i * 2)).collect();
        for t in &tours {
            m.add(t);
        }
        // Last five are recent.
        assert!(m.forbidden(&tours[6], 10.0, 10.0));
        assert!(m.forbidden(&tours[2], 10.0, 10.0));
        // Older ones are still in the ring but outside the window.
        assert!(!m.forbidden(&tours[1], 10.0, 10.0));
        assert!(!m.forbidden(&tours[0], 10.0, 10.0));
    }

    #[test]
    fn test_single_visits_forgotten_on_eviction() {
        let mut m = TabuMemory::new(2, 2, TabuConfig::default());
        let repeated = base(12);
        m.add(&repeated);
        m.add(&repeated);
        for i in 0..10 {
            m.add(&with_swap(base(12), i));
        }
        assert_eq!(m.len(), 2);
        assert_eq!(m.frequency.len(), 3);
        assert_eq!(m.frequency_of(&with_swap(base(12), 0)), 0);
        assert_eq!(m.frequency_of(&with_swap(base(12), 9)), 1);
        assert_eq!(m.frequency_of(&repeated), 2);

        m.resize(1);
        assert_eq!(m.frequency_of(&with_swap(base(12), 8)), 0);
        assert_eq!(m.frequency.len(), 2);
    }

    #[test]
    fn test_frequency_bound() {
        let mut m = TabuMemory::new(3, 3, TabuConfig::default().with_recency_window(0));
        let t = base(8);
        for _ in 0..3 {
            m.add(&t);
        }
        assert!(!m.forbidden(&t, 10.0, 10.0));
        m.add(&t);
        assert_eq!(m.frequency_of(&t), 4);
        assert!(m.forbidden(&t, 10.0, 10.0));
    }

    #[test]
    fn test_aspiration_overrides_and_records_elite() {
        let mut m = TabuMemory::new(5, 5, TabuConfig::default());
        let t = base(5);
        m.record_elite(&t, 100.0);
        m.add(&t);
        assert!(m.forbidden(&t, 96.0, 100.0));
        assert!(!m.forbidden(&t, 94.0, 100.0));
        assert_eq!(m.best_known(), 94.0);
        assert_eq!(m.elite()[0].0, 94.0);
    }

    #[test]
    fn test_aspiration_uses_incumbent_before_watermark() {
        let mut m = TabuMemory::new(5, 5, TabuConfig::default());
        let t = base(5);
        m.add(&t);
        assert!(m.forbidden(&t, 99.0, 100.0));
        assert!(!m.forbidden(&t, 90.0, 100.0));
    }

    #[test]
    fn test_infinite_candidate_never_aspires() {
        let mut m = TabuMemory::new(5, 5, TabuConfig::default());
        let t = base(5);
        m.add(&t);
        assert!(m.forbidden(&t, f64::INFINITY, f64::INFINITY));
    }

    #[test]
    fn test_near_duplicates_count_toward_frequency() {
        let mut m = TabuMemory::new(10, 10, TabuConfig::default().with_recency_window(0));
        let candidate = base(40);
        for i in [0, 5, 10, 15] {
            m.add(&with_swap(base(40), i));
        }
        // Each variant agrees on 38/40 = 0.95 of positions.
        assert!(m.forbidden(&candidate, 10.0, 10.0));

        let far: Vec<usize> = base(40).into_iter().rev().collect();
        assert!(!m.forbidden(&far, 10.0, 10.0));
    }

    #[test]
    fn test_threshold_tightens_with_repeats() {
        let config = TabuConfig::default().with_recency_window(0);
        let candidate = base(40);
        // Agrees on 36/40 = 0.9 of positions.
        let variant = with_swap(with_swap(base(40), 0), 10);

        // Four distinct variants seen once each stay below the threshold.
        let mut once = TabuMemory::new(10, 10, config.clone());
        for i in [0, 2, 4, 6] {
            once.add(&with_swap(with_swap(base(40), i), i + 10));
        }
        assert!(!once.forbidden(&candidate, 10.0, 10.0));

        // One variant seen four times widens its own near-duplicate zone.

        let mut often = TabuMemory::new(10, 10, config);
        for _ in 0..4 {
            often.add(&variant);
        }
        assert!(often.forbidden(&candidate, 10.0, 10.0));
    }

    #[test]
    fn test_clear_keeps_watermark_from_elite() {
        let mut m = TabuMemory::new(2, 6, TabuConfig::default());
        let t = base(6);
        m.record_elite(&t, 42.0);
        for i in 0..5 {
            m.add(&with_swap(base(6), i));
        }
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), 2);
        assert_eq!(m.frequency_of(&with_swap(base(6), 0)), 0);
        assert_eq!(m.best_known(), 42.0);
        assert_eq!(m.elite().len(), 1);
    }

    #[test]
    fn test_elite_sorted_and_bounded() {
        let mut m = TabuMemory::new(2, 2, TabuConfig::default().with_elite_capacity(2));
        m.record_elite(&[1, 2, 3], 30.0);
        m.record_elite(&[2, 1, 3], 10.0);
        m.record_elite(&[3, 2, 1], 20.0);
        m.record_elite(&[3, 2, 1], 5.0);
        let objs: Vec<f64> = m.elite().iter().map(|(o, _)| *o).collect();
        assert_eq!(objs, vec![5.0, 10.0]);
        assert_eq!(m.best_known(), 5.0);
    }

    #[test]
    fn test_resize_evicts_oldest() {
        let mut m = TabuMemory::new(5, 8, TabuConfig::default());
        for i in 0..5 {
            m.add(&with_swap(base(10), i));
        }
        m.resize(2);
        assert_eq!(m.len(), 2);
        assert!(m.contains(&with_swap(base(10), 4)));
        m.resize(100);
        assert_eq!(m.capacity(), 8);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity(&[1, 2, 3, 4], &[1, 2, 4, 3]), 0.5);
        assert_eq!(similarity(&[], &[]), 1.0);
        assert_eq!(similarity(&[1], &[1, 2]), 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(TabuConfig::default().validate().is_ok());
        assert!(TabuConfig::default()
            .with_aspiration_margin(1.5)
            .validate()
            .is_err());
        assert!(TabuConfig::default()
            .with_similarity(0.7, 0.05, 0.8)
            .validate()
            .is_err());
    }
}
