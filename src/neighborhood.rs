//! Neighborhood generation over giant tours.
//!
//! # Operators
//!
//! | Kind | Move | Local form | Long-range form |
//! |---|---|---|---|
//! | `Swap` | exchange two positions | partner within ±window | any position |
//! | `Insert` | remove one customer, reinsert | target within ±window | any position |
//! | `Reverse` | reverse a segment (2-opt) | length 2–7 | length 8–15 |
//! | `Scramble` | shuffle a segment | length 3–6 | length 7–12 |
//! | `BlockMove` | move a block of 2–4 | shift within ±window+1 | any position |
//! | `Cross` | exchange two short segments | gap ≤ window | any gap |
//!
//! Most moves are local; a `far_ratio` share is drawn long-range. When more
//! candidates are produced than requested, the batch is thinned by
//! stratified sampling over segment-size buckets so every move family and
//! scale stays represented. Any candidate that is not a permutation of the
//! input is discarded.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{is_permutation, Tour};

/// Move operator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoveKind {
    Swap,
    Insert,
    Reverse,
    Scramble,
    BlockMove,
    Cross,
}

impl MoveKind {
    /// All operators, in weight-vector order.
    pub const ALL: [MoveKind; 6] = [
        MoveKind::Swap,
        MoveKind::Insert,
        MoveKind::Reverse,
        MoveKind::Scramble,
        MoveKind::BlockMove,
        MoveKind::Cross,
    ];

    /// Position of this operator in [`MoveKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            MoveKind::Swap => 0,
            MoveKind::Insert => 1,
            MoveKind::Reverse => 2,
            MoveKind::Scramble => 3,
            MoveKind::BlockMove => 4,
            MoveKind::Cross => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MoveKind::Swap => "swap",
            MoveKind::Insert => "insert",
            MoveKind::Reverse => "reverse",
            MoveKind::Scramble => "scramble",
            MoveKind::BlockMove => "block-move",
            MoveKind::Cross => "cross",
        }
    }
}

impl std::fmt::Display for MoveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A candidate tour and the move that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub tour: Tour,
    pub kind: MoveKind,
    /// Segment length or positional displacement of the move.
    pub span: usize,
}

impl AsRef<[usize]> for Candidate {
    fn as_ref(&self) -> &[usize] {
        &self.tour
    }
}

/// Segment-size bucket used for stratification.
fn bucket(span: usize) -> u8 {
    match span {
        0..=2 => 0,
        3..=7 => 1,
        _ => 2,
    }
}

/// Produces candidate tours from a current tour.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::neighborhood::{MoveKind, NeighborhoodGenerator};
/// use u_tabu_routing::models::is_permutation;
///
/// let mut rng = u_numflow::random::create_rng(7);
/// let tour: Vec<usize> = (1..=20).collect();
/// let generator = NeighborhoodGenerator::default();
///
/// let batch = generator.generate(&tour, MoveKind::Reverse, 10, &mut rng);
/// assert_eq!(batch.len(), 10);
/// assert!(batch.iter().all(|c| is_permutation(&c.tour, 20)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodGenerator {
    /// Positional radius of local moves.
    pub window: usize,
    /// Probability of drawing a long-range move.
    pub far_ratio: f64,
    /// Candidates proposed per requested candidate before thinning.
    pub oversample: usize,
}

impl Default for NeighborhoodGenerator {
    fn default() -> Self {
        Self {
            window: 4,
            far_ratio: 0.2,
            oversample: 2,
        }
    }
}

impl NeighborhoodGenerator {
    /// Up to `count` distinct-move candidates from one operator.
    ///
    /// Returns an empty batch if `tour` is not a permutation of `1..=n` or
    /// has fewer than two customers.
    pub fn generate<R: Rng>(
        &self,
        tour: &[usize],
        kind: MoveKind,
        count: usize,
        rng: &mut R,
    ) -> Vec<Candidate> {
        let n = tour.len();
        if n < 2 || count == 0 || !is_permutation(tour, n) {
            return Vec::new();
        }
        let proposals = count.saturating_mul(self.oversample.max(1));
        let mut pool = Vec::with_capacity(proposals);
        for _ in 0..proposals {
            if let Some(candidate) = self.propose(tour, kind, rng) {
                pool.push(candidate);
            }
        }
        stratified_sample(pool, count, rng)
    }

    /// A batch of `count` candidates drawn from all operators.
    ///
    /// Each operator's share is proportional to `weights` (indexed by
    /// [`MoveKind::index`]); when `count >= 6` every operator gets at least
    /// one slot.
    pub fn generate_mixed<R: Rng>(
        &self,
        tour: &[usize],
        weights: &[f64],
        count: usize,
        rng: &mut R,
    ) -> Vec<Candidate> {
        let quotas = apportion(weights, count, rng);
        let mut batch = Vec::with_capacity(count);
        for (kind, quota) in MoveKind::ALL.iter().zip(quotas) {
            if quota > 0 {
                batch.extend(self.generate(tour, *kind, quota, rng));
            }
        }
        batch
    }

    fn propose<R: Rng>(&self, tour: &[usize], kind: MoveKind, rng: &mut R) -> Option<Candidate> {
        let n = tour.len();
        let far = rng.random_bool(self.far_ratio.clamp(0.0, 1.0));
        let window = self.window.max(1);
        let (new_tour, span) = match kind {
            MoveKind::Swap => {
                let i = rng.random_range(0..n);
                let j = if far {
                    distinct_position(n, i, rng)
                } else {
                    local_partner(n, i, window, rng)
                };
                let mut t = tour.to_vec();
                t.swap(i, j);
                (t, i.abs_diff(j))
            }
            MoveKind::Insert => {
                let i = rng.random_range(0..n);
                let j = if far {
                    distinct_position(n, i, rng)
                } else {
                    local_partner(n, i, window, rng)
                };
                let mut t = tour.to_vec();
                let value = t.remove(i);
                t.insert(j, value);
                (t, i.abs_diff(j))
            }
            MoveKind::Reverse => {
                let len = if far && n >= 8 {
                    rng.random_range(8..=n.min(15))
                } else {
                    rng.random_range(2..=n.min(7))
                };
                let start = rng.random_range(0..=n - len);
                let mut t = tour.to_vec();
                t[start..start + len].reverse();
                (t, len)
            }
            MoveKind::Scramble => {
                if n < 3 {
                    return None;
                }
                let len = if far && n >= 7 {
                    rng.random_range(7..=n.min(12))
                } else {
                    rng.random_range(3..=n.min(6))
                };
                let start = rng.random_range(0..=n - len);
                let mut t = tour.to_vec();
                for _ in 0..3 {
                    u_numflow::random::shuffle(&mut t[start..start + len], rng);
                    if t[start..start + len] != tour[start..start + len] {
                        break;
                    }
                }
                (t, len)
            }
            MoveKind::BlockMove => {
                if n < 3 {
                    return None;
                }
                let len = rng.random_range(2..=(n - 1).min(4));
                let start = rng.random_range(0..=n - len);
                let rest = n - len;
                let target = if far {
                    rng.random_range(0..=rest)
                } else {
                    let shift = rng.random_range(1..=window + 1);
                    if rng.random_bool(0.5) {
                        (start + shift).min(rest)
                    } else {
                        start.saturating_sub(shift)
                    }
                };
                let mut t = tour.to_vec();
                let block: Vec<usize> = t.drain(start..start + len).collect();
                t.splice(target..target, block);
                (t, start.abs_diff(target).max(len))
            }
            MoveKind::Cross => {
                let la = rng.random_range(1..=(n / 2).clamp(1, 3));
                let lb = rng.random_range(1..=(n / 2).clamp(1, 3));
                if la + lb > n {
                    return None;
                }
                let a = rng.random_range(0..=n - la - lb);
                let max_gap = n - la - lb - a;
                let gap = if far {
                    rng.random_range(0..=max_gap)
                } else {
                    rng.random_range(0..=window.min(max_gap))
                };
                let b = a + la + gap;
                let mut t = Vec::with_capacity(n);
                t.extend_from_slice(&tour[..a]);
                t.extend_from_slice(&tour[b..b + lb]);
                t.extend_from_slice(&tour[a + la..b]);
                t.extend_from_slice(&tour[a..a + la]);
                t.extend_from_slice(&tour[b + lb..]);
                (t, b - a)
            }
        };
        if new_tour.as_slice() == tour || !is_permutation(&new_tour, n) {
            return None;
        }
        Some(Candidate {
            tour: new_tour,
            kind,
            span,
        })
    }
}

fn distinct_position<R: Rng>(n: usize, i: usize, rng: &mut R) -> usize {
    let j = rng.random_range(0..n - 1);
    if j >= i {
        j + 1
    } else {
        j
    }
}

fn local_partner<R: Rng>(n: usize, i: usize, window: usize, rng: &mut R) -> usize {
    let k = rng.random_range(1..=window);
    let up = i + k < n;
    let down = i >= k;
    match (up, down) {
        (true, true) => {
            if rng.random_bool(0.5) {
                i + k
            } else {
                i - k
            }
        }
        (true, false) => i + k,
        (false, true) => i - k,
        (false, false) => distinct_position(n, i, rng),
    }
}

/// Splits `count` slots across operators in proportion to `weights`.
fn apportion<R: Rng>(weights: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
    let k = MoveKind::ALL.len();
    let w: Vec<f64> = (0..k)
        .map(|i| weights.get(i).copied().filter(|x| x.is_finite() && *x > 0.0).unwrap_or(0.0))
        .collect();
    let total: f64 = w.iter().sum();
    let w: Vec<f64> = if total > 0.0 { w } else { vec![1.0; k] };
    let total: f64 = w.iter().sum();
    let mut quotas = vec![0usize; k];

    if count < k {
        // Roulette without replacement.
        let mut remaining: Vec<f64> = w.iter().map(|&x| x.max(1e-9)).collect();
        for _ in 0..count {
            let sum: f64 = remaining.iter().sum();
            if sum <= 0.0 {
                break;
            }
            let mut roll = rng.random_range(0.0..sum);
            let mut pick = k - 1;
            for (i, &x) in remaining.iter().enumerate() {
                if roll < x {
                    pick = i;
                    break;
                }
                roll -= x;
            }
            quotas[pick] += 1;
            remaining[pick] = 0.0;
        }
        return quotas;
    }

    quotas.iter_mut().for_each(|q| *q = 1);
    let spare = count - k;
    let shares: Vec<f64> = w.iter().map(|x| spare as f64 * x / total).collect();
    let mut assigned = 0;
    for (q, s) in quotas.iter_mut().zip(&shares) {
        let whole = s.floor() as usize;
        *q += whole;
        assigned += whole;
    }
    // Largest remainder for leftover slots.
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &i in order.iter().take(spare - assigned) {
        quotas[i] += 1;
    }
    quotas
}

/// Thins `pool` to at most `count` by round-robin over `(kind, bucket)` strata.
pub fn stratified_sample<R: Rng>(pool: Vec<Candidate>, count: usize, rng: &mut R) -> Vec<Candidate> {
    if pool.len() <= count {
        return pool;
    }
    let mut strata: BTreeMap<(MoveKind, u8), Vec<Candidate>> = BTreeMap::new();
    for c in pool {
        strata.entry((c.kind, bucket(c.span))).or_default().push(c);
    }
    let mut groups: Vec<Vec<Candidate>> = strata
        .into_values()
        .map(|mut group| {
            u_numflow::random::shuffle(&mut group, rng);
            group
        })
        .collect();

    let mut selected = Vec::with_capacity(count);
    while selected.len() < count {
        let mut took = false;
        for group in groups.iter_mut() {
            if selected.len() == count {
                break;
            }
            if let Some(c) = group.pop() {
                selected.push(c);
                took = true;
            }
        }
        if !took {
            break;
        }
    }
    selected
}

/// Large perturbation strategies used for diversification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perturbation {
    /// Reverse a segment spanning the middle third.
    SegmentReversal,
    /// Rotate the tour by a quarter to three quarters of its length.
    Rotation,
    /// Shuffle a random segment of at least two customers.
    SegmentShuffle,
    /// Move a leading block behind a middle block.
    BlockRotation,
    /// Shuffle the whole tour.
    FullShuffle,
}

impl Perturbation {
    pub const ALL: [Perturbation; 5] = [
        Perturbation::SegmentReversal,
        Perturbation::Rotation,
        Perturbation::SegmentShuffle,
        Perturbation::BlockRotation,
        Perturbation::FullShuffle,
    ];

    /// Applies the perturbation, returning a new tour.
    pub fn apply<R: Rng>(self, tour: &[usize], rng: &mut R) -> Tour {
        let n = tour.len();
        let mut t = tour.to_vec();
        if n < 2 {
            return t;
        }
        match self {
            Perturbation::SegmentReversal => {
                let i = rng.random_range(0..=n / 3);
                let j = rng.random_range((2 * n / 3).max(i + 1)..=n);
                t[i..j].reverse();
            }
            Perturbation::Rotation => {
                let k = rng.random_range((n / 4).max(1)..=(3 * n / 4).max(1));
                t.rotate_left(k % n);
            }
            Perturbation::SegmentShuffle => {
                let i = rng.random_range(0..=n / 2);
                let j = rng.random_range((i + 2).min(n)..=n);
                u_numflow::random::shuffle(&mut t[i..j], rng);
            }
            Perturbation::BlockRotation => {
                let k1 = rng.random_range(0..=n / 2);
                let k2 = rng.random_range((k1 + 1).min(n)..=n);
                t[..k2].rotate_left(k1);
            }
            Perturbation::FullShuffle => {
                u_numflow::random::shuffle(&mut t, rng);
            }
        }
        t
    }
}

/// Applies one to three random perturbations.
///
/// If the result is not a permutation of the input, the input is
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::neighborhood::diversify;
/// use u_tabu_routing::models::is_permutation;
///
/// let mut rng = u_numflow::random::create_rng(1);
/// let tour: Vec<usize> = (1..=12).collect();
/// let shaken = diversify(&tour, &mut rng);
/// assert!(is_permutation(&shaken, 12));
/// ```
pub fn diversify<R: Rng>(tour: &[usize], rng: &mut R) -> Tour {
    let n = tour.len();
    let mut t = tour.to_vec();
    let rounds = rng.random_range(1..=3);
    for _ in 0..rounds {
        let p = Perturbation::ALL[rng.random_range(0..Perturbation::ALL.len())];
        t = p.apply(&t, rng);
    }
    if is_permutation(&t, n) {
        t
    } else {
        tour.to_vec()
    }
}
