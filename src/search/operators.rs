//! Adaptive weights for the move operators.

use crate::neighborhood::MoveKind;

use super::config::OperatorConfig;

/// How the chosen candidate compared to the search state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    NewBest,
    Improved,
    Accepted,
}

#[derive(Debug, Clone)]
struct OperatorStats {
    weight: f64,
    segment_score: f64,
    segment_uses: usize,
}

impl OperatorStats {
    fn new() -> Self {
        Self {
            weight: 1.0,
            segment_score: 0.0,
            segment_uses: 0,
        }
    }

    fn record(&mut self, score: f64) {
        self.segment_score += score;
        self.segment_uses += 1;
    }

    /// `w = w * (1 - rho) + (score / uses) * rho`, floored at `min_weight`.
    ///
    /// Operators unused in the segment keep their weight.
    fn update_weight(&mut self, reaction_factor: f64, min_weight: f64) {
        if self.segment_uses > 0 {
            let avg_score = self.segment_score / self.segment_uses as f64;
            self.weight = self.weight * (1.0 - reaction_factor) + avg_score * reaction_factor;
            self.weight = self.weight.max(min_weight);
        }
        self.segment_score = 0.0;
        self.segment_uses = 0;
    }
}

/// Per-operator weights indexed by [`MoveKind::index`].
#[derive(Debug, Clone)]
pub(crate) struct OperatorWeights {
    config: OperatorConfig,
    stats: Vec<OperatorStats>,
    generations: usize,
}

impl OperatorWeights {
    pub(crate) fn new(config: OperatorConfig) -> Self {
        Self {
            config,
            stats: MoveKind::ALL.iter().map(|_| OperatorStats::new()).collect(),
            generations: 0,
        }
    }

    pub(crate) fn weights(&self) -> Vec<f64> {
        self.stats.iter().map(|s| s.weight).collect()
    }

    pub(crate) fn record(&mut self, kind: MoveKind, outcome: Outcome) {
        let score = match outcome {
            Outcome::NewBest => self.config.score_new_best,
            Outcome::Improved => self.config.score_improved,
            Outcome::Accepted => self.config.score_accepted,
        };
        self.stats[kind.index()].record(score);
    }

    /// Closes a generation; updates weights at segment boundaries.
    pub(crate) fn end_generation(&mut self) {
        self.generations += 1;
        if self.generations % self.config.segment_length.max(1) == 0 {
            for stat in &mut self.stats {
                stat.update_weight(self.config.reaction_factor, self.config.min_weight);
            }
            tracing::debug!(weights = ?self.weights(), "operator weights updated");
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<(MoveKind, f64)> {
        MoveKind::ALL
            .iter()
            .map(|&k| (k, self.stats[k.index()].weight))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(segment_length: usize) -> OperatorConfig {
        OperatorConfig {
            segment_length,
            ..OperatorConfig::default()
        }
    }

    #[test]
    fn test_initial_weights_uniform() {
        let weights = OperatorWeights::new(config(10));
        assert_eq!(weights.weights(), vec![1.0; MoveKind::ALL.len()]);
    }

    #[test]
    fn test_successful_operator_gains_weight() {
        let mut weights = OperatorWeights::new(config(2));
        weights.record(MoveKind::Reverse, Outcome::NewBest);
        weights.end_generation();
        weights.record(MoveKind::Swap, Outcome::Accepted);
        weights.end_generation();

        let w = weights.weights();
        // 1.0 * 0.9 + 33 * 0.1 and 1.0 * 0.9 + 3 * 0.1
        assert!((w[MoveKind::Reverse.index()] - 4.2).abs() < 1e-10);
        assert!((w[MoveKind::Swap.index()] - 1.2).abs() < 1e-10);
        assert_eq!(w[MoveKind::Insert.index()], 1.0);
    }

    #[test]
    fn test_no_update_inside_segment() {
        let mut weights = OperatorWeights::new(config(5));
        weights.record(MoveKind::Cross, Outcome::Improved);
        weights.end_generation();
        assert_eq!(weights.weights()[MoveKind::Cross.index()], 1.0);
    }

    #[test]
    fn test_weight_floor() {
        let cfg = OperatorConfig {
            segment_length: 1,
            score_accepted: 0.0,
            reaction_factor: 1.0,
            min_weight: 0.25,
            ..OperatorConfig::default()
        };
        let mut weights = OperatorWeights::new(cfg);
        weights.record(MoveKind::Scramble, Outcome::Accepted);
        weights.end_generation();
        assert_eq!(weights.weights()[MoveKind::Scramble.index()], 0.25);
        assert_eq!(weights.snapshot().len(), MoveKind::ALL.len());
    }
}
