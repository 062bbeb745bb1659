//! Composite scorer — aggregates the strategy outputs into one weighted
//! score and exposes a per-strategy breakdown for audit output.

use serde::Serialize;

use tierwise_core::customer::CustomerAggregates;
use tierwise_core::rounding::round_score;
use tierwise_core::tier::ScoringWeights;
use tierwise_core::LoyaltyResult;

use crate::strategy::{MetricKind, MetricStrategy, ScoreContext, Scorer};

/// One strategy's contribution to a composite score.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyScore {
    pub name: &'static str,
    pub raw: f64,
    pub weight: f64,
    pub weighted: f64,
}

/// Weighted aggregation over an ordered, immutable strategy list.
///
/// Deterministic for identical aggregates and strategy set; no storage or
/// network side effects, safe to call repeatedly.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    strategies: Vec<MetricStrategy>,
}

impl CompositeScorer {
    /// Build the standard four-strategy scorer from a validated weight set.
    pub fn from_weights(weights: &ScoringWeights) -> LoyaltyResult<Self> {
        weights.validate()?;
        Ok(Self {
            strategies: vec![
                MetricStrategy::new(MetricKind::TotalValue, weights.total_value),
                MetricStrategy::new(MetricKind::OrderCount, weights.order_count),
                MetricStrategy::new(MetricKind::OrderFrequency, weights.order_frequency),
                MetricStrategy::new(MetricKind::Location, weights.location),
            ],
        })
    }

    /// Append a strategy, returning the rebuilt scorer.
    pub fn with_strategy(mut self, strategy: MetricStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Drop the strategy with the given name, returning the rebuilt scorer.
    /// The remaining list keeps its order with no holes.
    pub fn without_strategy(self, name: &str) -> Self {
        Self {
            strategies: self
                .strategies
                .into_iter()
                .filter(|s| s.name() != name)
                .collect(),
        }
    }

    pub fn strategies(&self) -> &[MetricStrategy] {
        &self.strategies
    }

    /// Weighted sum of all strategy scores, rounded to 3 decimals.
    pub fn calculate(&self, aggregates: &CustomerAggregates, ctx: &ScoreContext) -> f64 {
        let sum: f64 = self
            .strategies
            .iter()
            .map(|s| s.score(aggregates, ctx) * s.weight())
            .sum();
        round_score(sum)
    }

    /// Per-strategy `{raw, weight, weighted}` rows. Pure audit output;
    /// mutates nothing.
    pub fn breakdown(
        &self,
        aggregates: &CustomerAggregates,
        ctx: &ScoreContext,
    ) -> Vec<StrategyScore> {
        self.strategies
            .iter()
            .map(|s| {
                let raw = s.score(aggregates, ctx);
                StrategyScore {
                    name: s.name(),
                    raw,
                    weight: s.weight(),
                    weighted: raw * s.weight(),
                }
            })
            .collect()
    }
}

impl Scorer for CompositeScorer {
    fn name(&self) -> &'static str {
        "composite"
    }

    /// Terminal aggregator: its own weight is unity.
    fn weight(&self) -> f64 {
        1.0
    }

    fn score(&self, aggregates: &CustomerAggregates, ctx: &ScoreContext) -> f64 {
        self.calculate(aggregates, ctx)
    }
}
