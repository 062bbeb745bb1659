//! Scoring strategies — four stateless metric evaluators, each mapping a
//! customer's behavioral aggregates to a normalized score in [0, 1].
//!
//! Strategies are a fixed variant set dispatched through the `Scorer`
//! capability trait rather than string-keyed runtime lookup; the stable
//! names are only used for breakdown reporting and list edits.

use std::collections::HashMap;

use tierwise_core::config::ScoringConfig;
use tierwise_core::customer::CustomerAggregates;
use tierwise_core::rounding::round_score;

/// Spend at which the total-value score saturates.
pub const DEFAULT_MAX_TOTAL_SPENT: f64 = 10_000_000.0;
/// Order count at which the order-count score saturates.
pub const DEFAULT_MAX_ORDER_COUNT: u64 = 20;
/// Mean inter-order interval (days) at which the frequency score hits zero.
pub const DEFAULT_MAX_AVG_DAYS: f64 = 60.0;
/// Location score outside the primary region.
pub const NON_PRIMARY_REGION_SCORE: f64 = 0.3;

/// Anything that can produce a weighted normalized score. Implemented by
/// the individual metric strategies and by the composite scorer itself,
/// so composites could in principle nest.
pub trait Scorer: Send + Sync {
    /// Stable key used for breakdown reporting and list edits.
    fn name(&self) -> &'static str;
    fn weight(&self) -> f64;
    /// Normalized score in [0, 1]. Pure; no side effects.
    fn score(&self, aggregates: &CustomerAggregates, ctx: &ScoreContext) -> f64;
}

/// Per-call overrides for the strategy thresholds. Fields left `None`
/// fall back to the compiled-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ScoreContext {
    pub max_total_spent: Option<f64>,
    pub max_order_count: Option<u64>,
    pub max_avg_days: Option<f64>,
    pub primary_region: Option<String>,
    /// Region → score table consulted before the primary/other fallback.
    pub region_scores: HashMap<String, f64>,
}

impl ScoreContext {
    pub fn from_config(cfg: &ScoringConfig) -> Self {
        Self {
            max_total_spent: Some(cfg.max_total_spent),
            max_order_count: Some(cfg.max_order_count),
            max_avg_days: Some(cfg.max_avg_days),
            primary_region: Some(cfg.primary_region.clone()),
            region_scores: cfg.region_scores.clone(),
        }
    }
}

/// The fixed set of scoring metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    TotalValue,
    OrderCount,
    OrderFrequency,
    Location,
}

impl MetricKind {
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::TotalValue => "total_value",
            MetricKind::OrderCount => "order_count",
            MetricKind::OrderFrequency => "order_frequency",
            MetricKind::Location => "location",
        }
    }

    /// Raw normalized score for this metric, rounded to 3 decimals.
    pub fn score(&self, aggregates: &CustomerAggregates, ctx: &ScoreContext) -> f64 {
        let raw = match self {
            MetricKind::TotalValue => {
                let threshold = ctx.max_total_spent.unwrap_or(DEFAULT_MAX_TOTAL_SPENT);
                if threshold <= 0.0 {
                    0.0
                } else {
                    (aggregates.total_spent / threshold).clamp(0.0, 1.0)
                }
            }
            MetricKind::OrderCount => {
                let threshold = ctx.max_order_count.unwrap_or(DEFAULT_MAX_ORDER_COUNT);
                if threshold == 0 {
                    0.0
                } else {
                    (aggregates.order_count as f64 / threshold as f64).min(1.0)
                }
            }
            MetricKind::OrderFrequency => {
                let threshold = ctx.max_avg_days.unwrap_or(DEFAULT_MAX_AVG_DAYS);
                let avg_days = aggregates.average_days_between_orders;
                // avg_days <= 0 means fewer than two orders: no signal yet
                if threshold <= 0.0 || avg_days <= 0.0 {
                    0.0
                } else {
                    (1.0 - avg_days / threshold).clamp(0.0, 1.0)
                }
            }
            MetricKind::Location => {
                if let Some(&score) = ctx.region_scores.get(&aggregates.region) {
                    score.clamp(0.0, 1.0)
                } else if ctx
                    .primary_region
                    .as_deref()
                    .map(|primary| primary == aggregates.region)
                    .unwrap_or(false)
                {
                    1.0
                } else {
                    NON_PRIMARY_REGION_SCORE
                }
            }
        };
        round_score(raw)
    }
}

/// A metric paired with its resolved weight: one entry of the composite
/// scorer's strategy list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStrategy {
    pub kind: MetricKind,
    pub weight: f64,
}

impl MetricStrategy {
    pub fn new(kind: MetricKind, weight: f64) -> Self {
        Self { kind, weight }
    }
}

impl Scorer for MetricStrategy {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn score(&self, aggregates: &CustomerAggregates, ctx: &ScoreContext) -> f64 {
        self.kind.score(aggregates, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregates(spent: f64, count: u64, avg_days: f64, region: &str) -> CustomerAggregates {
        CustomerAggregates {
            total_spent: spent,
            order_count: count,
            average_days_between_orders: avg_days,
            region: region.to_string(),
        }
    }

    fn primary_ctx() -> ScoreContext {
        ScoreContext {
            primary_region: Some("us-west".to_string()),
            ..ScoreContext::default()
        }
    }

    #[test]
    fn test_total_value_midpoint() {
        let agg = aggregates(5_000_000.0, 0, 0.0, "us-west");
        assert_eq!(MetricKind::TotalValue.score(&agg, &primary_ctx()), 0.5);
    }

    #[test]
    fn test_total_value_saturates() {
        let agg = aggregates(25_000_000.0, 0, 0.0, "us-west");
        assert_eq!(MetricKind::TotalValue.score(&agg, &primary_ctx()), 1.0);
    }

    #[test]
    fn test_total_value_override_threshold() {
        let agg = aggregates(500.0, 0, 0.0, "us-west");
        let ctx = ScoreContext {
            max_total_spent: Some(1000.0),
            ..primary_ctx()
        };
        assert_eq!(MetricKind::TotalValue.score(&agg, &ctx), 0.5);
    }

    #[test]
    fn test_non_positive_threshold_scores_zero() {
        let agg = aggregates(500.0, 10, 10.0, "us-west");
        let ctx = ScoreContext {
            max_total_spent: Some(0.0),
            max_order_count: Some(0),
            max_avg_days: Some(-5.0),
            ..primary_ctx()
        };
        assert_eq!(MetricKind::TotalValue.score(&agg, &ctx), 0.0);
        assert_eq!(MetricKind::OrderCount.score(&agg, &ctx), 0.0);
        assert_eq!(MetricKind::OrderFrequency.score(&agg, &ctx), 0.0);
    }

    #[test]
    fn test_order_count_midpoint() {
        let agg = aggregates(0.0, 10, 0.0, "us-west");
        assert_eq!(MetricKind::OrderCount.score(&agg, &primary_ctx()), 0.5);
    }

    #[test]
    fn test_order_count_monotonic_and_clamped() {
        let ctx = primary_ctx();
        let mut prev = 0.0;
        for count in [0u64, 1, 5, 10, 20, 40] {
            let score = MetricKind::OrderCount.score(&aggregates(0.0, count, 0.0, "x"), &ctx);
            assert!(score >= prev);
            assert!((0.0..=1.0).contains(&score));
            prev = score;
        }
    }

    #[test]
    fn test_frequency_shorter_interval_scores_higher() {
        let ctx = primary_ctx();
        let fast = MetricKind::OrderFrequency.score(&aggregates(0.0, 0, 15.0, "x"), &ctx);
        let slow = MetricKind::OrderFrequency.score(&aggregates(0.0, 0, 45.0, "x"), &ctx);
        assert_eq!(fast, 0.75);
        assert_eq!(slow, 0.25);
        assert!(fast > slow);
    }

    #[test]
    fn test_frequency_no_history_scores_zero() {
        let agg = aggregates(0.0, 1, 0.0, "x");
        assert_eq!(MetricKind::OrderFrequency.score(&agg, &primary_ctx()), 0.0);
    }

    #[test]
    fn test_frequency_long_interval_floors_at_zero() {
        let agg = aggregates(0.0, 5, 120.0, "x");
        assert_eq!(MetricKind::OrderFrequency.score(&agg, &primary_ctx()), 0.0);
    }

    #[test]
    fn test_location_primary_vs_other() {
        let ctx = primary_ctx();
        let home = MetricKind::Location.score(&aggregates(0.0, 0, 0.0, "us-west"), &ctx);
        let away = MetricKind::Location.score(&aggregates(0.0, 0, 0.0, "eu-central"), &ctx);
        assert_eq!(home, 1.0);
        assert_eq!(away, NON_PRIMARY_REGION_SCORE);
    }

    #[test]
    fn test_location_region_table_takes_precedence() {
        let mut ctx = primary_ctx();
        ctx.region_scores.insert("eu-central".to_string(), 0.7);
        ctx.region_scores.insert("apac".to_string(), 1.8);
        let tabled = MetricKind::Location.score(&aggregates(0.0, 0, 0.0, "eu-central"), &ctx);
        let clamped = MetricKind::Location.score(&aggregates(0.0, 0, 0.0, "apac"), &ctx);
        assert_eq!(tabled, 0.7);
        assert_eq!(clamped, 1.0);
    }
}
