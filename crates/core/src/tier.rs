//! Customer tier catalog — priced classifications entered when the loyalty
//! score crosses a threshold, with optional per-tier scoring weights.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LoyaltyError, LoyaltyResult};

/// Tolerance when checking that a weight set sums to 1.0.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Weights applied to the four scoring strategies. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub total_value: f64,
    pub order_count: f64,
    pub order_frequency: f64,
    pub location: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            total_value: 0.35,
            order_count: 0.25,
            order_frequency: 0.25,
            location: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.total_value + self.order_count + self.order_frequency + self.location
    }

    /// Reject weight sets that do not sum to 1.0 (within epsilon) or carry
    /// a negative component. Malformed configuration fails here, before any
    /// scoring runs.
    pub fn validate(&self) -> LoyaltyResult<()> {
        if self.total_value < 0.0
            || self.order_count < 0.0
            || self.order_frequency < 0.0
            || self.location < 0.0
        {
            return Err(LoyaltyError::Validation(
                "scoring weights must be non-negative".to_string(),
            ));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(LoyaltyError::Validation(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// A customer classification granting a discount rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerTier {
    pub id: Uuid,
    pub name: String,
    /// Inclusive lower score bound for this tier.
    pub minimum_score: f64,
    /// Higher priority wins when several tiers qualify.
    pub priority: i32,
    pub discount_percentage: f64,
    /// Order subtotal below which the tier discount does not apply.
    pub min_order_amount: f64,
    /// Per-tier override of the default strategy weights.
    #[serde(default)]
    pub scoring_weights: Option<ScoringWeights>,
    pub is_active: bool,
}

/// Weight resolution: the tier override when present, the default set
/// otherwise. Callers validate the result before scoring with it.
pub fn effective_weights(tier: Option<&CustomerTier>) -> ScoringWeights {
    tier.and_then(|t| t.scoring_weights)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = ScoringWeights::default();
        assert!(w.validate().is_ok());
        assert!((w.sum() - 1.0).abs() < WEIGHT_SUM_EPSILON);
    }

    #[test]
    fn test_malformed_weights_rejected() {
        let w = ScoringWeights {
            total_value: 0.5,
            order_count: 0.5,
            order_frequency: 0.5,
            location: 0.0,
        };
        assert!(matches!(w.validate(), Err(LoyaltyError::Validation(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let w = ScoringWeights {
            total_value: 1.2,
            order_count: -0.2,
            order_frequency: 0.0,
            location: 0.0,
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_effective_weights_prefers_tier_override() {
        let override_set = ScoringWeights {
            total_value: 0.4,
            order_count: 0.3,
            order_frequency: 0.2,
            location: 0.1,
        };
        let tier = CustomerTier {
            id: Uuid::new_v4(),
            name: "gold".to_string(),
            minimum_score: 0.6,
            priority: 2,
            discount_percentage: 10.0,
            min_order_amount: 0.0,
            scoring_weights: Some(override_set),
            is_active: true,
        };
        assert_eq!(effective_weights(Some(&tier)), override_set);
        assert_eq!(effective_weights(None), ScoringWeights::default());
    }
}
