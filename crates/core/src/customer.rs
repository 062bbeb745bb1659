//! Customer domain types — scored profile plus the behavioral aggregates
//! the scoring strategies consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-strategy normalized scores from the most recent calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub total_value: f64,
    pub order_count: f64,
    pub order_frequency: f64,
    pub location: f64,
}

/// A customer profile as seen by the scoring core.
///
/// `current_score` is always the weighted sum of `component_scores` under
/// the weight set active at `last_scored_at`, rounded to 3 decimals. The
/// score fields are owned exclusively by the score updater.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Region key used by the location strategy.
    pub region: String,
    #[serde(default)]
    pub current_score: f64,
    #[serde(default)]
    pub component_scores: ComponentScores,
    /// Current tier. None until the first classification.
    #[serde(default)]
    pub tier_id: Option<Uuid>,
    #[serde(default)]
    pub last_scored_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// A fresh, unscored customer.
    pub fn new(name: impl Into<String>, email: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            region: region.into(),
            current_score: 0.0,
            component_scores: ComponentScores::default(),
            tier_id: None,
            last_scored_at: None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.last_scored_at.is_some()
    }
}

/// Behavioral aggregates supplied by the order-history collaborator.
/// Pure input to the strategies; the core never derives these itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerAggregates {
    pub total_spent: f64,
    pub order_count: u64,
    /// Mean gap between consecutive orders in days; 0 when fewer than
    /// two orders exist.
    pub average_days_between_orders: f64,
    pub region: String,
}
