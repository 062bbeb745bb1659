//! Promotional discount catalog types. Validity and amount computation live
//! in the discount engine; these types carry the catalog data plus the
//! window/usage helpers the engine composes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage of the order amount.
    Percentage,
    /// `value` is a flat monetary amount.
    FixedAmount,
}

/// Category used by the stacking rules: at most one accepted discount per
/// category unless both sides stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountCategory {
    Product,
    Payment,
    Customer,
    Seasonal,
    Promotion,
}

/// A promotional discount code.
///
/// `used_count` is mutated only through the store's atomic increment and
/// never exceeds `usage_limit` when a limit is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub id: Uuid,
    pub code: String,
    pub kind: DiscountKind,
    pub value: f64,
    #[serde(default)]
    pub min_order_amount: f64,
    /// Cap on the realized amount, when set.
    #[serde(default)]
    pub max_discount_amount: Option<f64>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    pub can_stack: bool,
    pub category: DiscountCategory,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Discount {
    /// Whether `now` falls inside the validity window (inclusive bounds).
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }

    /// Whether the usage limit, if any, has been reached.
    pub fn usage_exhausted(&self) -> bool {
        self.usage_limit
            .map(|limit| self.used_count >= limit)
            .unwrap_or(false)
    }
}
