//! Order-side types consumed by the pricing path. Orders are owned by the
//! ordering collaborator; the core only reads history records and writes
//! order↔discount join rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order as the pricing core sees it.
/// `total = subtotal - customer_discount_amount - discount_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub subtotal: f64,
    /// Tier-based discount.
    #[serde(default)]
    pub customer_discount_amount: f64,
    /// Sum of applied promotional discounts.
    #[serde(default)]
    pub discount_amount: f64,
    pub total: f64,
    pub placed_at: DateTime<Utc>,
}

/// Join row recording the realized amount of one discount on one order.
/// At most one row exists per (order, discount) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDiscount {
    pub order_id: Uuid,
    pub discount_id: Uuid,
    pub code: String,
    pub amount: f64,
}

/// Minimal order-history record from which behavioral aggregates derive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub total: f64,
    pub placed_at: DateTime<Utc>,
}
