//! Tier pricing — the tier-based discount on an order subtotal — and the
//! order pricer that combines it with promotional stacking into a quote.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use tierwise_core::rounding::round_money;
use tierwise_core::tier::CustomerTier;
use tierwise_core::LoyaltyResult;

use crate::engine::{DiscountEngine, DiscountResolution};

/// Tier-based discount computation, independent of promotional codes.
/// Runs before promotional stacking; both subtract from the subtotal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierPricing;

impl TierPricing {
    pub fn new() -> Self {
        Self
    }

    /// Tier discount on an order amount: 0 without a tier, 0 below the
    /// tier's order minimum, else the tier percentage, rounded to 2
    /// decimals. Never raises for a missing tier.
    pub fn calculate_discount(&self, amount: f64, tier: Option<&CustomerTier>) -> f64 {
        let Some(tier) = tier else {
            return 0.0;
        };
        if amount < tier.min_order_amount {
            return 0.0;
        }
        round_money(amount * tier.discount_percentage / 100.0)
    }

    pub fn calculate_total(&self, amount: f64, tier: Option<&CustomerTier>) -> f64 {
        round_money(amount - self.calculate_discount(amount, tier))
    }
}

/// Final pricing of one order: tier discount plus accepted promotional
/// discounts, both computed against the original subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct OrderQuote {
    pub subtotal: f64,
    pub tier_discount: f64,
    pub promotions: DiscountResolution,
    /// `subtotal - tier_discount - promotions.total_discount`, floored at 0.
    pub total: f64,
}

/// Combines the two discount paths for the order-pricing caller.
pub struct OrderPricer {
    tier_pricing: TierPricing,
    engine: DiscountEngine,
}

impl OrderPricer {
    pub fn new(engine: DiscountEngine) -> Self {
        Self {
            tier_pricing: TierPricing::new(),
            engine,
        }
    }

    /// Price an order without committing anything (cart preview).
    pub fn quote(
        &self,
        subtotal: f64,
        tier: Option<&CustomerTier>,
        codes: &[String],
        now: DateTime<Utc>,
    ) -> LoyaltyResult<OrderQuote> {
        let promotions = self.engine.resolve(codes, subtotal, now)?;
        Ok(self.assemble(subtotal, tier, promotions))
    }

    /// Price a finalized order: records order↔discount rows and usage
    /// increments for the accepted promotional discounts.
    pub fn finalize(
        &self,
        order_id: Uuid,
        subtotal: f64,
        tier: Option<&CustomerTier>,
        codes: &[String],
        now: DateTime<Utc>,
    ) -> LoyaltyResult<OrderQuote> {
        let promotions = self.engine.apply(order_id, codes, subtotal, now)?;
        Ok(self.assemble(subtotal, tier, promotions))
    }

    fn assemble(
        &self,
        subtotal: f64,
        tier: Option<&CustomerTier>,
        promotions: DiscountResolution,
    ) -> OrderQuote {
        let tier_discount = self.tier_pricing.calculate_discount(subtotal, tier);
        let total =
            round_money((subtotal - tier_discount - promotions.total_discount).max(0.0));
        OrderQuote {
            subtotal,
            tier_discount,
            promotions,
            total,
        }
    }
}
