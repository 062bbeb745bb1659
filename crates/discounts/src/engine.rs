//! Discount engine — validity checking, amount computation, and stacking
//! resolution for promotional discount codes on an order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use tierwise_core::discount::{Discount, DiscountCategory, DiscountKind};
use tierwise_core::order::OrderDiscount;
use tierwise_core::rounding::round_money;
use tierwise_core::LoyaltyResult;

/// Catalog and usage side of the discount collaborator. `increment_usage`
/// must be atomic and monotonic; it is invoked exactly once per accepted
/// discount per finalized order, never during a preview.
pub trait DiscountStore: Send + Sync {
    fn find_by_code(&self, code: &str) -> LoyaltyResult<Option<Discount>>;
    fn load_active_discounts(&self) -> LoyaltyResult<Vec<Discount>>;
    fn increment_usage(&self, discount_id: Uuid) -> LoyaltyResult<()>;
    fn record_order_discount(&self, row: &OrderDiscount) -> LoyaltyResult<()>;
}

/// Why a candidate code was not applied. These are business outcomes, not
/// errors; callers distinguishing "unknown" from "exhausted" read this
/// instead of catching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No discount with this code exists.
    UnknownCode,
    /// Inactive, outside its window, below the order minimum, or exhausted.
    NotApplicable,
    /// The code appeared earlier in the same candidate list.
    DuplicateCode,
    /// A non-stackable discount is already accepted, or this discount is
    /// non-stackable and would have to join others.
    ExclusiveConflict,
    /// A discount of the same category is already accepted.
    CategoryConflict,
}

/// An accepted discount with its realized amount.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedDiscount {
    pub discount_id: Uuid,
    pub code: String,
    pub category: DiscountCategory,
    pub amount: f64,
}

/// A rejected candidate with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedDiscount {
    pub code: String,
    pub reason: RejectReason,
}

/// Outcome of stacking resolution for one order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscountResolution {
    pub applied: Vec<AppliedDiscount>,
    pub rejected: Vec<RejectedDiscount>,
    /// Sum of applied amounts, rounded to 2 decimals.
    pub total_discount: f64,
}

/// Stateless computation over the discount catalog. Amounts are always
/// computed against the original order subtotal; candidates are honored in
/// caller order and the first accepted non-stackable discount locks the
/// order.
pub struct DiscountEngine {
    store: Arc<dyn DiscountStore>,
}

impl DiscountEngine {
    pub fn new(store: Arc<dyn DiscountStore>) -> Self {
        Self { store }
    }

    /// Discounts currently applicable to an order of this amount.
    pub fn applicable_discounts(
        &self,
        order_amount: f64,
        now: DateTime<Utc>,
    ) -> LoyaltyResult<Vec<Discount>> {
        Ok(self
            .store
            .load_active_discounts()?
            .into_iter()
            .filter(|d| self.is_valid(d, order_amount, now))
            .collect())
    }

    /// Whether the discount currently applies to an order of this amount.
    pub fn is_valid(&self, discount: &Discount, order_amount: f64, now: DateTime<Utc>) -> bool {
        discount.is_active
            && discount.in_window(now)
            && order_amount >= discount.min_order_amount
            && !discount.usage_exhausted()
    }

    /// Monetary amount this discount takes off the order. Returns 0 for any
    /// discount that is not currently valid (expired, exhausted, inactive,
    /// or below its order minimum) and never raises for those conditions.
    pub fn calculate_amount(
        &self,
        discount: &Discount,
        order_amount: f64,
        now: DateTime<Utc>,
    ) -> f64 {
        if !self.is_valid(discount, order_amount, now) {
            return 0.0;
        }
        let raw = match discount.kind {
            DiscountKind::Percentage => order_amount * discount.value / 100.0,
            DiscountKind::FixedAmount => discount.value,
        };
        let capped = match discount.max_discount_amount {
            Some(cap) => raw.min(cap),
            None => raw,
        };
        round_money(capped)
    }

    /// Resolve a candidate code list against the stacking rules without any
    /// side effects (dry-run / cart preview).
    pub fn resolve(
        &self,
        codes: &[String],
        order_amount: f64,
        now: DateTime<Utc>,
    ) -> LoyaltyResult<DiscountResolution> {
        let mut resolution = DiscountResolution::default();
        let mut seen_codes: HashSet<String> = HashSet::new();
        // category -> can_stack of the accepted discount holding it
        let mut held_categories: HashMap<DiscountCategory, bool> = HashMap::new();
        let mut locked_exclusive = false;

        for code in codes {
            if !seen_codes.insert(code.clone()) {
                resolution.reject(code, RejectReason::DuplicateCode);
                continue;
            }

            let Some(discount) = self.store.find_by_code(code)? else {
                resolution.reject(code, RejectReason::UnknownCode);
                continue;
            };

            if !self.is_valid(&discount, order_amount, now) {
                resolution.reject(code, RejectReason::NotApplicable);
                continue;
            }

            if locked_exclusive || (!discount.can_stack && !resolution.applied.is_empty()) {
                resolution.reject(code, RejectReason::ExclusiveConflict);
                continue;
            }

            if let Some(&holder_stacks) = held_categories.get(&discount.category) {
                // Same category twice only when both sides stack
                if !(holder_stacks && discount.can_stack) {
                    resolution.reject(code, RejectReason::CategoryConflict);
                    continue;
                }
            }

            let amount = self.calculate_amount(&discount, order_amount, now);
            held_categories.insert(discount.category, discount.can_stack);
            if !discount.can_stack {
                locked_exclusive = true;
            }
            resolution.applied.push(AppliedDiscount {
                discount_id: discount.id,
                code: discount.code.clone(),
                category: discount.category,
                amount,
            });
        }

        resolution.total_discount =
            round_money(resolution.applied.iter().map(|a| a.amount).sum());
        debug!(
            applied = resolution.applied.len(),
            rejected = resolution.rejected.len(),
            total = resolution.total_discount,
            "Discounts resolved"
        );
        Ok(resolution)
    }

    /// Resolve and commit: record one order↔discount row and bump the usage
    /// counter exactly once per accepted discount. Call only when the order
    /// is finalized.
    pub fn apply(
        &self,
        order_id: Uuid,
        codes: &[String],
        order_amount: f64,
        now: DateTime<Utc>,
    ) -> LoyaltyResult<DiscountResolution> {
        let resolution = self.resolve(codes, order_amount, now)?;
        for applied in &resolution.applied {
            self.store.record_order_discount(&OrderDiscount {
                order_id,
                discount_id: applied.discount_id,
                code: applied.code.clone(),
                amount: applied.amount,
            })?;
            self.store.increment_usage(applied.discount_id)?;
            metrics::counter!("discounts.usage_incremented").increment(1);
        }
        metrics::counter!("discounts.applied").increment(resolution.applied.len() as u64);
        info!(
            order_id = %order_id,
            applied = resolution.applied.len(),
            total = resolution.total_discount,
            "Discounts applied to order"
        );
        Ok(resolution)
    }
}

impl DiscountResolution {
    fn reject(&mut self, code: &str, reason: RejectReason) {
        self.rejected.push(RejectedDiscount {
            code: code.to_string(),
            reason,
        });
    }
}
