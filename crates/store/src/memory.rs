//! In-memory store backed by `DashMap` for development and tests; swap for
//! a database-backed implementation of the same traits in production.
//!
//! Concurrency notes: `save_score` mutates one customer entry under its
//! shard lock, so a customer's score fields never interleave between two
//! writers. `increment_usage` is a guarded in-place increment: monotonic
//! and never past the limit.

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use tierwise_core::customer::{Customer, CustomerAggregates};
use tierwise_core::discount::Discount;
use tierwise_core::order::{OrderDiscount, OrderRecord};
use tierwise_core::tier::CustomerTier;
use tierwise_core::{LoyaltyError, LoyaltyResult};
use tierwise_discounts::DiscountStore;
use tierwise_scoring::{AggregateProvider, ScoreStore, ScoreUpdate};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Development backend for every persistence contract of the core.
pub struct InMemoryStore {
    customers: DashMap<Uuid, Customer>,
    tiers: DashMap<Uuid, CustomerTier>,
    discounts: DashMap<Uuid, Discount>,
    discount_codes: DashMap<String, Uuid>,
    order_history: DashMap<Uuid, Vec<OrderRecord>>,
    order_discounts: DashMap<(Uuid, Uuid), OrderDiscount>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        info!("InMemoryStore initialized");
        Self {
            customers: DashMap::new(),
            tiers: DashMap::new(),
            discounts: DashMap::new(),
            discount_codes: DashMap::new(),
            order_history: DashMap::new(),
            order_discounts: DashMap::new(),
        }
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.customers.insert(customer.id, customer);
    }

    /// Register a tier. Malformed weight overrides are rejected here, at
    /// load time, rather than at scoring time.
    pub fn insert_tier(&self, tier: CustomerTier) -> LoyaltyResult<()> {
        if let Some(weights) = &tier.scoring_weights {
            weights.validate()?;
        }
        self.tiers.insert(tier.id, tier);
        Ok(())
    }

    /// Register a discount. Codes are unique across the catalog.
    pub fn insert_discount(&self, discount: Discount) -> LoyaltyResult<()> {
        if self.discount_codes.contains_key(&discount.code) {
            return Err(LoyaltyError::Validation(format!(
                "duplicate discount code {}",
                discount.code
            )));
        }
        self.discount_codes
            .insert(discount.code.clone(), discount.id);
        self.discounts.insert(discount.id, discount);
        Ok(())
    }

    /// Append an order-history record for its customer.
    pub fn record_order(&self, record: OrderRecord) {
        self.order_history
            .entry(record.customer_id)
            .or_default()
            .push(record);
    }

    pub fn get_customer(&self, id: Uuid) -> Option<Customer> {
        self.customers.get(&id).map(|c| c.clone())
    }

    pub fn get_tier(&self, id: Uuid) -> Option<CustomerTier> {
        self.tiers.get(&id).map(|t| t.clone())
    }

    /// Join rows recorded for one order.
    pub fn order_discount_rows(&self, order_id: Uuid) -> Vec<OrderDiscount> {
        self.order_discounts
            .iter()
            .filter(|entry| entry.key().0 == order_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }
}

impl ScoreStore for InMemoryStore {
    fn load_customer(&self, id: Uuid) -> LoyaltyResult<Customer> {
        self.customers
            .get(&id)
            .map(|c| c.clone())
            .ok_or_else(|| LoyaltyError::NotFound(format!("customer {id}")))
    }

    fn customer_ids(&self) -> LoyaltyResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self.customers.iter().map(|c| *c.key()).collect();
        ids.sort();
        Ok(ids)
    }

    fn load_active_tiers(&self) -> LoyaltyResult<Vec<CustomerTier>> {
        Ok(self
            .tiers
            .iter()
            .filter(|t| t.is_active)
            .map(|t| t.clone())
            .collect())
    }

    fn save_score(&self, update: &ScoreUpdate) -> LoyaltyResult<()> {
        let mut customer = self
            .customers
            .get_mut(&update.customer_id)
            .ok_or_else(|| LoyaltyError::NotFound(format!("customer {}", update.customer_id)))?;
        customer.current_score = update.score;
        customer.component_scores = update.components;
        customer.tier_id = update.tier_id;
        customer.last_scored_at = Some(update.scored_at);
        Ok(())
    }
}

impl AggregateProvider for InMemoryStore {
    fn aggregates_for(&self, customer_id: Uuid) -> LoyaltyResult<CustomerAggregates> {
        let region = self
            .customers
            .get(&customer_id)
            .map(|c| c.region.clone())
            .ok_or_else(|| LoyaltyError::NotFound(format!("customer {customer_id}")))?;

        let mut history = self
            .order_history
            .get(&customer_id)
            .map(|h| h.clone())
            .unwrap_or_default();
        history.sort_by_key(|r| r.placed_at);

        let order_count = history.len() as u64;
        let total_spent: f64 = history.iter().map(|r| r.total).sum();
        let average_days_between_orders = if history.len() < 2 {
            0.0
        } else {
            let gap_days: f64 = history
                .windows(2)
                .map(|pair| (pair[1].placed_at - pair[0].placed_at).num_seconds() as f64
                    / SECONDS_PER_DAY)
                .sum();
            gap_days / (history.len() - 1) as f64
        };

        Ok(CustomerAggregates {
            total_spent,
            order_count,
            average_days_between_orders,
            region,
        })
    }
}

impl DiscountStore for InMemoryStore {
    fn find_by_code(&self, code: &str) -> LoyaltyResult<Option<Discount>> {
        // Copy the id out before touching the discounts map so no two
        // shard locks are ever held at once
        let Some(id) = self.discount_codes.get(code).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.discounts.get(&id).map(|d| d.clone()))
    }

    fn load_active_discounts(&self) -> LoyaltyResult<Vec<Discount>> {
        Ok(self
            .discounts
            .iter()
            .filter(|d| d.is_active)
            .map(|d| d.clone())
            .collect())
    }

    fn increment_usage(&self, discount_id: Uuid) -> LoyaltyResult<()> {
        let mut discount = self
            .discounts
            .get_mut(&discount_id)
            .ok_or_else(|| LoyaltyError::NotFound(format!("discount {discount_id}")))?;
        if discount.usage_exhausted() {
            return Err(LoyaltyError::Validation(format!(
                "discount {} usage limit reached",
                discount.code
            )));
        }
        discount.used_count += 1;
        Ok(())
    }

    fn record_order_discount(&self, row: &OrderDiscount) -> LoyaltyResult<()> {
        // One row per (order, discount) pair; a repeated apply is a no-op
        self.order_discounts
            .entry((row.order_id, row.discount_id))
            .or_insert_with(|| row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tierwise_core::discount::{DiscountCategory, DiscountKind};
    use tierwise_core::tier::ScoringWeights;

    fn order(customer_id: Uuid, total: f64, day: i64) -> OrderRecord {
        OrderRecord {
            order_id: Uuid::new_v4(),
            customer_id,
            total,
            placed_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(day),
        }
    }

    fn discount(code: &str) -> Discount {
        let now = Utc::now();
        Discount {
            id: Uuid::new_v4(),
            code: code.to_string(),
            kind: DiscountKind::Percentage,
            value: 10.0,
            min_order_amount: 0.0,
            max_discount_amount: None,
            usage_limit: None,
            used_count: 0,
            can_stack: true,
            category: DiscountCategory::Promotion,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
        }
    }

    #[test]
    fn test_aggregates_from_order_history() {
        let store = InMemoryStore::new();
        let customer = Customer::new("Ada", "ada@example.com", "us-west");
        let id = customer.id;
        store.insert_customer(customer);

        // Orders on days 0, 15 and 30: mean gap 15 days
        store.record_order(order(id, 100.0, 0));
        store.record_order(order(id, 250.0, 15));
        store.record_order(order(id, 150.0, 30));

        let agg = store.aggregates_for(id).unwrap();
        assert_eq!(agg.order_count, 3);
        assert_eq!(agg.total_spent, 500.0);
        assert_eq!(agg.average_days_between_orders, 15.0);
        assert_eq!(agg.region, "us-west");
    }

    #[test]
    fn test_single_order_has_no_interval_signal() {
        let store = InMemoryStore::new();
        let customer = Customer::new("Ada", "ada@example.com", "us-west");
        let id = customer.id;
        store.insert_customer(customer);
        store.record_order(order(id, 100.0, 0));

        let agg = store.aggregates_for(id).unwrap();
        assert_eq!(agg.order_count, 1);
        assert_eq!(agg.average_days_between_orders, 0.0);
    }

    #[test]
    fn test_usage_increment_guards_limit() {
        let store = InMemoryStore::new();
        let mut d = discount("ONCE");
        d.usage_limit = Some(1);
        let id = d.id;
        store.insert_discount(d).unwrap();

        store.increment_usage(id).unwrap();
        let err = store.increment_usage(id);
        assert!(matches!(err, Err(LoyaltyError::Validation(_))));
        assert_eq!(store.find_by_code("ONCE").unwrap().unwrap().used_count, 1);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let store = InMemoryStore::new();
        store.insert_discount(discount("SAVE10")).unwrap();
        assert!(store.insert_discount(discount("SAVE10")).is_err());
    }

    #[test]
    fn test_one_join_row_per_pair() {
        let store = InMemoryStore::new();
        let order_id = Uuid::new_v4();
        let discount_id = Uuid::new_v4();
        let row = OrderDiscount {
            order_id,
            discount_id,
            code: "SAVE10".to_string(),
            amount: 10.0,
        };
        store.record_order_discount(&row).unwrap();
        store.record_order_discount(&row).unwrap();
        assert_eq!(store.order_discount_rows(order_id).len(), 1);
    }

    #[test]
    fn test_malformed_tier_weights_rejected_at_load() {
        let store = InMemoryStore::new();
        let tier = CustomerTier {
            id: Uuid::new_v4(),
            name: "gold".to_string(),
            minimum_score: 0.7,
            priority: 3,
            discount_percentage: 10.0,
            min_order_amount: 0.0,
            scoring_weights: Some(ScoringWeights {
                total_value: 0.9,
                order_count: 0.9,
                order_frequency: 0.0,
                location: 0.0,
            }),
            is_active: true,
        };
        assert!(store.insert_tier(tier).is_err());
    }
}
