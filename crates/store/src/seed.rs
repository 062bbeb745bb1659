//! JSON seed files — reference data for the CLI and integration tests.

use std::path::Path;

use serde::{Deserialize, Serialize};

use tierwise_core::customer::Customer;
use tierwise_core::discount::Discount;
use tierwise_core::order::OrderRecord;
use tierwise_core::tier::CustomerTier;
use tierwise_core::LoyaltyResult;

use crate::memory::InMemoryStore;

/// Full reference-data snapshot loadable into an [`InMemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub tiers: Vec<CustomerTier>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
}

impl Seed {
    pub fn from_path(path: impl AsRef<Path>) -> LoyaltyResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Build a store from this seed. Malformed tier weights and duplicate
    /// discount codes are rejected here, before anything runs against the
    /// data.
    pub fn into_store(self) -> LoyaltyResult<InMemoryStore> {
        let store = InMemoryStore::new();
        for customer in self.customers {
            store.insert_customer(customer);
        }
        for tier in self.tiers {
            store.insert_tier(tier)?;
        }
        for discount in self.discounts {
            store.insert_discount(discount)?;
        }
        for order in self.orders {
            store.record_order(order);
        }
        Ok(store)
    }
}
