//! Score updater — the orchestrator that pulls behavioral aggregates, runs
//! the composite scorer and tier classifier, persists the outcome, and
//! reports a structured result per customer or for a whole batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tierwise_cache::LocalCache;
use tierwise_core::config::ScoringConfig;
use tierwise_core::customer::{ComponentScores, Customer, CustomerAggregates};
use tierwise_core::tier::{effective_weights, CustomerTier};
use tierwise_core::{LoyaltyError, LoyaltyResult};

use crate::classifier::TierClassifier;
use crate::composite::{CompositeScorer, StrategyScore};
use crate::strategy::ScoreContext;

const ACTIVE_TIERS_KEY: &str = "tiers.active";

/// Read side of the aggregate collaborator: per-customer behavioral totals.
pub trait AggregateProvider: Send + Sync {
    fn aggregates_for(&self, customer_id: Uuid) -> LoyaltyResult<CustomerAggregates>;
}

/// Persistence contract for the scoring path. `save_score` must write all
/// score fields of one customer as a single isolated update; concurrent
/// writers for the same customer serialize on the store side.
pub trait ScoreStore: Send + Sync {
    fn load_customer(&self, id: Uuid) -> LoyaltyResult<Customer>;
    fn customer_ids(&self) -> LoyaltyResult<Vec<Uuid>>;
    fn load_active_tiers(&self) -> LoyaltyResult<Vec<CustomerTier>>;
    fn save_score(&self, update: &ScoreUpdate) -> LoyaltyResult<()>;
}

/// Atomic write unit for one customer's recalculation.
#[derive(Debug, Clone)]
pub struct ScoreUpdate {
    pub customer_id: Uuid,
    pub score: f64,
    pub components: ComponentScores,
    pub tier_id: Option<Uuid>,
    pub scored_at: DateTime<Utc>,
}

/// Outcome of one customer recalculation. Failures carry the customer's
/// untouched prior state alongside the cause.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringResult {
    pub customer_id: Uuid,
    pub success: bool,
    pub old_score: f64,
    pub new_score: f64,
    pub old_tier_id: Option<Uuid>,
    pub new_tier_id: Option<Uuid>,
    pub was_reclassified: bool,
    /// Per-strategy audit rows, populated in debug mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<StrategyScore>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoringResult {
    fn failure(customer: &Customer, error: &LoyaltyError) -> Self {
        Self {
            customer_id: customer.id,
            success: false,
            old_score: customer.current_score,
            new_score: customer.current_score,
            old_tier_id: customer.tier_id,
            new_tier_id: customer.tier_id,
            was_reclassified: false,
            breakdown: None,
            error: Some(error.to_string()),
        }
    }

    fn load_failure(customer_id: Uuid, error: &LoyaltyError) -> Self {
        Self {
            customer_id,
            success: false,
            old_score: 0.0,
            new_score: 0.0,
            old_tier_id: None,
            new_tier_id: None,
            was_reclassified: false,
            breakdown: None,
            error: Some(error.to_string()),
        }
    }
}

/// Machine-readable batch outcome allowing partial success.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub reclassified: usize,
    pub errors: usize,
    pub results: Vec<ScoringResult>,
}

impl BatchSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Orchestrates read-aggregates → compute → classify → persist for one
/// customer at a time. Owns the customer score fields exclusively; tiers
/// and discounts are read-only reference data here.
pub struct ScoreUpdater {
    store: Arc<dyn ScoreStore>,
    aggregates: Arc<dyn AggregateProvider>,
    config: ScoringConfig,
    tier_cache: LocalCache<Vec<CustomerTier>>,
}

impl ScoreUpdater {
    /// The tier cache is constructed by the application bootstrap and
    /// handed in; the updater never owns a process-wide singleton.
    pub fn new(
        store: Arc<dyn ScoreStore>,
        aggregates: Arc<dyn AggregateProvider>,
        config: ScoringConfig,
        tier_cache: LocalCache<Vec<CustomerTier>>,
    ) -> Self {
        Self {
            store,
            aggregates,
            config,
            tier_cache,
        }
    }

    /// Recalculate one customer. Never returns `Err`: every failure is
    /// folded into an error-tagged result and the customer record stays
    /// unmodified.
    pub fn update_customer(&self, customer_id: Uuid, debug: bool) -> ScoringResult {
        let customer = match self.store.load_customer(customer_id) {
            Ok(customer) => customer,
            Err(err) => {
                metrics::counter!("scoring.errors").increment(1);
                return ScoringResult::load_failure(customer_id, &err);
            }
        };

        match self.recalculate(&customer, debug) {
            Ok(result) => result,
            Err(err) => {
                metrics::counter!("scoring.errors").increment(1);
                warn!(customer_id = %customer_id, error = %err, "Score update failed");
                ScoringResult::failure(&customer, &err)
            }
        }
    }

    /// Recalculate every customer sequentially. Per-customer failures are
    /// isolated into the summary; a global failure (customer listing or
    /// tier catalog unavailable) aborts the batch early.
    pub fn update_all_customers(&self) -> LoyaltyResult<BatchSummary> {
        let ids = self.store.customer_ids()?;
        // Warm the tier catalog once; an unreadable catalog is fatal for
        // the whole batch, not a per-customer condition.
        self.active_tiers()?;

        let mut summary = BatchSummary::default();
        for id in ids {
            let result = self.update_customer(id, false);
            summary.processed += 1;
            if result.was_reclassified {
                summary.reclassified += 1;
            }
            if !result.success {
                summary.errors += 1;
            }
            summary.results.push(result);
        }

        info!(
            processed = summary.processed,
            reclassified = summary.reclassified,
            errors = summary.errors,
            "Batch recalculation finished"
        );
        Ok(summary)
    }

    /// Fire-and-forget recalculation for the order-created trigger.
    /// Errors are logged and swallowed; the originating order flow never
    /// observes them.
    pub fn spawn_update(self: &Arc<Self>, customer_id: Uuid) {
        let updater = Arc::clone(self);
        tokio::spawn(async move {
            let result = updater.update_customer(customer_id, false);
            if !result.success {
                warn!(
                    customer_id = %customer_id,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "Post-order rescore failed"
                );
            }
        });
    }

    /// Drop the cached tier catalog, forcing a reload on next use.
    pub fn invalidate_tier_cache(&self) {
        self.tier_cache.forget(ACTIVE_TIERS_KEY);
    }

    fn active_tiers(&self) -> LoyaltyResult<Vec<CustomerTier>> {
        self.tier_cache
            .remember(ACTIVE_TIERS_KEY, || self.store.load_active_tiers())
    }

    fn recalculate(&self, customer: &Customer, debug: bool) -> LoyaltyResult<ScoringResult> {
        let tiers = self.active_tiers()?;
        let current_tier = customer
            .tier_id
            .and_then(|id| tiers.iter().find(|t| t.id == id));

        let weights = effective_weights(current_tier);
        let scorer = CompositeScorer::from_weights(&weights)?;

        let aggregates = self.aggregates.aggregates_for(customer.id)?;
        let ctx = ScoreContext::from_config(&self.config);

        let breakdown = scorer.breakdown(&aggregates, &ctx);
        let score = scorer.calculate(&aggregates, &ctx);
        let components = components_from(&breakdown);

        let new_tier = TierClassifier::classify(score, &tiers);
        let new_tier_id = new_tier.map(|t| t.id);
        let was_reclassified = new_tier_id != customer.tier_id;

        self.store.save_score(&ScoreUpdate {
            customer_id: customer.id,
            score,
            components,
            tier_id: new_tier_id,
            scored_at: Utc::now(),
        })?;

        metrics::counter!("scoring.customers_scored").increment(1);
        if was_reclassified {
            metrics::counter!("scoring.reclassifications").increment(1);
            info!(
                customer_id = %customer.id,
                old_tier = ?customer.tier_id,
                new_tier = ?new_tier.map(|t| t.name.as_str()),
                score = score,
                "Customer reclassified"
            );
        } else {
            debug!(customer_id = %customer.id, score = score, "Score refreshed");
        }

        Ok(ScoringResult {
            customer_id: customer.id,
            success: true,
            old_score: customer.current_score,
            new_score: score,
            old_tier_id: customer.tier_id,
            new_tier_id,
            was_reclassified,
            breakdown: debug.then_some(breakdown),
            error: None,
        })
    }
}

fn components_from(breakdown: &[StrategyScore]) -> ComponentScores {
    let mut components = ComponentScores::default();
    for row in breakdown {
        match row.name {
            "total_value" => components.total_value = row.raw,
            "order_count" => components.order_count = row.raw,
            "order_frequency" => components.order_frequency = row.raw,
            "location" => components.location = row.raw,
            _ => {}
        }
    }
    components
}
