//! TierWise — customer loyalty scoring and discount engine.
//!
//! CLI entry point: batch/single rescoring and order quoting over a JSON
//! seed snapshot. Exit status is non-zero when any rescore failed.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use tierwise_cache::LocalCache;
use tierwise_core::config::AppConfig;
use tierwise_discounts::{DiscountEngine, OrderPricer};
use tierwise_scoring::ScoreUpdater;
use tierwise_store::Seed;

#[derive(Parser, Debug)]
#[command(name = "tierwise")]
#[command(about = "Customer loyalty scoring and discount engine")]
#[command(version)]
struct Cli {
    /// JSON seed snapshot (customers, tiers, discounts, order history)
    #[arg(long, env = "TIERWISE__SEED")]
    seed: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recalculate loyalty scores and tier assignments
    Rescore {
        /// Single customer to rescore; omit to rescore everyone
        #[arg(long)]
        customer: Option<Uuid>,
        /// Include the per-strategy breakdown in the output
        #[arg(long, default_value_t = false)]
        debug: bool,
    },
    /// Price an order: tier discount plus promotional codes
    Quote {
        #[arg(long)]
        customer: Uuid,
        /// Order subtotal
        #[arg(long)]
        amount: f64,
        /// Comma-separated discount codes
        #[arg(long, value_delimiter = ',')]
        codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tierwise=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let store = Arc::new(Seed::from_path(&cli.seed)?.into_store()?);
    info!(customers = store.customer_count(), "Seed loaded");

    match cli.command {
        Command::Rescore { customer, debug } => {
            let tier_cache = LocalCache::new(config.cache.ttl_secs, config.cache.max_entries);
            let updater = ScoreUpdater::new(
                store.clone(),
                store.clone(),
                config.scoring.clone(),
                tier_cache,
            );
            match customer {
                Some(id) => {
                    let result = updater.update_customer(id, debug);
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    if !result.success {
                        std::process::exit(1);
                    }
                }
                None => {
                    let summary = updater.update_all_customers()?;
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                    if summary.has_errors() {
                        std::process::exit(1);
                    }
                }
            }
        }
        Command::Quote {
            customer,
            amount,
            codes,
        } => {
            let profile = store
                .get_customer(customer)
                .ok_or_else(|| anyhow::anyhow!("unknown customer {customer}"))?;
            let tier = profile.tier_id.and_then(|id| store.get_tier(id));
            let pricer = OrderPricer::new(DiscountEngine::new(store.clone()));
            let quote = pricer.quote(amount, tier.as_ref(), &codes, chrono::Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
    }

    Ok(())
}
