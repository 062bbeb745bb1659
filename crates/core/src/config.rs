use serde::Deserialize;
use std::collections::HashMap;

/// Root application configuration. Loaded from environment variables
/// with the prefix `TIERWISE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Normalization thresholds and region settings for the scoring strategies.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Spend at which the total-value score saturates at 1.0.
    #[serde(default = "default_max_total_spent")]
    pub max_total_spent: f64,
    /// Order count at which the order-count score saturates at 1.0.
    #[serde(default = "default_max_order_count")]
    pub max_order_count: u64,
    /// Mean inter-order interval (days) at which the frequency score hits 0.
    #[serde(default = "default_max_avg_days")]
    pub max_avg_days: f64,
    /// Region granting the full location score.
    #[serde(default = "default_primary_region")]
    pub primary_region: String,
    /// Optional region → score table consulted before the primary/other
    /// fallback. Values are clamped to [0, 1].
    #[serde(default)]
    pub region_scores: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

// Default functions
fn default_max_total_spent() -> f64 {
    10_000_000.0
}
fn default_max_order_count() -> u64 {
    20
}
fn default_max_avg_days() -> f64 {
    60.0
}
fn default_primary_region() -> String {
    "us-west".to_string()
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_cache_max_entries() -> usize {
    1024
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_total_spent: default_max_total_spent(),
            max_order_count: default_max_order_count(),
            max_avg_days: default_max_avg_days(),
            primary_region: default_primary_region(),
            region_scores: HashMap::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("TIERWISE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
