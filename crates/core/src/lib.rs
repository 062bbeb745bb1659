pub mod config;
pub mod customer;
pub mod discount;
pub mod error;
pub mod order;
pub mod rounding;
pub mod tier;

pub use config::AppConfig;
pub use error::{LoyaltyError, LoyaltyResult};
