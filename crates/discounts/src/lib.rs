pub mod engine;
pub mod pricing;

pub use engine::{
    AppliedDiscount, DiscountEngine, DiscountResolution, DiscountStore, RejectReason,
    RejectedDiscount,
};
pub use pricing::{OrderPricer, OrderQuote, TierPricing};
