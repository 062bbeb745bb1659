use thiserror::Error;

pub type LoyaltyResult<T> = Result<T, LoyaltyError>;

/// Error taxonomy for the scoring and discount core.
///
/// Business conditions (expired discount, missing tier, score below every
/// threshold) are not errors; they surface as zero/neutral values or
/// rejection reasons. These variants cover programmer errors, bad
/// configuration, and collaborator failures only.
#[derive(Error, Debug)]
pub enum LoyaltyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
