use thiserror::Error;

pub type InsightsResult<T> = Result<T, InsightsError>;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown breakdown dimension: {0}")]
    UnknownBreakdown(String),

    #[error("Breakdown asset {breakdown} missing on ad {ad_id}")]
    MissingBreakdownAsset { breakdown: String, ad_id: String },

    #[error("Missing or invalid field `{field}` on ad {ad_id}")]
    MissingField { field: String, ad_id: String },

    #[error("Platform API error: {0}")]
    Platform(String),

    #[error("Chart rendering error: {0}")]
    Render(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
