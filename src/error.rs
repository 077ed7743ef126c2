use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unrecognized period expression: {0}")]
    PeriodParse(String),

    #[error("No data found for {0}")]
    NoDataFound(String),

    #[error("Transaction store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Query exceeded its deadline: {0}")]
    QueryTimeout(String),

    #[error("{unclassified} of {total} entries matched no classification rule")]
    ClassificationGap { unclassified: usize, total: usize },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the fallback chain may absorb this failure as "tier found nothing".
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::SerializationError(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
