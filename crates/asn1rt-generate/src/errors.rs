use thiserror::Error;

/// Errors emitted while building values.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error(transparent)]
    Model(#[from] asn1rt_core::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
