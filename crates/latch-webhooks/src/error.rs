use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Signature or timestamp missing")]
    MalformedHeader,

    #[error("No signature hash found with expected scheme v1")]
    EmptySignature,

    #[error("Invalid timestamp in signature header: {0:?}")]
    InvalidTimestamp(String),

    #[error("Timestamp outside the tolerance zone")]
    TimestampOutsideTolerance { timestamp: i64, tolerance_ms: u64 },

    #[error("Signature hash does not match the expected signature hash for payload")]
    SignatureMismatch,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] latch_crypto::CryptoError),
}
