use latch_crypto::{CryptoError, VarintError};
use thiserror::Error;

use crate::key_service::KeyServiceError;

/// Structural problems with an envelope. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeFormatError {
    #[error("Envelope too short: {len} bytes, header needs {min}")]
    TooShort { len: usize, min: usize },

    #[error("Invalid key blob length prefix: {0}")]
    InvalidLengthPrefix(#[from] VarintError),

    #[error("Envelope {field} must be {expected} bytes, got {got}")]
    InvalidFieldWidth {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Key blob length {declared} exceeds the {remaining} remaining bytes")]
    BlobOverrun { declared: usize, remaining: usize },
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Envelope is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("Malformed envelope: {0}")]
    Format(#[from] EnvelopeFormatError),

    #[error("Key blob of {0} bytes does not fit the length prefix")]
    BlobTooLarge(usize),

    #[error("Data key unwrap failed: {0}")]
    KeyUnwrap(String),

    #[error(transparent)]
    KeyService(#[from] KeyServiceError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl VaultError {
    /// True for errors caused by the envelope bytes themselves.
    pub fn is_format(&self) -> bool {
        matches!(self, VaultError::InvalidBase64(_) | VaultError::Format(_))
    }

    /// True when the same call may succeed later. Only key service outages
    /// qualify; bad envelopes and failed authentication never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::KeyService(e) if e.is_retryable())
    }
}
