use thiserror::Error;

use crate::provider::BackendKind;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("{operation} is not supported by the {backend} backend, use the async variant")]
    UnsupportedOperation {
        operation: &'static str,
        backend: BackendKind,
    },

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid IV length: expected {expected} bytes, got {got}")]
    InvalidIvLength { expected: usize, got: usize },

    #[error("Invalid tag length: expected {expected} bytes, got {got}")]
    InvalidTagLength { expected: usize, got: usize },

    #[error("Encryption failed")]
    EncryptionFailed,

    /// Tag mismatch. Wrong key, IV, AAD and tampered ciphertext are not told apart.
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("HMAC computation failed: {0}")]
    Hmac(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarintError {
    #[error("Varint value must be finite")]
    NotFinite,

    #[error("Varint value must be non-negative")]
    Negative,

    #[error("Varint value must be an integer")]
    NotInteger,

    #[error("Varint value exceeds u32 range")]
    OutOfRange,

    #[error("Varint offset {offset} is out of bounds for {len} bytes")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("Varint is truncated")]
    Truncated,

    #[error("Varint is too long for a u32")]
    Overflow,
}
