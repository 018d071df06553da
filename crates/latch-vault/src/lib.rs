//! Envelope encryption for secret values.
//!
//! A value is encrypted under a one-off data key. The key service's wrapped
//! copy of that key travels inside the envelope, so decrypting needs only the
//! envelope and access to the same key service.

pub mod envelope;
pub mod error;
pub mod key_service;
pub mod vault;

pub use envelope::{decode_envelope, DecodedEnvelope, EnvelopeCodec, ENVELOPE_HEADER_LENGTH};
pub use error::{EnvelopeFormatError, VaultError};
#[cfg(any(test, feature = "test-util"))]
pub use key_service::InMemoryKeyService;
pub use key_service::{DataKey, KeyContext, KeyService, KeyServiceError};
pub use vault::Vault;
