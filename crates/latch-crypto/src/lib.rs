//! Cryptographic primitives for latch.
//!
//! - [`CryptoProvider`] and its two interoperable backends (`ring` and
//!   RustCrypto), chosen once through [`select_backend`]
//! - the `u32` varint codec used inside encrypted envelopes

pub mod error;
pub mod provider;
pub mod types;
pub mod varint;

pub use error::{CryptoError, VarintError};
pub use provider::{
    select_backend, BackendKind, BackendPreference, CryptoProvider, NativeCryptoProvider,
    StandardCryptoProvider,
};
pub use types::{Sealed, AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, HMAC_SHA256_LENGTH};
