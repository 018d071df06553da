//! Cryptographic backends.
//!
//! Every primitive the rest of the workspace needs goes through
//! [`CryptoProvider`]. Two implementations exist and must stay bit-for-bit
//! interoperable:
//!
//! - [`NativeCryptoProvider`]: `ring`, the platform-optimized primitives. Its
//!   HMAC is only exposed through the async entry point.
//! - [`StandardCryptoProvider`]: pure-Rust RustCrypto primitives, available on
//!   every target including `wasm32`.
//!
//! Pick one with [`select_backend`] at construction time and pass the
//! resulting `Arc` to whatever needs it.

mod native;
mod standard;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::types::{Sealed, AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH};

pub use native::NativeCryptoProvider;
pub use standard::StandardCryptoProvider;

/// Which implementation sits behind a [`CryptoProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Native,
    Standard,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => f.write_str("native"),
            BackendKind::Standard => f.write_str("standard"),
        }
    }
}

/// Configured backend choice. `Auto` resolves per target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    #[default]
    Auto,
    Native,
    Standard,
}

impl BackendPreference {
    /// The concrete backend this preference selects on the current target.
    pub fn resolve(self) -> BackendKind {
        match self {
            BackendPreference::Native => BackendKind::Native,
            BackendPreference::Standard => BackendKind::Standard,
            BackendPreference::Auto if native_available() => BackendKind::Native,
            BackendPreference::Auto => BackendKind::Standard,
        }
    }
}

impl FromStr for BackendPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendPreference::Auto),
            "native" => Ok(BackendPreference::Native),
            "standard" => Ok(BackendPreference::Standard),
            other => Err(format!("unknown crypto backend: {other}")),
        }
    }
}

const fn native_available() -> bool {
    !cfg!(target_arch = "wasm32")
}

/// Build the backend for `preference`.
pub fn select_backend(preference: BackendPreference) -> Arc<dyn CryptoProvider> {
    let kind = preference.resolve();
    tracing::debug!(?preference, backend = %kind, "selected crypto backend");
    match kind {
        BackendKind::Native => Arc::new(NativeCryptoProvider::new()),
        BackendKind::Standard => Arc::new(StandardCryptoProvider::new()),
    }
}

/// The capability surface shared by all backends.
///
/// HMAC and comparison are async at the trait boundary because some
/// platforms only expose them asynchronously. AEAD and randomness are
/// synchronous everywhere.
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether [`CryptoProvider::compute_hmac_signature`] is available.
    fn supports_sync_hmac(&self) -> bool;

    /// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
    ///
    /// Backends without synchronous HMAC return
    /// [`CryptoError::UnsupportedOperation`].
    fn compute_hmac_signature(&self, payload: &str, secret: &str) -> Result<String, CryptoError>;

    /// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
    async fn compute_hmac_signature_async(
        &self,
        payload: &str,
        secret: &str,
    ) -> Result<String, CryptoError>;

    /// Timing-safe string equality.
    ///
    /// Unequal lengths return `false` straight away. Otherwise both inputs
    /// are MACed under a fresh random key and the MACs are compared in
    /// constant time, so the position of the first differing byte never
    /// shows up in the timing.
    async fn secure_compare(&self, a: &str, b: &str) -> Result<bool, CryptoError>;

    /// AES-256-GCM seal. Draws a random 12-byte IV when `iv` is `None`.
    fn encrypt(
        &self,
        plaintext: &[u8],
        key: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
    ) -> Result<Sealed, CryptoError>;

    /// AES-256-GCM open. Any authentication failure is
    /// [`CryptoError::DecryptionFailed`] and yields no plaintext.
    fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &[u8],
        iv: &[u8],
        tag: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError>;

    fn random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError>;

    /// RFC 4122 version 4 UUID drawn from this backend's random source.
    fn random_uuid(&self) -> Result<String, CryptoError> {
        let bytes: [u8; 16] = self
            .random_bytes(16)?
            .try_into()
            .map_err(|_| CryptoError::RngFailed("short random read".to_string()))?;
        Ok(uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string())
    }
}

pub(crate) fn check_key(key: &[u8]) -> Result<(), CryptoError> {
    if key.len() != AES_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: AES_KEY_LENGTH,
            got: key.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_iv(iv: &[u8]) -> Result<(), CryptoError> {
    if iv.len() != AES_GCM_IV_LENGTH {
        return Err(CryptoError::InvalidIvLength {
            expected: AES_GCM_IV_LENGTH,
            got: iv.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_tag(tag: &[u8]) -> Result<(), CryptoError> {
    if tag.len() != AES_GCM_TAG_LENGTH {
        return Err(CryptoError::InvalidTagLength {
            expected: AES_GCM_TAG_LENGTH,
            got: tag.len(),
        });
    }
    Ok(())
}
