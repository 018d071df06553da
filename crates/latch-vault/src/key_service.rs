//! Key service boundary: where data keys come from.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use zeroize::Zeroizing;

/// Caller-defined context sent with every data key request.
pub type KeyContext = BTreeMap<String, String>;

/// A freshly issued data key and its wrapped form.
///
/// The plaintext key is only held for the duration of one encrypt call.
pub struct DataKey {
    pub key: Zeroizing<Vec<u8>>,
    /// Opaque to this crate; only the issuing service can unwrap it.
    pub key_material_blob: Vec<u8>,
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey")
            .field("key", &"[REDACTED]")
            .field("key_material_blob_len", &self.key_material_blob.len())
            .finish()
    }
}

/// Issues and unwraps data keys.
///
/// Implementations own all network I/O and any retry policy.
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Issue a new data key for `context`.
    async fn issue_data_key(&self, context: &KeyContext) -> Result<DataKey, KeyServiceError>;

    /// Recover the plaintext data key from a blob this service issued.
    async fn unwrap_data_key(&self, key_material_blob: &[u8])
        -> Result<Zeroizing<Vec<u8>>, KeyServiceError>;
}

/// Key service failure. The variant decides whether a retry can help.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyServiceError {
    /// Service unreachable, timed out or failed internally.
    #[error("Key service unavailable: {0}")]
    Unavailable(String),

    /// The request or blob was refused: unknown blob, revoked key, bad context.
    #[error("Key service rejected the request: {0}")]
    Rejected(String),
}

impl KeyServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, KeyServiceError::Unavailable(_))
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use in_memory::InMemoryKeyService;

#[cfg(any(test, feature = "test-util"))]
mod in_memory {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use latch_crypto::{CryptoProvider, AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH};
    use zeroize::Zeroizing;

    use super::{DataKey, KeyContext, KeyService, KeyServiceError};

    /// Local stand-in for a remote key service.
    ///
    /// Data keys are wrapped under a random master key as
    /// `IV ‖ tag ‖ ciphertext`, so blobs are opaque and only this instance
    /// can unwrap them.
    pub struct InMemoryKeyService {
        crypto: Arc<dyn CryptoProvider>,
        master_key: Zeroizing<Vec<u8>>,
        issued: AtomicUsize,
        unwrapped: AtomicUsize,
        unavailable: AtomicBool,
        contexts: Mutex<Vec<KeyContext>>,
    }

    impl InMemoryKeyService {
        pub fn new(crypto: Arc<dyn CryptoProvider>) -> Result<Self, KeyServiceError> {
            let master_key = Zeroizing::new(
                crypto
                    .random_bytes(AES_KEY_LENGTH)
                    .map_err(|e| KeyServiceError::Unavailable(e.to_string()))?,
            );
            Ok(Self {
                crypto,
                master_key,
                issued: AtomicUsize::new(0),
                unwrapped: AtomicUsize::new(0),
                unavailable: AtomicBool::new(false),
                contexts: Mutex::new(Vec::new()),
            })
        }

        /// Number of data keys issued so far.
        pub fn issued_count(&self) -> usize {
            self.issued.load(Ordering::SeqCst)
        }

        /// Number of successful unwraps so far.
        pub fn unwrapped_count(&self) -> usize {
            self.unwrapped.load(Ordering::SeqCst)
        }

        /// Contexts passed to `issue_data_key`, in call order.
        pub fn contexts(&self) -> Vec<KeyContext> {
            self.contexts
                .lock()
                .map(|c| c.clone())
                .unwrap_or_default()
        }

        /// Make every call fail with a retryable error until reset.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        fn check_available(&self) -> Result<(), KeyServiceError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(KeyServiceError::Unavailable(
                    "key service unavailable".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl KeyService for InMemoryKeyService {
        async fn issue_data_key(&self, context: &KeyContext) -> Result<DataKey, KeyServiceError> {
            self.check_available()?;

            let key = Zeroizing::new(
                self.crypto
                    .random_bytes(AES_KEY_LENGTH)
                    .map_err(|e| KeyServiceError::Unavailable(e.to_string()))?,
            );
            let sealed = self
                .crypto
                .encrypt(&key, &self.master_key, None, None)
                .map_err(|e| KeyServiceError::Unavailable(e.to_string()))?;

            let mut blob = sealed.iv;
            blob.extend_from_slice(&sealed.tag);
            blob.extend_from_slice(&sealed.ciphertext);

            if let Ok(mut contexts) = self.contexts.lock() {
                contexts.push(context.clone());
            }
            self.issued.fetch_add(1, Ordering::SeqCst);

            Ok(DataKey {
                key,
                key_material_blob: blob,
            })
        }

        async fn unwrap_data_key(
            &self,
            key_material_blob: &[u8],
        ) -> Result<Zeroizing<Vec<u8>>, KeyServiceError> {
            self.check_available()?;

            if key_material_blob.len() < AES_GCM_IV_LENGTH + AES_GCM_TAG_LENGTH {
                return Err(rejected("key blob too short"));
            }
            let (iv, rest) = key_material_blob.split_at(AES_GCM_IV_LENGTH);
            let (tag, ciphertext) = rest.split_at(AES_GCM_TAG_LENGTH);

            let key = self
                .crypto
                .decrypt(ciphertext, &self.master_key, iv, tag, None)
                .map_err(|_| rejected("key blob was not issued by this service"))?;
            self.unwrapped.fetch_add(1, Ordering::SeqCst);
            Ok(Zeroizing::new(key))
        }
    }

    fn rejected(message: &str) -> KeyServiceError {
        KeyServiceError::Rejected(message.to_string())
    }
}
