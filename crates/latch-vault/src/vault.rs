use std::sync::Arc;

use crate::envelope::EnvelopeCodec;
use crate::error::VaultError;
use crate::key_service::{KeyContext, KeyService};

/// Encrypts values under fresh data keys from a [`KeyService`].
///
/// Each `encrypt` asks for a new data key. Nothing is cached between calls.
#[derive(Clone)]
pub struct Vault {
    codec: EnvelopeCodec,
    keys: Arc<dyn KeyService>,
}

impl Vault {
    pub fn new(codec: EnvelopeCodec, keys: Arc<dyn KeyService>) -> Self {
        Self { codec, keys }
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    /// Issue a data key for `context` and seal `plaintext` into an envelope.
    pub async fn encrypt(
        &self,
        plaintext: &[u8],
        context: &KeyContext,
        aad: Option<&[u8]>,
    ) -> Result<String, VaultError> {
        let data_key = self.keys.issue_data_key(context).await.map_err(|e| {
            tracing::warn!(
                error = %e,
                retryable = e.is_retryable(),
                "data key issue failed"
            );
            VaultError::KeyService(e)
        })?;
        self.codec
            .encode(plaintext, &data_key.key, &data_key.key_material_blob, aad)
    }

    /// Open an envelope produced by [`Vault::encrypt`].
    pub async fn decrypt(&self, envelope: &str, aad: Option<&[u8]>) -> Result<Vec<u8>, VaultError> {
        let decoded = self.codec.decode(envelope)?;
        let data_key = self
            .keys
            .unwrap_data_key(&decoded.key_material_blob)
            .await
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    retryable = e.is_retryable(),
                    "data key unwrap failed"
                );
                VaultError::KeyService(e)
            })?;
        self.codec.open(&decoded, &data_key, aad)
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").field("codec", &self.codec).finish()
    }
}
