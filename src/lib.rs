//! latch: webhook signature verification and client-side envelope
//! encryption over one pluggable crypto backend.
//!
//! ```ignore
//! let latch = Latch::from_config(&LatchConfig::from_env()?);
//! let event: WebhookEvent = latch.construct_event(&payload, &header, &secret).await?;
//! let vault = latch.vault(key_service);
//! let envelope = vault.encrypt(b"secret", &context, None).await?;
//! ```

pub mod config;
pub mod error;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use config::LatchConfig;
pub use error::{LatchError, Result};
pub use latch_crypto::{
    select_backend, BackendKind, BackendPreference, CryptoError, CryptoProvider,
    NativeCryptoProvider, StandardCryptoProvider,
};
pub use latch_vault::{
    DecodedEnvelope, EnvelopeCodec, KeyContext, KeyService, KeyServiceError, Vault, VaultError,
};
pub use latch_webhooks::{SignatureService, VerifyHeaderOptions, WebhookError, WebhookEvent};

/// One backend, shared by the signature service and the envelope codec.
#[derive(Clone)]
pub struct Latch {
    crypto: Arc<dyn CryptoProvider>,
    signatures: SignatureService,
    envelopes: EnvelopeCodec,
    webhook_tolerance_ms: u64,
}

impl Latch {
    /// Select the configured backend once and wire it into every service.
    pub fn from_config(config: &LatchConfig) -> Self {
        let crypto = select_backend(config.backend);
        tracing::debug!(
            backend = %crypto.kind(),
            webhook_tolerance_ms = config.webhook_tolerance_ms,
            "latch initialized"
        );
        Self {
            signatures: SignatureService::new(crypto.clone()),
            envelopes: EnvelopeCodec::new(crypto.clone()),
            crypto,
            webhook_tolerance_ms: config.webhook_tolerance_ms,
        }
    }

    pub fn crypto(&self) -> &Arc<dyn CryptoProvider> {
        &self.crypto
    }

    pub fn backend(&self) -> BackendKind {
        self.crypto.kind()
    }

    pub fn signatures(&self) -> &SignatureService {
        &self.signatures
    }

    pub fn envelopes(&self) -> &EnvelopeCodec {
        &self.envelopes
    }

    /// A vault that draws data keys from `keys`.
    pub fn vault(&self, keys: Arc<dyn KeyService>) -> Vault {
        Vault::new(self.envelopes.clone(), keys)
    }

    /// Verify a webhook header with the configured tolerance.
    pub async fn verify_webhook<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        sig_header: &str,
        secret: &str,
    ) -> Result<bool> {
        let options = VerifyHeaderOptions::new(payload, sig_header, secret)
            .with_tolerance(self.webhook_tolerance_ms);
        Ok(self.signatures.verify_header(options).await?)
    }

    /// Verify a webhook header with the configured tolerance, then
    /// deserialize the payload.
    pub async fn construct_event<T: DeserializeOwned>(
        &self,
        payload: &Value,
        sig_header: &str,
        secret: &str,
    ) -> Result<T> {
        let options = VerifyHeaderOptions::new(payload, sig_header, secret)
            .with_tolerance(self.webhook_tolerance_ms);
        Ok(self.signatures.construct_event(options).await?)
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::from_config(&LatchConfig::default())
    }
}

impl std::fmt::Debug for Latch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Latch")
            .field("backend", &self.crypto.kind())
            .field("webhook_tolerance_ms", &self.webhook_tolerance_ms)
            .finish()
    }
}

/// Install a `RUST_LOG`-driven fmt subscriber writing to stderr.
/// Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}
