//! Timestamped HMAC signature headers.
//!
//! Header format: `t=<unix ms>, v1=<hex HMAC-SHA256>`
//! Signed string: `<timestamp>.<JSON payload>`

use std::sync::Arc;

use latch_crypto::CryptoProvider;
use serde::Serialize;

use crate::error::WebhookError;

/// Maximum accepted age of a signed payload, in milliseconds (3 minutes).
pub const DEFAULT_TOLERANCE_MS: u64 = 180_000;

/// The only signature scheme emitted and accepted.
pub const SIGNATURE_SCHEME: &str = "v1";

const TIMESTAMP_KEY: &str = "t";

/// Inputs to [`SignatureService::verify_header`].
#[derive(Debug)]
pub struct VerifyHeaderOptions<'a, P: ?Sized> {
    pub payload: &'a P,
    pub sig_header: &'a str,
    pub secret: &'a str,
    pub tolerance_ms: u64,
}

// Only references inside, so copyable whatever `P` is.
impl<P: ?Sized> Clone for VerifyHeaderOptions<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized> Copy for VerifyHeaderOptions<'_, P> {}

impl<'a, P: ?Sized> VerifyHeaderOptions<'a, P> {
    /// Options with the default 180 second tolerance.
    pub fn new(payload: &'a P, sig_header: &'a str, secret: &'a str) -> Self {
        Self {
            payload,
            sig_header,
            secret,
            tolerance_ms: DEFAULT_TOLERANCE_MS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_ms: u64) -> Self {
        self.tolerance_ms = tolerance_ms;
        self
    }
}

/// Computes and verifies webhook signature headers.
#[derive(Clone)]
pub struct SignatureService {
    crypto: Arc<dyn CryptoProvider>,
}

impl SignatureService {
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self { crypto }
    }

    pub fn crypto(&self) -> &Arc<dyn CryptoProvider> {
        &self.crypto
    }

    /// Hex HMAC-SHA256 over `"<timestamp>.<json(payload)>"`.
    pub async fn compute_signature<P: Serialize + ?Sized>(
        &self,
        timestamp: i64,
        payload: &P,
        secret: &str,
    ) -> Result<String, WebhookError> {
        let signed = format!("{}.{}", timestamp, serde_json::to_string(payload)?);
        Ok(self
            .crypto
            .compute_hmac_signature_async(&signed, secret)
            .await?)
    }

    /// Build a complete header for `payload` signed at `timestamp`.
    pub async fn sign_header<P: Serialize + ?Sized>(
        &self,
        payload: &P,
        secret: &str,
        timestamp: i64,
    ) -> Result<String, WebhookError> {
        let signature = self.compute_signature(timestamp, payload, secret).await?;
        Ok(format!(
            "{TIMESTAMP_KEY}={timestamp}, {SIGNATURE_SCHEME}={signature}"
        ))
    }

    /// Split a header into its raw timestamp and signature hash.
    pub fn get_timestamp_and_signature_hash(
        &self,
        sig_header: &str,
    ) -> Result<(String, String), WebhookError> {
        parse_header(sig_header)
    }

    /// Verify `options.sig_header` against the current time.
    pub async fn verify_header<P: Serialize + ?Sized>(
        &self,
        options: VerifyHeaderOptions<'_, P>,
    ) -> Result<bool, WebhookError> {
        self.verify_header_at(options, now_ms()).await
    }

    /// Verify `options.sig_header` as if the current time were `now_ms`.
    ///
    /// Only stale timestamps are rejected. A timestamp ahead of `now_ms` is
    /// accepted.
    pub async fn verify_header_at<P: Serialize + ?Sized>(
        &self,
        options: VerifyHeaderOptions<'_, P>,
        now_ms: i64,
    ) -> Result<bool, WebhookError> {
        let result = self.check_header(&options, now_ms).await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "webhook signature verification failed");
        }
        result
    }

    async fn check_header<P: Serialize + ?Sized>(
        &self,
        options: &VerifyHeaderOptions<'_, P>,
        now_ms: i64,
    ) -> Result<bool, WebhookError> {
        let (raw_timestamp, signature_hash) = parse_header(options.sig_header)?;

        let timestamp: i64 = raw_timestamp
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp(raw_timestamp.clone()))?;

        let tolerance = i64::try_from(options.tolerance_ms).unwrap_or(i64::MAX);
        if timestamp < now_ms.saturating_sub(tolerance) {
            return Err(WebhookError::TimestampOutsideTolerance {
                timestamp,
                tolerance_ms: options.tolerance_ms,
            });
        }

        let expected = self
            .compute_signature(timestamp, options.payload, options.secret)
            .await?;
        if !self.crypto.secure_compare(&expected, &signature_hash).await? {
            return Err(WebhookError::SignatureMismatch);
        }

        Ok(true)
    }
}

impl std::fmt::Debug for SignatureService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureService")
            .field("backend", &self.crypto.kind())
            .finish()
    }
}

fn parse_header(sig_header: &str) -> Result<(String, String), WebhookError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in sig_header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key.trim() {
            TIMESTAMP_KEY if timestamp.is_none() => timestamp = Some(value.trim()),
            SIGNATURE_SCHEME if signature.is_none() => signature = Some(value.trim()),
            _ => {}
        }
    }

    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(WebhookError::MalformedHeader);
    };
    if signature.is_empty() {
        return Err(WebhookError::EmptySignature);
    }

    Ok((timestamp.to_string(), signature.to_string()))
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
