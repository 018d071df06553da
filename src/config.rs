//! Runtime configuration.
//!
//! Sources, lowest to highest priority: [`LatchConfig::default`], then JSON
//! via [`LatchConfig::from_json`], or environment variables via
//! [`LatchConfig::from_env`]. Missing fields keep their defaults.

use latch_crypto::BackendPreference;
use latch_webhooks::DEFAULT_TOLERANCE_MS;
use serde::{Deserialize, Serialize};

use crate::error::{LatchError, Result};

/// `auto`, `native` or `standard`.
pub const ENV_CRYPTO_BACKEND: &str = "LATCH_CRYPTO_BACKEND";
/// Webhook tolerance in milliseconds.
pub const ENV_WEBHOOK_TOLERANCE_MS: &str = "LATCH_WEBHOOK_TOLERANCE_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LatchConfig {
    pub backend: BackendPreference,
    pub webhook_tolerance_ms: u64,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            webhook_tolerance_ms: DEFAULT_TOLERANCE_MS,
        }
    }
}

impl LatchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`LatchConfig::from_env`], with variables resolved by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CRYPTO_BACKEND) {
            config.backend = raw
                .parse()
                .map_err(|e| LatchError::Config(format!("{ENV_CRYPTO_BACKEND}: {e}")))?;
        }

        if let Some(raw) = lookup(ENV_WEBHOOK_TOLERANCE_MS) {
            config.webhook_tolerance_ms = raw.trim().parse().map_err(|_| {
                LatchError::Config(format!(
                    "{ENV_WEBHOOK_TOLERANCE_MS}: expected milliseconds, got {raw:?}"
                ))
            })?;
        }

        Ok(config)
    }
}
