use latch_vault::VaultError;
use latch_webhooks::WebhookError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LatchError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

pub type Result<T> = std::result::Result<T, LatchError>;
