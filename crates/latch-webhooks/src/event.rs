//! Verified event construction.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WebhookError;
use crate::signature::{SignatureService, VerifyHeaderOptions};

/// The envelope every inbound event arrives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub event: String,
    pub data: Value,
    pub created_at: String,
}

impl SignatureService {
    /// Verify the header, then deserialize the payload.
    ///
    /// Nothing is deserialized unless verification succeeds.
    pub async fn construct_event<T: DeserializeOwned>(
        &self,
        options: VerifyHeaderOptions<'_, Value>,
    ) -> Result<T, WebhookError> {
        self.verify_header(options).await?;
        Ok(serde_json::from_value(options.payload.clone())?)
    }
}
