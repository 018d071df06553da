//! Webhook signature verification.
//!
//! Senders sign `"<timestamp>.<json payload>"` with a shared secret and send
//! `t=<timestamp>, v1=<hex hmac>` alongside the body. This crate checks the
//! header age and signature, then hands back the typed event.

mod error;
mod event;
mod signature;

pub use error::WebhookError;
pub use event::WebhookEvent;
pub use signature::{
    SignatureService, VerifyHeaderOptions, DEFAULT_TOLERANCE_MS, SIGNATURE_SCHEME,
};
