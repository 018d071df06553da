//! Header verification against both crypto backends.

use std::sync::Arc;

use latch_crypto::{CryptoProvider, NativeCryptoProvider, StandardCryptoProvider};
use latch_webhooks::{SignatureService, VerifyHeaderOptions, WebhookError};
use serde_json::json;

const SECRET: &str = "s";

fn services() -> Vec<SignatureService> {
    let backends: Vec<Arc<dyn CryptoProvider>> = vec![
        Arc::new(NativeCryptoProvider::new()),
        Arc::new(StandardCryptoProvider::new()),
    ];
    backends.into_iter().map(SignatureService::new).collect()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[tokio::test]
async fn fresh_header_verifies() {
    let payload = json!({"a": 1});
    for svc in services() {
        let timestamp = now();
        let signature = svc.compute_signature(timestamp, &payload, SECRET).await.unwrap();
        let header = format!("t={timestamp}, v1={signature}");
        let verified = svc
            .verify_header(VerifyHeaderOptions::new(&payload, &header, SECRET))
            .await
            .unwrap();
        assert!(verified);
    }
}

#[tokio::test]
async fn header_signed_by_one_backend_verifies_on_the_other() {
    let payload = json!({"a": 1});
    let [native, standard]: [SignatureService; 2] = services().try_into().unwrap();
    let header = native.sign_header(&payload, SECRET, now()).await.unwrap();
    assert!(standard
        .verify_header(VerifyHeaderOptions::new(&payload, &header, SECRET))
        .await
        .unwrap());
}

#[tokio::test]
async fn stale_header_fails() {
    let payload = json!({"a": 1});
    for svc in services() {
        let header = svc
            .sign_header(&payload, SECRET, now() - 181_000)
            .await
            .unwrap();
        let err = svc
            .verify_header(
                VerifyHeaderOptions::new(&payload, &header, SECRET).with_tolerance(180_000),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::TimestampOutsideTolerance { .. }));
    }
}

#[tokio::test]
async fn any_corrupted_hex_character_fails() {
    let payload = json!({"a": 1});
    for svc in services() {
        let timestamp = now();
        let signature = svc.compute_signature(timestamp, &payload, SECRET).await.unwrap();
        for i in 0..signature.len() {
            let mut corrupted = signature.clone().into_bytes();
            corrupted[i] = if corrupted[i] == b'0' { b'f' } else { b'0' };
            let corrupted = String::from_utf8(corrupted).unwrap();
            let header = format!("t={timestamp}, v1={corrupted}");
            let err = svc
                .verify_header(VerifyHeaderOptions::new(&payload, &header, SECRET))
                .await
                .unwrap_err();
            assert!(matches!(err, WebhookError::SignatureMismatch), "char {i}");
        }
    }
}

#[tokio::test]
async fn truncated_signature_fails() {
    let payload = json!({"a": 1});
    let services = services();
    let svc = &services[0];
    let timestamp = now();
    let signature = svc.compute_signature(timestamp, &payload, SECRET).await.unwrap();
    let header = format!("t={timestamp}, v1={}", &signature[..32]);
    let err = svc
        .verify_header(VerifyHeaderOptions::new(&payload, &header, SECRET))
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::SignatureMismatch));
}

#[tokio::test]
async fn header_missing_v1_fails() {
    let payload = json!({"a": 1});
    for svc in services() {
        let header = format!("t={}", now());
        let err = svc
            .verify_header(VerifyHeaderOptions::new(&payload, &header, SECRET))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::MalformedHeader));
    }
}

#[tokio::test]
async fn header_with_empty_v1_fails() {
    let payload = json!({"a": 1});
    let header = format!("t={}, v1=", now());
    let err = services()[1]
        .verify_header(VerifyHeaderOptions::new(&payload, &header, SECRET))
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::EmptySignature));
}

#[tokio::test]
async fn modified_payload_fails() {
    let services = services();
    let svc = &services[1];
    let header = svc.sign_header(&json!({"a": 1}), SECRET, now()).await.unwrap();
    let err = svc
        .verify_header(VerifyHeaderOptions::new(&json!({"a": 2}), &header, SECRET))
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::SignatureMismatch));
}
