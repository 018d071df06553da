//! Cross-backend interoperability: the `ring` and RustCrypto backends must
//! agree byte for byte.

use std::sync::Arc;

use latch_crypto::{
    CryptoError, CryptoProvider, NativeCryptoProvider, Sealed, StandardCryptoProvider,
};
use proptest::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

fn native() -> Arc<dyn CryptoProvider> {
    Arc::new(NativeCryptoProvider::new())
}

fn standard() -> Arc<dyn CryptoProvider> {
    Arc::new(StandardCryptoProvider::new())
}

fn pairs() -> Vec<(Arc<dyn CryptoProvider>, Arc<dyn CryptoProvider>)> {
    vec![(native(), standard()), (standard(), native())]
}

fn random(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    getrandom::getrandom(&mut buf).unwrap();
    buf
}

fn open(
    provider: &dyn CryptoProvider,
    sealed: &Sealed,
    key: &[u8],
    aad: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    provider.decrypt(&sealed.ciphertext, key, &sealed.iv, &sealed.tag, aad)
}

// ============================================================================
// HMAC
// ============================================================================

#[tokio::test]
async fn hmac_is_identical_across_backends() {
    let cases = [
        ("", ""),
        ("payload", "secret"),
        (r#"1700000000000.{"a":1}"#, "s"),
        ("unicode ✓ payload", "ключ"),
    ];
    for (payload, secret) in cases {
        let a = native()
            .compute_hmac_signature_async(payload, secret)
            .await
            .unwrap();
        let b = standard()
            .compute_hmac_signature_async(payload, secret)
            .await
            .unwrap();
        assert_eq!(a, b, "payload {payload:?}");
        assert_eq!(a.len(), 64);
    }
}

#[tokio::test]
async fn hmac_with_long_secret_is_identical() {
    // Secrets longer than the SHA-256 block size are hashed first.
    let secret = "k".repeat(200);
    let a = native()
        .compute_hmac_signature_async("body", &secret)
        .await
        .unwrap();
    let b = standard()
        .compute_hmac_signature_async("body", &secret)
        .await
        .unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn sync_hmac_capability_differs() {
    assert!(!native().supports_sync_hmac());
    assert!(standard().supports_sync_hmac());
    let sync = standard().compute_hmac_signature("p", "s").unwrap();
    let via_native = native().compute_hmac_signature_async("p", "s").await.unwrap();
    assert_eq!(sync, via_native);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn hmac_agrees_for_arbitrary_inputs(
        payload in any::<String>(),
        secret in any::<String>()
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (a, b) = runtime.block_on(async {
            let a = native().compute_hmac_signature_async(&payload, &secret).await;
            let b = standard().compute_hmac_signature_async(&payload, &secret).await;
            (a.unwrap(), b.unwrap())
        });
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(
            standard().compute_hmac_signature(&payload, &secret).unwrap(),
            a
        );
    }
}

// ============================================================================
// AEAD
// ============================================================================

#[test]
fn identical_inputs_give_identical_ciphertext() {
    let key = random(32);
    let iv = random(12);
    let aad = b"context".as_slice();
    let a = native()
        .encrypt(b"same plaintext", &key, Some(iv.as_slice()), Some(aad))
        .unwrap();
    let b = standard()
        .encrypt(b"same plaintext", &key, Some(iv.as_slice()), Some(aad))
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn encrypt_with_one_decrypt_with_other() {
    for (sealer, opener) in pairs() {
        for len in [0usize, 1, 15, 16, 17, 4096] {
            let key = random(32);
            let plaintext = random(len);
            let sealed = sealer.encrypt(&plaintext, &key, None, None).unwrap();
            assert_eq!(open(opener.as_ref(), &sealed, &key, None).unwrap(), plaintext);
        }
    }
}

#[test]
fn interop_with_aad() {
    for (sealer, opener) in pairs() {
        let key = random(32);
        let aad = b"org_01H".as_slice();
        let sealed = sealer.encrypt(b"secret", &key, None, Some(aad)).unwrap();
        assert_eq!(
            open(opener.as_ref(), &sealed, &key, Some(aad)).unwrap(),
            b"secret"
        );
        assert!(open(opener.as_ref(), &sealed, &key, None).is_err());
    }
}

// ============================================================================
// Tamper detection
// ============================================================================

#[test]
fn any_flipped_byte_fails_on_both_backends() {
    let key = random(32);
    let aad = b"additional data".to_vec();
    let sealed = standard()
        .encrypt(b"tamper evident payload", &key, None, Some(aad.as_slice()))
        .unwrap();

    for provider in [native(), standard()] {
        for i in 0..sealed.ciphertext.len() {
            let mut tampered = sealed.clone();
            tampered.ciphertext[i] ^= 0x01;
            let err = open(provider.as_ref(), &tampered, &key, Some(aad.as_slice())).unwrap_err();
            assert!(matches!(err, CryptoError::DecryptionFailed), "ciphertext byte {i}");
        }
        for i in 0..sealed.tag.len() {
            let mut tampered = sealed.clone();
            tampered.tag[i] ^= 0x80;
            let err = open(provider.as_ref(), &tampered, &key, Some(aad.as_slice())).unwrap_err();
            assert!(matches!(err, CryptoError::DecryptionFailed), "tag byte {i}");
        }
        for i in 0..aad.len() {
            let mut bad_aad = aad.clone();
            bad_aad[i] ^= 0xff;
            let err = open(provider.as_ref(), &sealed, &key, Some(bad_aad.as_slice())).unwrap_err();
            assert!(matches!(err, CryptoError::DecryptionFailed), "aad byte {i}");
        }
    }
}

#[test]
fn wrong_key_and_iv_fail_the_same_way() {
    let key = random(32);
    let sealed = native().encrypt(b"secret", &key, None, None).unwrap();
    for provider in [native(), standard()] {
        let wrong_key = open(provider.as_ref(), &sealed, &random(32), None).unwrap_err();
        let mut moved = sealed.clone();
        moved.iv = random(12);
        let wrong_iv = open(provider.as_ref(), &moved, &key, None).unwrap_err();
        assert_eq!(wrong_key.to_string(), wrong_iv.to_string());
    }
}

// ============================================================================
// secure_compare
// ============================================================================

#[tokio::test]
async fn secure_compare_agrees_across_backends() {
    let sig = standard().compute_hmac_signature("p", "s").unwrap();
    let mut corrupted = sig.clone().into_bytes();
    corrupted[10] = if corrupted[10] == b'0' { b'1' } else { b'0' };
    let corrupted = String::from_utf8(corrupted).unwrap();

    for provider in [native(), standard()] {
        assert!(provider.secure_compare(&sig, &sig).await.unwrap());
        assert!(!provider.secure_compare(&sig, &corrupted).await.unwrap());
        assert!(!provider.secure_compare(&sig, &sig[..63]).await.unwrap());
    }
}
