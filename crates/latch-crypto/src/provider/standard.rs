//! RustCrypto backend.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use super::{check_iv, check_key, check_tag, BackendKind, CryptoProvider};
use crate::error::CryptoError;
use crate::types::{Sealed, AES_GCM_IV_LENGTH, AES_KEY_LENGTH, HMAC_SHA256_LENGTH};

type HmacSha256 = Hmac<Sha256>;

/// Pure-Rust AES-256-GCM and HMAC-SHA256. Supports synchronous HMAC.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCryptoProvider;

impl StandardCryptoProvider {
    pub fn new() -> Self {
        Self
    }

    fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
            .map_err(|e| CryptoError::Hmac(e.to_string()))?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::getrandom(buf).map_err(|e| CryptoError::RngFailed(e.to_string()))
    }

    fn cipher(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
        check_key(key)?;
        Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
            expected: AES_KEY_LENGTH,
            got: key.len(),
        })
    }
}

#[async_trait]
impl CryptoProvider for StandardCryptoProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::Standard
    }

    fn supports_sync_hmac(&self) -> bool {
        true
    }

    fn compute_hmac_signature(&self, payload: &str, secret: &str) -> Result<String, CryptoError> {
        let mac = Self::hmac_sha256(secret.as_bytes(), payload.as_bytes())?;
        Ok(hex::encode(mac))
    }

    async fn compute_hmac_signature_async(
        &self,
        payload: &str,
        secret: &str,
    ) -> Result<String, CryptoError> {
        self.compute_hmac_signature(payload, secret)
    }

    async fn secure_compare(&self, a: &str, b: &str) -> Result<bool, CryptoError> {
        if a.len() != b.len() {
            return Ok(false);
        }

        let mut key = Zeroizing::new([0u8; HMAC_SHA256_LENGTH]);
        Self::fill_random(&mut key[..])?;
        let mac_a = Self::hmac_sha256(&key[..], a.as_bytes())?;
        let mac_b = Self::hmac_sha256(&key[..], b.as_bytes())?;
        Ok(mac_a.ct_eq(&mac_b).into())
    }

    fn encrypt(
        &self,
        plaintext: &[u8],
        key: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
    ) -> Result<Sealed, CryptoError> {
        let cipher = Self::cipher(key)?;
        let iv = match iv {
            Some(iv) => {
                check_iv(iv)?;
                iv.to_vec()
            }
            None => self.random_bytes(AES_GCM_IV_LENGTH)?,
        };

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), aad.unwrap_or_default(), &mut buffer)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Sealed {
            ciphertext: buffer,
            iv,
            tag: tag.to_vec(),
        })
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &[u8],
        iv: &[u8],
        tag: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = Self::cipher(key)?;
        check_iv(iv)?;
        check_tag(tag)?;

        let mut buffer = ciphertext.to_vec();
        match cipher.decrypt_in_place_detached(
            Nonce::from_slice(iv),
            aad.unwrap_or_default(),
            &mut buffer,
            Tag::from_slice(tag),
        ) {
            Ok(()) => Ok(buffer),
            Err(_) => {
                buffer.zeroize();
                Err(CryptoError::DecryptionFailed)
            }
        }
    }

    fn random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError> {
        let mut buf = vec![0u8; length];
        Self::fill_random(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        getrandom::getrandom(&mut key).unwrap();
        key
    }

    #[test]
    fn hmac_known_vector() {
        // RFC 4231 test case 2.
        let sig = StandardCryptoProvider::new()
            .compute_hmac_signature("what do ya want for nothing?", "Jefe")
            .unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[tokio::test]
    async fn async_hmac_matches_sync() {
        let provider = StandardCryptoProvider::new();
        let sync = provider.compute_hmac_signature("payload", "secret").unwrap();
        let async_sig = provider
            .compute_hmac_signature_async("payload", "secret")
            .await
            .unwrap();
        assert_eq!(sync, async_sig);
    }

    #[tokio::test]
    async fn secure_compare() {
        let provider = StandardCryptoProvider::new();
        assert!(provider.secure_compare("abc", "abc").await.unwrap());
        assert!(!provider.secure_compare("abc", "abd").await.unwrap());
        assert!(!provider.secure_compare("abc", "abcd").await.unwrap());
        assert!(provider.secure_compare("", "").await.unwrap());
    }

    #[test]
    fn round_trip() {
        let provider = StandardCryptoProvider::new();
        let key = random_key();
        let sealed = provider.encrypt(b"Hello, World!", &key, None, None).unwrap();
        assert_eq!(sealed.iv.len(), 12);
        assert_eq!(sealed.tag.len(), 16);
        assert_eq!(sealed.ciphertext.len(), 13);
        let plaintext = provider
            .decrypt(&sealed.ciphertext, &key, &sealed.iv, &sealed.tag, None)
            .unwrap();
        assert_eq!(plaintext, b"Hello, World!");
    }

    #[test]
    fn random_iv_each_time() {
        let provider = StandardCryptoProvider::new();
        let key = random_key();
        let a = provider.encrypt(b"test", &key, None, None).unwrap();
        let b = provider.encrypt(b"test", &key, None, None).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn rejects_bad_lengths() {
        let provider = StandardCryptoProvider::new();
        let key = random_key();
        assert!(matches!(
            provider.encrypt(b"x", &key[..16], None, None),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
        assert!(matches!(
            provider.encrypt(b"x", &key, Some(&[0u8; 32][..]), None),
            Err(CryptoError::InvalidIvLength { .. })
        ));
        assert!(matches!(
            provider.decrypt(b"x", &key, &[0u8; 12], &[0u8; 8], None),
            Err(CryptoError::InvalidTagLength { .. })
        ));
    }

    #[test]
    fn wrong_key_fails() {
        let provider = StandardCryptoProvider::new();
        let sealed = provider.encrypt(b"secret", &random_key(), None, None).unwrap();
        let err = provider
            .decrypt(&sealed.ciphertext, &random_key(), &sealed.iv, &sealed.tag, None)
            .unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn empty_aad_matches_absent_aad() {
        let provider = StandardCryptoProvider::new();
        let key = random_key();
        let sealed = provider.encrypt(b"data", &key, None, None).unwrap();
        let plaintext = provider
            .decrypt(&sealed.ciphertext, &key, &sealed.iv, &sealed.tag, Some(&b""[..]))
            .unwrap();
        assert_eq!(plaintext, b"data");
    }
}
