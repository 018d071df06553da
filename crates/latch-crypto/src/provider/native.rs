//! `ring` backend.
//!
//! Mirrors platforms whose HMAC is async-only: the synchronous HMAC entry
//! point reports [`CryptoError::UnsupportedOperation`] instead of falling back.

use async_trait::async_trait;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroize;

use super::{check_iv, check_key, check_tag, BackendKind, CryptoProvider};
use crate::error::CryptoError;
use crate::types::{Sealed, AES_GCM_IV_LENGTH, AES_KEY_LENGTH};

/// AES-256-GCM and HMAC-SHA256 backed by `ring`.
pub struct NativeCryptoProvider {
    rng: SystemRandom,
}

impl NativeCryptoProvider {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    fn sealing_key(key: &[u8]) -> Result<LessSafeKey, CryptoError> {
        check_key(key)?;
        let unbound =
            UnboundKey::new(&AES_256_GCM, key).map_err(|_| CryptoError::InvalidKeyLength {
                expected: AES_KEY_LENGTH,
                got: key.len(),
            })?;
        Ok(LessSafeKey::new(unbound))
    }

    fn nonce(iv: &[u8]) -> Result<Nonce, CryptoError> {
        Nonce::try_assume_unique_for_key(iv).map_err(|_| CryptoError::InvalidIvLength {
            expected: AES_GCM_IV_LENGTH,
            got: iv.len(),
        })
    }
}

impl Default for NativeCryptoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NativeCryptoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeCryptoProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl CryptoProvider for NativeCryptoProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn supports_sync_hmac(&self) -> bool {
        false
    }

    fn compute_hmac_signature(&self, _payload: &str, _secret: &str) -> Result<String, CryptoError> {
        Err(CryptoError::UnsupportedOperation {
            operation: "compute_hmac_signature",
            backend: BackendKind::Native,
        })
    }

    async fn compute_hmac_signature_async(
        &self,
        payload: &str,
        secret: &str,
    ) -> Result<String, CryptoError> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let tag = hmac::sign(&key, payload.as_bytes());
        Ok(hex::encode(tag.as_ref()))
    }

    async fn secure_compare(&self, a: &str, b: &str) -> Result<bool, CryptoError> {
        if a.len() != b.len() {
            return Ok(false);
        }

        let key = hmac::Key::generate(hmac::HMAC_SHA256, &self.rng)
            .map_err(|_| CryptoError::RngFailed("ring SystemRandom".to_string()))?;
        let mac_a = hmac::sign(&key, a.as_bytes());
        // `verify` MACs `b` and compares against `mac_a` in constant time.
        Ok(hmac::verify(&key, b.as_bytes(), mac_a.as_ref()).is_ok())
    }

    fn encrypt(
        &self,
        plaintext: &[u8],
        key: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
    ) -> Result<Sealed, CryptoError> {
        let key = Self::sealing_key(key)?;
        let iv = match iv {
            Some(iv) => {
                check_iv(iv)?;
                iv.to_vec()
            }
            None => self.random_bytes(AES_GCM_IV_LENGTH)?,
        };

        let mut in_out = plaintext.to_vec();
        let tag = key
            .seal_in_place_separate_tag(
                Self::nonce(&iv)?,
                Aad::from(aad.unwrap_or_default()),
                &mut in_out,
            )
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Sealed {
            ciphertext: in_out,
            iv,
            tag: tag.as_ref().to_vec(),
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
        let key = Self::sealing_key(key)?;
        check_iv(iv)?;
        check_tag(tag)?;

        // ring opens `ciphertext || tag` in place.
        let mut in_out = Vec::with_capacity(ciphertext.len() + tag.len());
        in_out.extend_from_slice(ciphertext);
        in_out.extend_from_slice(tag);

        let opened = key
            .open_in_place(
                Self::nonce(iv)?,
                Aad::from(aad.unwrap_or_default()),
                &mut in_out,
            )
            .map(|plaintext| plaintext.len());

        match opened {
            Ok(len) => {
                in_out.truncate(len);
                Ok(in_out)
            }
            Err(_) => {
                in_out.zeroize();
                Err(CryptoError::DecryptionFailed)
            }
        }
    }

    fn random_bytes(&self, length: usize) -> Result<Vec<u8>, CryptoError> {
        let mut buf = vec![0u8; length];
        self.rng
            .fill(&mut buf)
            .map_err(|_| CryptoError::RngFailed("ring SystemRandom".to_string()))?;
        Ok(buf)
    }
}
