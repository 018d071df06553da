//! Envelope encode/decode.
//!
//! Wire format (base64, standard alphabet, padded):
//! `[IV:12][tag:16][varint(len(blob)):1-5][blob][ciphertext]`
//!
//! `blob` is the key service's wrapped form of the data key. It is opaque
//! here and only travels with the ciphertext so the same service can unwrap
//! it again on decrypt.

use std::sync::Arc;

use base64ct::{Base64, Encoding};
use latch_crypto::{varint, CryptoProvider, AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH};
use zeroize::Zeroizing;

use crate::error::{EnvelopeFormatError, VaultError};

/// Fixed-width prefix: IV then tag.
pub const ENVELOPE_HEADER_LENGTH: usize = AES_GCM_IV_LENGTH + AES_GCM_TAG_LENGTH;

/// The parts of an envelope, before base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEnvelope {
    pub iv: Vec<u8>,
    pub tag: Vec<u8>,
    pub key_material_blob: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl DecodedEnvelope {
    /// Serialize to raw envelope bytes.
    ///
    /// IV and tag must have their fixed widths, otherwise the result would
    /// not parse back into the same parts.
    pub fn to_bytes(&self) -> Result<Vec<u8>, VaultError> {
        check_width("iv", &self.iv, AES_GCM_IV_LENGTH)?;
        check_width("tag", &self.tag, AES_GCM_TAG_LENGTH)?;

        let blob_len = u32::try_from(self.key_material_blob.len())
            .map_err(|_| VaultError::BlobTooLarge(self.key_material_blob.len()))?;

        let mut out = Vec::with_capacity(
            self.iv.len()
                + self.tag.len()
                + varint::encoded_len(blob_len)
                + self.key_material_blob.len()
                + self.ciphertext.len(),
        );
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.tag);
        varint::encode_into(blob_len, &mut out);
        out.extend_from_slice(&self.key_material_blob);
        out.extend_from_slice(&self.ciphertext);
        Ok(out)
    }

    /// Parse raw envelope bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeFormatError> {
        if bytes.len() < ENVELOPE_HEADER_LENGTH {
            return Err(EnvelopeFormatError::TooShort {
                len: bytes.len(),
                min: ENVELOPE_HEADER_LENGTH,
            });
        }

        let (iv, rest) = bytes.split_at(AES_GCM_IV_LENGTH);
        let (tag, _) = rest.split_at(AES_GCM_TAG_LENGTH);

        let prefix = varint::decode(bytes, ENVELOPE_HEADER_LENGTH)?;
        let blob_start = prefix.next_index;
        let declared = prefix.value as usize;
        let remaining = bytes.len() - blob_start;
        if declared > remaining {
            return Err(EnvelopeFormatError::BlobOverrun {
                declared,
                remaining,
            });
        }
        let blob_end = blob_start + declared;

        Ok(Self {
            iv: iv.to_vec(),
            tag: tag.to_vec(),
            key_material_blob: bytes[blob_start..blob_end].to_vec(),
            ciphertext: bytes[blob_end..].to_vec(),
        })
    }
}

fn check_width(
    field: &'static str,
    bytes: &[u8],
    expected: usize,
) -> Result<(), EnvelopeFormatError> {
    if bytes.len() != expected {
        return Err(EnvelopeFormatError::InvalidFieldWidth {
            field,
            expected,
            got: bytes.len(),
        });
    }
    Ok(())
}

/// Packs AEAD output and a wrapped data key into one transportable string.
#[derive(Clone)]
pub struct EnvelopeCodec {
    crypto: Arc<dyn CryptoProvider>,
}

impl EnvelopeCodec {
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self { crypto }
    }

    pub fn crypto(&self) -> &Arc<dyn CryptoProvider> {
        &self.crypto
    }

    /// Encrypt `plaintext` under `data_key` and pack the result with
    /// `key_material_blob`.
    ///
    /// Pipeline: encrypt(random IV) → IV ‖ tag ‖ varint(len) ‖ blob ‖ ciphertext → base64
    pub fn encode(
        &self,
        plaintext: &[u8],
        data_key: &[u8],
        key_material_blob: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<String, VaultError> {
        let sealed = self.crypto.encrypt(plaintext, data_key, None, aad)?;
        let envelope = DecodedEnvelope {
            iv: sealed.iv,
            tag: sealed.tag,
            key_material_blob: key_material_blob.to_vec(),
            ciphertext: sealed.ciphertext,
        };
        let bytes = envelope.to_bytes()?;
        tracing::debug!(
            plaintext_len = plaintext.len(),
            blob_len = key_material_blob.len(),
            envelope_len = bytes.len(),
            "encoded envelope"
        );
        Ok(Base64::encode_string(&bytes))
    }

    /// Split an envelope into its parts without decrypting.
    pub fn decode(&self, envelope: &str) -> Result<DecodedEnvelope, VaultError> {
        decode_envelope(envelope)
    }

    /// Decode, unwrap the embedded data key with `unwrap_data_key`, decrypt.
    ///
    /// Pipeline: base64 → split → unwrap(blob) → decrypt
    pub fn decrypt<F, E>(
        &self,
        envelope: &str,
        unwrap_data_key: F,
        aad: Option<&[u8]>,
    ) -> Result<Vec<u8>, VaultError>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>, E>,
        E: std::fmt::Display,
    {
        let decoded = self.decode(envelope)?;
        let data_key = Zeroizing::new(
            unwrap_data_key(&decoded.key_material_blob)
                .map_err(|e| VaultError::KeyUnwrap(e.to_string()))?,
        );
        self.open(&decoded, &data_key, aad)
    }

    /// Decrypt with a data key the caller already holds.
    pub fn decrypt_with_key(
        &self,
        envelope: &str,
        data_key: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<Vec<u8>, VaultError> {
        let decoded = self.decode(envelope)?;
        self.open(&decoded, data_key, aad)
    }

    /// Decrypt an already decoded envelope.
    pub fn open(
        &self,
        decoded: &DecodedEnvelope,
        data_key: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<Vec<u8>, VaultError> {
        self.crypto
            .decrypt(&decoded.ciphertext, data_key, &decoded.iv, &decoded.tag, aad)
            .map_err(|e| {
                tracing::warn!(error = %e, "envelope decryption failed");
                VaultError::Crypto(e)
            })
    }
}

impl std::fmt::Debug for EnvelopeCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCodec")
            .field("backend", &self.crypto.kind())
            .finish()
    }
}

/// Base64-decode and split an envelope.
pub fn decode_envelope(envelope: &str) -> Result<DecodedEnvelope, VaultError> {
    let bytes =
        Base64::decode_vec(envelope.trim()).map_err(|e| VaultError::InvalidBase64(e.to_string()))?;
    Ok(DecodedEnvelope::from_bytes(&bytes)?)
}
