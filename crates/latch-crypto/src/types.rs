/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// HMAC-SHA256 output length in bytes.
pub const HMAC_SHA256_LENGTH: usize = 32;

/// Output of an AES-256-GCM seal with the tag kept apart from the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub tag: Vec<u8>,
}
