//! Symmetric encryption for `@ENC` variables.
//!
//! Values are encrypted from their display text with AES-128 in CBC mode
//! (PKCS#7 padding) and stored as standard Base64.  The interpreter only sees
//! the [`Cipher`] trait, so hosts can plug in their own scheme.
//!
//! The default key and IV are fixed constants compiled into the binary.  They
//! provide obfuscation, not confidentiality: anyone with the binary can
//! decrypt.  Set `cipher_key` / `cipher_iv` in the config file to use a
//! private pair.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Key used when no key is configured.
pub const LEGACY_KEY: &[u8; 16] = b"0123456789abcdef";
/// IV used when no IV is configured.
pub const LEGACY_IV: &[u8; 16] = b"abcdef9876543210";

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("ciphertext is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("bad padding or ciphertext length")]
    Padding,
    #[error("decrypted bytes are not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("{what} must be exactly 16 bytes, got {len}")]
    KeyLength { what: &'static str, len: usize },
}

/// Reversible text transformation used for encrypted variables.
pub trait Cipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

/// AES-128-CBC with PKCS#7 padding, Base64 on the outside.
#[derive(Clone)]
pub struct AesCbcCipher {
    key: [u8; 16],
    iv: [u8; 16],
}

impl AesCbcCipher {
    pub fn new(key: [u8; 16], iv: [u8; 16]) -> Self {
        AesCbcCipher { key, iv }
    }

    /// Build from text key material, as read from a config file.
    pub fn from_text(key: &str, iv: &str) -> Result<Self, CipherError> {
        Ok(AesCbcCipher::new(
            to_block(key, "cipher key")?,
            to_block(iv, "cipher IV")?,
        ))
    }
}

impl Default for AesCbcCipher {
    fn default() -> Self {
        AesCbcCipher::new(*LEGACY_KEY, *LEGACY_IV)
    }
}

// Key material is never printed.
impl std::fmt::Debug for AesCbcCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCbcCipher").finish_non_exhaustive()
    }
}

impl Cipher for AesCbcCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let ct = Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Ok(STANDARD.encode(ct))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let ct = STANDARD.decode(ciphertext.trim())?;
        let pt = Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ct)
            .map_err(|_| CipherError::Padding)?;
        Ok(String::from_utf8(pt)?)
    }
}

fn to_block(text: &str, what: &'static str) -> Result<[u8; 16], CipherError> {
    text.as_bytes()
        .try_into()
        .map_err(|_| CipherError::KeyLength { what, len: text.len() })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
