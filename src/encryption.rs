//! Cipher engine: AES-128-ECB (legacy, v1) and AES-256-GCM (modern, v2).
//!
//! Both directions are stateless free functions. Keys are borrowed for the
//! duration of one call; intermediate plaintext buffers are zeroized before
//! returning.
//!
//! Wire format of a modern message (all base64, STANDARD alphabet):
//! - text: ciphertext without tag
//! - iv:   12 bytes
//! - tag:  16 bytes

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use aes::Aes128;
use aes_gcm::{aead::AeadInPlace, Aes256Gcm, Nonce, Tag};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::errors::CryptoError;
use crate::keys::{derive_legacy_key, derive_modern_key, CipherVersion, LegacyKey, ModernKey};

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

/// AES block size; legacy ciphertext must be a whole number of blocks.
pub const AES_BLOCK_LEN: usize = 16;

/// GCM nonce length (96 bits).
pub const GCM_IV_LEN: usize = 12;

/// GCM authentication tag length (128 bits).
pub const GCM_TAG_LEN: usize = 16;

/// Bytes stripped from both ends of decrypted text, matching PHP `trim`.
const PADDING_CHARS: [char; 6] = [' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Standard alphabet; trailing `=` optional on decode. Output is always padded.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// --- Decryption ---

/// Decrypt a legacy AES-128-ECB payload with PKCS#7 padding.
pub fn decrypt_legacy(ciphertext: &[u8], key: &LegacyKey) -> Result<String, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_LEN != 0 {
        return Err(CryptoError::InvalidCiphertext);
    }

    let mut plaintext = Aes128EcbDec::new(key.as_bytes().into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::InvalidPadding)?;

    let result = finish_plaintext(&plaintext);
    plaintext.zeroize();
    result
}

/// Decrypt a modern AES-256-GCM payload with a detached tag.
///
/// A tag mismatch is reported as [`CryptoError::DecryptionFailed`]; the caller
/// decides whether another cipher path is worth trying.
pub fn decrypt_modern(
    ciphertext: &[u8],
    key: &ModernKey,
    iv: &[u8],
    tag: &[u8],
) -> Result<String, CryptoError> {
    if iv.len() != GCM_IV_LEN {
        return Err(CryptoError::InvalidIv(iv.len()));
    }
    if tag.len() != GCM_TAG_LEN {
        return Err(CryptoError::InvalidTag(tag.len()));
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(iv), b"", &mut buffer, Tag::from_slice(tag))
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let result = finish_plaintext(&buffer);
    buffer.zeroize();
    result
}

/// Strip the ASCII whitespace and NUL bytes older clients left around the payload.
pub fn trim_padding(text: &str) -> &str {
    text.trim_matches(PADDING_CHARS)
}

fn finish_plaintext(raw: &[u8]) -> Result<String, CryptoError> {
    let text = std::str::from_utf8(raw).map_err(|_| CryptoError::InvalidUtf8)?;
    Ok(trim_padding(text).to_owned())
}

// --- Encryption ---

/// Raw output of a modern encryption: ciphertext, nonce and detached tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; GCM_IV_LEN],
    pub tag: [u8; GCM_TAG_LEN],
}

/// Encrypt with AES-256-GCM under a fresh random IV.
pub fn encrypt_modern(plaintext: &[u8], key: &ModernKey) -> Result<SealedPayload, CryptoError> {
    let iv = random_iv()?;
    encrypt_modern_with_iv(plaintext, key, iv)
}

pub(crate) fn encrypt_modern_with_iv(
    plaintext: &[u8],
    key: &ModernKey,
    iv: [u8; GCM_IV_LEN],
) -> Result<SealedPayload, CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut tag_bytes = [0u8; GCM_TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(SealedPayload {
        ciphertext: buffer,
        iv,
        tag: tag_bytes,
    })
}

/// Encrypt with AES-128-ECB and PKCS#7 padding.
///
/// Identical plaintext blocks produce identical ciphertext blocks. Only for
/// serving clients that cannot read v2; never use it for new messages.
pub fn encrypt_legacy(plaintext: &[u8], key: &LegacyKey) -> Vec<u8> {
    Aes128EcbEnc::new(key.as_bytes().into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

fn random_iv() -> Result<[u8; GCM_IV_LEN], CryptoError> {
    let mut iv = [0u8; GCM_IV_LEN];
    getrandom::getrandom(&mut iv).map_err(|_| CryptoError::RandomnessUnavailable)?;
    Ok(iv)
}

// --- Message-level (base64) API ---

/// A v2 message as stored and sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMessage {
    /// base64 ciphertext (tag not included)
    pub text: String,
    /// base64, 12 bytes
    pub iv: String,
    /// base64, 16 bytes
    pub tag: String,
    pub cipher_version: CipherVersion,
}

/// Encrypt a new chat message under the v2 key derived from `timestamp`.
pub fn encrypt_message(plaintext: &str, timestamp: i64) -> Result<EncryptedMessage, CryptoError> {
    if timestamp <= 0 {
        return Err(CryptoError::InvalidTimestamp(timestamp));
    }

    let key = derive_modern_key(timestamp);
    let sealed = encrypt_modern(plaintext.as_bytes(), &key)?;

    Ok(EncryptedMessage {
        text: STANDARD.encode(&sealed.ciphertext),
        iv: STANDARD.encode(sealed.iv),
        tag: STANDARD.encode(sealed.tag),
        cipher_version: CipherVersion::Modern,
    })
}

/// Encrypt for a v1-only client. Returns base64 ciphertext.
pub fn encrypt_legacy_message(plaintext: &str, timestamp: i64) -> Result<String, CryptoError> {
    if timestamp <= 0 {
        return Err(CryptoError::InvalidTimestamp(timestamp));
    }

    let key = derive_legacy_key(timestamp);
    Ok(STANDARD.encode(encrypt_legacy(plaintext.as_bytes(), &key)))
}

/// Decode a base64 field, tolerating line breaks inserted by MIME-style
/// encoders and missing `=` padding.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(LENIENT_STANDARD.decode(compact)?)
}
