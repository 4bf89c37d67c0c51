//! Error types for message-cipher-core operations.
//!
//! `CryptoError` describes why a single cipher path failed. Those never reach
//! callers of [`crate::resolver::resolve`] directly: the resolver swallows them
//! per attempt and reports one `ResolveError` once every path is exhausted.

use thiserror::Error;

use crate::keys::CipherVersion;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid ciphertext: empty or not a multiple of the 16-byte block size")]
    InvalidCiphertext,

    #[error("Decryption failed: invalid PKCS#7 padding")]
    InvalidPadding,

    #[error("Decryption failed: authentication tag mismatch")]
    DecryptionFailed,

    #[error("Invalid IV length: expected 12 bytes, got {0}")]
    InvalidIv(usize),

    #[error("Invalid auth tag length: expected 16 bytes, got {0}")]
    InvalidTag(usize),

    #[error("Decrypted payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Decrypted payload is empty")]
    EmptyPlaintext,

    #[error("Invalid base64 encoding: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("System randomness unavailable")]
    RandomnessUnavailable,

    #[error("Invalid timestamp {0}: must be a positive Unix time")]
    InvalidTimestamp(i64),

    #[error("Unsupported cipher version: {0}")]
    UnsupportedVersion(i64),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Outcome of resolving a message record when no plaintext could be produced.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Message has no ciphertext")]
    NoCiphertext,

    #[error("Message timestamp is missing or not positive")]
    InvalidTimestamp,

    #[error("Message is undecryptable (attempted: {attempted:?})")]
    Undecryptable { attempted: Vec<CipherVersion> },

    #[error("Re-encryption failed: {0}")]
    ReencryptionFailed(#[from] CryptoError),
}
