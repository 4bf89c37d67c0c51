//! Version resolution: pick the cipher path(s) for a stored message and run
//! them in order until one yields plaintext.
//!
//! Older records carry no `cipher_version`, so intent is inferred from the
//! presence of GCM fields. The legacy path is always tried last so messages
//! written before the GCM upgrade stay readable.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::encryption::{decode_base64, decrypt_legacy, decrypt_modern, EncryptedMessage};
use crate::errors::{CryptoError, ResolveError};
use crate::keys::{derive_legacy_key, derive_modern_key, CipherVersion};

/// A message record as received from storage or the API.
///
/// Alternate wire names (`msg_iv`, `auth_tag`) and string-typed integers are
/// normalized during deserialization; everything downstream reads the
/// accessors below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireRecord")]
pub struct MessageCipherInput {
    /// base64 ciphertext
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// base64 ciphertext under the legacy-labeled field; wins over `text`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_ecb: Option<String>,
    /// Unix seconds; the key-derivation seed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher_version: Option<i64>,
    /// base64 GCM nonce
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    /// base64 GCM tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Deserialize)]
struct WireRecord {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    text_ecb: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    cipher_version: Option<i64>,
    #[serde(default)]
    iv: Option<String>,
    #[serde(default)]
    msg_iv: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    auth_tag: Option<String>,
}

impl From<WireRecord> for MessageCipherInput {
    fn from(wire: WireRecord) -> Self {
        Self {
            text: wire.text,
            text_ecb: wire.text_ecb,
            time: wire.time,
            cipher_version: wire.cipher_version,
            iv: wire.iv.or(wire.msg_iv),
            tag: wire.tag.or(wire.auth_tag),
        }
    }
}

/// PHP backends emit integers as either JSON numbers or numeric strings.
/// Anything else (floats, bools, objects) reads as absent.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<IntOrString>::deserialize(deserializer)? {
        Some(IntOrString::Int(value)) => Some(value),
        Some(IntOrString::Str(value)) => value.trim().parse().ok(),
        Some(IntOrString::Other(_)) | None => None,
    })
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl MessageCipherInput {
    /// Parse a raw JSON message record.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the record a reader would receive for a freshly encrypted message.
    pub fn from_encrypted(message: &EncryptedMessage, timestamp: i64) -> Self {
        Self {
            text: Some(message.text.clone()),
            time: Some(timestamp),
            cipher_version: Some(message.cipher_version.as_i64()),
            iv: Some(message.iv.clone()),
            tag: Some(message.tag.clone()),
            ..Self::default()
        }
    }

    /// The base64 ciphertext to open: `text_ecb` if set, else `text`.
    pub fn ciphertext(&self) -> Option<&str> {
        non_empty(self.text_ecb.as_ref()).or_else(|| non_empty(self.text.as_ref()))
    }

    /// The timestamp, only if it is a usable key seed.
    pub fn timestamp(&self) -> Option<i64> {
        self.time.filter(|t| *t > 0)
    }

    pub fn iv(&self) -> Option<&str> {
        non_empty(self.iv.as_ref())
    }

    pub fn tag(&self) -> Option<&str> {
        non_empty(self.tag.as_ref())
    }

    /// The explicitly declared version, if it is one we know.
    pub fn declared_version(&self) -> Option<CipherVersion> {
        self.cipher_version
            .and_then(|v| CipherVersion::try_from(v).ok())
    }

    /// Both GCM side fields are present and non-empty.
    pub fn has_modern_fields(&self) -> bool {
        self.iv().is_some() && self.tag().is_some()
    }

    fn prefers_modern(&self) -> bool {
        self.declared_version() == Some(CipherVersion::Modern) || self.has_modern_fields()
    }
}

/// Which cipher the record was most likely written with.
pub fn detect_cipher_version(input: &MessageCipherInput) -> CipherVersion {
    if input.prefers_modern() {
        CipherVersion::Modern
    } else {
        CipherVersion::Legacy
    }
}

/// Decrypt a message record, trying the modern path first when indicated and
/// always falling back to legacy.
pub fn resolve(input: &MessageCipherInput) -> Result<String, ResolveError> {
    let encoded = input.ciphertext().ok_or(ResolveError::NoCiphertext)?;
    let timestamp = input.timestamp().ok_or(ResolveError::InvalidTimestamp)?;

    let mut attempted = Vec::with_capacity(2);

    if input.prefers_modern() {
        match (input.iv(), input.tag()) {
            (Some(iv), Some(tag)) => {
                attempted.push(CipherVersion::Modern);
                match attempt_modern(encoded, timestamp, iv, tag) {
                    Ok(plaintext) => return Ok(plaintext),
                    Err(err) => debug!(version = %CipherVersion::Modern, error = %err, "cipher attempt failed"),
                }
            }
            _ => debug!("modern cipher declared but iv or tag missing; skipping"),
        }
    }

    attempted.push(CipherVersion::Legacy);
    match attempt_legacy(encoded, timestamp) {
        Ok(plaintext) => return Ok(plaintext),
        Err(err) => debug!(version = %CipherVersion::Legacy, error = %err, "cipher attempt failed"),
    }

    debug!(?attempted, "no cipher path produced plaintext");
    Err(ResolveError::Undecryptable { attempted })
}

/// Decrypt using exactly one cipher path, without fallback.
pub fn resolve_version(
    input: &MessageCipherInput,
    version: CipherVersion,
) -> Result<String, ResolveError> {
    let encoded = input.ciphertext().ok_or(ResolveError::NoCiphertext)?;
    let timestamp = input.timestamp().ok_or(ResolveError::InvalidTimestamp)?;

    let result = match version {
        CipherVersion::Modern => match (input.iv(), input.tag()) {
            (Some(iv), Some(tag)) => attempt_modern(encoded, timestamp, iv, tag),
            _ => {
                debug!("modern cipher requested but iv or tag missing");
                return Err(ResolveError::Undecryptable { attempted: Vec::new() });
            }
        },
        CipherVersion::Legacy => attempt_legacy(encoded, timestamp),
    };

    result.map_err(|err| {
        debug!(%version, error = %err, "cipher attempt failed");
        ResolveError::Undecryptable { attempted: vec![version] }
    })
}

fn attempt_modern(
    encoded: &str,
    timestamp: i64,
    iv: &str,
    tag: &str,
) -> Result<String, CryptoError> {
    let ciphertext = decode_base64(encoded)?;
    let iv = decode_base64(iv)?;
    let tag = decode_base64(tag)?;

    let key = derive_modern_key(timestamp);
    usable(decrypt_modern(&ciphertext, &key, &iv, &tag)?)
}

fn attempt_legacy(encoded: &str, timestamp: i64) -> Result<String, CryptoError> {
    let ciphertext = decode_base64(encoded)?;

    let key = derive_legacy_key(timestamp);
    usable(decrypt_legacy(&ciphertext, &key)?)
}

/// An empty result is not a successful decryption.
fn usable(plaintext: String) -> Result<String, CryptoError> {
    if plaintext.is_empty() {
        Err(CryptoError::EmptyPlaintext)
    } else {
        Ok(plaintext)
    }
}
