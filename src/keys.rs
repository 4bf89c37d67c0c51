//! Timestamp-derived message keys.
//!
//! Keys are never transmitted or stored. Both sides rebuild them from the
//! message's `time` field, so derivation must stay byte-for-byte identical to
//! the PHP and Kotlin implementations:
//!
//! - v1 (legacy): decimal timestamp, first 16 chars, NUL-padded to 16 bytes
//! - v2 (modern): decimal timestamp repeated and cut to exactly 32 bytes

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::CryptoError;

/// AES-128 key length for legacy (v1) messages.
pub const LEGACY_KEY_LEN: usize = 16;

/// AES-256 key length for modern (v2) messages.
pub const MODERN_KEY_LEN: usize = 32;

/// Discriminator selecting the derivation rule and algorithm pair.
///
/// Serialized as the bare integer used on the wire (`cipher_version`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CipherVersion {
    /// AES-128-ECB, no IV, no authentication. Read-only compatibility path.
    Legacy = 1,
    /// AES-256-GCM with a 12-byte IV and detached 16-byte tag.
    Modern = 2,
}

impl CipherVersion {
    pub const fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for CipherVersion {
    type Error = CryptoError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Legacy),
            2 => Ok(Self::Modern),
            other => Err(CryptoError::UnsupportedVersion(other)),
        }
    }
}

impl From<CipherVersion> for i64 {
    fn from(version: CipherVersion) -> Self {
        version.as_i64()
    }
}

impl fmt::Display for CipherVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "v1/aes-128-ecb"),
            Self::Modern => write!(f, "v2/aes-256-gcm"),
        }
    }
}

/// 16-byte AES-128 key for legacy messages. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LegacyKey([u8; LEGACY_KEY_LEN]);

impl LegacyKey {
    pub fn as_bytes(&self) -> &[u8; LEGACY_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for LegacyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LegacyKey(..)")
    }
}

/// 32-byte AES-256 key for modern messages. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ModernKey([u8; MODERN_KEY_LEN]);

impl ModernKey {
    pub fn as_bytes(&self) -> &[u8; MODERN_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for ModernKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModernKey(..)")
    }
}

/// A key derived for a specific cipher version.
#[derive(Debug, Clone)]
pub enum DerivedKey {
    Legacy(LegacyKey),
    Modern(ModernKey),
}

impl DerivedKey {
    pub fn version(&self) -> CipherVersion {
        match self {
            Self::Legacy(_) => CipherVersion::Legacy,
            Self::Modern(_) => CipherVersion::Modern,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Legacy(key) => key.as_bytes(),
            Self::Modern(key) => key.as_bytes(),
        }
    }
}

/// Derive the key for `version` from a message timestamp.
///
/// Total over `i64`. Callers reject non-positive timestamps before getting here.
pub fn derive_key(timestamp: i64, version: CipherVersion) -> DerivedKey {
    match version {
        CipherVersion::Legacy => DerivedKey::Legacy(derive_legacy_key(timestamp)),
        CipherVersion::Modern => DerivedKey::Modern(derive_modern_key(timestamp)),
    }
}

/// v1: first 16 decimal characters, remainder NUL bytes.
pub fn derive_legacy_key(timestamp: i64) -> LegacyKey {
    let mut digits = timestamp.to_string();
    let mut key = [0u8; LEGACY_KEY_LEN];
    let len = digits.len().min(LEGACY_KEY_LEN);
    key[..len].copy_from_slice(&digits.as_bytes()[..len]);
    digits.zeroize();
    LegacyKey(key)
}

/// v2: decimal string (or `"0"` for non-positive input) cycled to 32 bytes.
pub fn derive_modern_key(timestamp: i64) -> ModernKey {
    let mut seed = if timestamp > 0 {
        timestamp.to_string()
    } else {
        String::from("0")
    };
    let mut key = [0u8; MODERN_KEY_LEN];
    for (dst, src) in key.iter_mut().zip(seed.as_bytes().iter().cycle()) {
        *dst = *src;
    }
    seed.zeroize();
    ModernKey(key)
}
