//! # message-cipher-core
//!
//! Per-message symmetric encryption for chat text, shared by the API backend
//! and every client.
//!
//! Each message is encrypted under a key derived from its own timestamp:
//! - **v2 (modern)**: AES-256-GCM, random 12-byte IV, detached 16-byte tag
//! - **v1 (legacy)**: AES-128-ECB, read-only compatibility for old rows
//!
//! ## Design
//!
//! - Stateless: every operation is a pure function of its inputs
//! - Derived keys are zeroized on drop and never leave the call
//! - The resolver infers the cipher version from the record and falls back
//!   from v2 to v1; a failed path is an explicit `Result`, never a panic
//! - Plaintext is returned separately from the ciphertext fields, so callers
//!   can tell "undecryptable" from "empty"

pub mod fields;
pub mod keys;
pub mod encryption;
pub mod resolver;
pub mod compat;
pub mod message;
pub mod errors;

// Re-export core types
pub use fields::*;
pub use keys::{derive_key, CipherVersion, DerivedKey, LegacyKey, ModernKey};
pub use encryption::{decrypt_legacy, decrypt_modern, encrypt_message, EncryptedMessage, SealedPayload};
pub use resolver::{detect_cipher_version, resolve, MessageCipherInput};
pub use compat::ClientKind;
pub use message::{DecryptionState, StoredMessage};
pub use errors::{CryptoError, ResolveError};
