//! Bridging between v1-only and v2-capable clients.
//!
//! The backend serves two generations of clients from the same message rows:
//! newer apps read AES-256-GCM records, older web clients only understand the
//! AES-128-ECB `text`. Everything here goes through the resolver and the
//! engine; nothing decrypts on its own.

use tracing::debug;

use crate::encryption::{encrypt_legacy_message, encrypt_message, EncryptedMessage};
use crate::errors::ResolveError;
use crate::keys::CipherVersion;
use crate::resolver::{resolve, resolve_version, MessageCipherInput};

/// Number of characters kept in a chat-list preview.
pub const PREVIEW_CHARS: usize = 100;

/// Generation of the client a message is being projected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// Understands v2 records (`text` + `iv` + `tag`).
    Modern,
    /// Only understands v1 base64 `text`.
    Legacy,
}

/// Re-encrypt a v2 message as v1 under the same timestamp.
pub fn convert_modern_to_legacy(input: &MessageCipherInput) -> Result<String, ResolveError> {
    let plaintext = resolve_version(input, CipherVersion::Modern)?;
    let timestamp = input.timestamp().ok_or(ResolveError::InvalidTimestamp)?;
    Ok(encrypt_legacy_message(&plaintext, timestamp)?)
}

/// Re-encrypt a v1 message as v2 under the same timestamp.
pub fn convert_legacy_to_modern(
    input: &MessageCipherInput,
) -> Result<EncryptedMessage, ResolveError> {
    let plaintext = resolve_version(input, CipherVersion::Legacy)?;
    let timestamp = input.timestamp().ok_or(ResolveError::InvalidTimestamp)?;
    Ok(encrypt_message(&plaintext, timestamp)?)
}

/// The ciphertext a given client should receive in its `text` field.
pub fn text_for_client(input: &MessageCipherInput, client: ClientKind) -> String {
    let text = || input.text.clone().unwrap_or_default();
    let text_ecb = input.text_ecb.as_ref().filter(|t| !t.is_empty());

    match client {
        ClientKind::Modern => {
            if input.has_modern_fields() {
                text()
            } else {
                text_ecb.cloned().unwrap_or_else(text)
            }
        }
        ClientKind::Legacy => {
            if let Some(ecb) = text_ecb {
                return ecb.clone();
            }
            if input.has_modern_fields() {
                match convert_modern_to_legacy(input) {
                    Ok(converted) => return converted,
                    Err(err) => debug!(error = %err, "could not convert message for legacy client"),
                }
            }
            text()
        }
    }
}

/// Project a record for a legacy client: pick its text and drop v2-only fields.
pub fn project_for_legacy_client(input: &MessageCipherInput) -> MessageCipherInput {
    let mut projected = input.clone();
    projected.text = Some(text_for_client(input, ClientKind::Legacy));
    strip_modern_fields(&mut projected);
    projected
}

/// Remove the fields a v1 client does not understand.
pub fn strip_modern_fields(input: &mut MessageCipherInput) {
    input.iv = None;
    input.tag = None;
    input.cipher_version = None;
    input.text_ecb = None;
}

/// First [`PREVIEW_CHARS`] characters of the decrypted message.
pub fn message_preview(input: &MessageCipherInput) -> Option<String> {
    resolve(input)
        .ok()
        .map(|plaintext| plaintext.chars().take(PREVIEW_CHARS).collect())
}

/// Decrypt `text` if it looks like a v1 ciphertext, otherwise return it as-is.
///
/// Chats mix encrypted messages from the web client with plain ones from
/// older mobile builds; both must render.
pub fn decrypt_or_original(text: &str, timestamp: i64) -> String {
    if !looks_like_base64(text) {
        return text.to_owned();
    }

    let input = MessageCipherInput {
        text: Some(text.to_owned()),
        time: Some(timestamp),
        ..MessageCipherInput::default()
    };
    match resolve(&input) {
        Ok(plaintext) => plaintext,
        Err(err) => {
            debug!(error = %err, "keeping original text");
            text.to_owned()
        }
    }
}

/// Like [`decrypt_or_original`], but plain URLs and server paths pass through.
pub fn decrypt_media_url(url: &str, timestamp: i64) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/') {
        return url.to_owned();
    }
    decrypt_or_original(url, timestamp)
}

/// Standard-alphabet base64 with optional trailing padding, length a multiple of 4.
fn looks_like_base64(text: &str) -> bool {
    if text.is_empty() || text.len() % 4 != 0 {
        return false;
    }
    let body = text.trim_end_matches('=');
    !body.is_empty()
        && text.len() - body.len() <= 2
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}
