//! Stored message entity with plaintext kept apart from ciphertext.

use serde::{Deserialize, Serialize};

use crate::errors::ResolveError;
use crate::resolver::{resolve, MessageCipherInput};

/// Placeholder shown when a message cannot be decrypted.
pub const MESSAGE_UNAVAILABLE: &str = "[message unavailable]";

/// Where a message is in its decryption lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum DecryptionState {
    /// Not attempted yet.
    #[default]
    Pending,
    /// Every cipher path failed; render as unavailable.
    Failed,
    /// The record carries no ciphertext at all.
    Empty,
    Decrypted(String),
}

impl DecryptionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn plaintext(&self) -> Option<&str> {
        match self {
            Self::Decrypted(text) => Some(text),
            _ => None,
        }
    }
}

/// A cached chat message: the original cipher fields plus decryption outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    #[serde(flatten)]
    pub cipher: MessageCipherInput,
    #[serde(default, skip_serializing_if = "DecryptionState::is_pending")]
    pub decryption: DecryptionState,
}

impl StoredMessage {
    pub fn new(id: i64, cipher: MessageCipherInput) -> Self {
        Self {
            id,
            cipher,
            decryption: DecryptionState::Pending,
        }
    }

    /// Run the resolver and record the outcome. Cipher fields are untouched.
    pub fn decrypt(&mut self) -> &DecryptionState {
        self.decryption = match resolve(&self.cipher) {
            Ok(plaintext) => DecryptionState::Decrypted(plaintext),
            Err(ResolveError::NoCiphertext) => DecryptionState::Empty,
            Err(_) => DecryptionState::Failed,
        };
        &self.decryption
    }

    /// Decrypt on first access, reuse the recorded outcome afterwards.
    pub fn decrypt_if_pending(&mut self) -> &DecryptionState {
        if self.decryption.is_pending() {
            self.decrypt();
        }
        &self.decryption
    }

    /// Text to render: plaintext, empty for empty messages, or the placeholder.
    pub fn display_text(&self) -> &str {
        match &self.decryption {
            DecryptionState::Decrypted(text) => text,
            DecryptionState::Empty => "",
            DecryptionState::Pending | DecryptionState::Failed => MESSAGE_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::encrypt_message;

    const TS: i64 = 1_700_000_000;

    fn encrypted(text: &str) -> StoredMessage {
        let msg = encrypt_message(text, TS).unwrap();
        StoredMessage::new(7, MessageCipherInput::from_encrypted(&msg, TS))
    }

    #[test]
    fn decrypt_keeps_ciphertext() {
        let mut message = encrypted("cached");
        let before = message.cipher.clone();
        assert_eq!(message.decrypt().plaintext(), Some("cached"));
        assert_eq!(message.cipher, before);
        assert_eq!(message.display_text(), "cached");
    }

    #[test]
    fn three_states_are_distinct() {
        let mut empty = StoredMessage::new(1, MessageCipherInput {
            time: Some(TS),
            ..Default::default()
        });
        assert_eq!(*empty.decrypt(), DecryptionState::Empty);
        assert_eq!(empty.display_text(), "");

        let mut broken = encrypted("x");
        broken.cipher.time = Some(TS + 1);
        assert_eq!(*broken.decrypt(), DecryptionState::Failed);
        assert_eq!(broken.display_text(), MESSAGE_UNAVAILABLE);

        let pending = encrypted("y");
        assert!(pending.decryption.is_pending());
        assert_eq!(pending.display_text(), MESSAGE_UNAVAILABLE);
    }

    #[test]
    fn decrypt_if_pending_reuses_outcome() {
        let mut message = encrypted("once");
        message.decrypt_if_pending();
        message.cipher.time = Some(TS + 1);
        assert_eq!(message.decrypt_if_pending().plaintext(), Some("once"));
    }

    #[test]
    fn json_keeps_fields_apart() {
        let mut message = encrypted("json");
        message.decrypt();
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["text"], message.cipher.text.clone().unwrap());
        assert_eq!(value["decryption"]["state"], "decrypted");
        assert_eq!(value["decryption"]["text"], "json");

        let back: StoredMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn pending_state_is_omitted_from_json() {
        let message = encrypted("later");
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("decryption").is_none());
        let back: StoredMessage = serde_json::from_value(value).unwrap();
        assert!(back.decryption.is_pending());
    }
}
