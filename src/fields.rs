//! Authoritative wire field names for encrypted message records.
//!
//! These are shared with the PHP API, the Android client and the desktop
//! client. Renaming any of them silently breaks decryption of stored rows.
//!
//! RULES:
//! 1. Primary names are what new records are written with
//! 2. Alternate names are read-only; nothing writes them anymore
//! 3. The serde attributes in `resolver.rs` and `encryption.rs` must agree
//!    with this module (checked by the tests below)

// --- Ciphertext ---

/// base64 ciphertext
pub const FIELD_TEXT: &str = "text";

/// base64 v1 ciphertext kept next to a v2 `text` for legacy clients
pub const FIELD_TEXT_ECB: &str = "text_ecb";

// --- Key derivation ---

/// Unix timestamp in seconds, the key-derivation seed
pub const FIELD_TIME: &str = "time";

/// 1 = AES-128-ECB, 2 = AES-256-GCM
pub const FIELD_CIPHER_VERSION: &str = "cipher_version";

// --- GCM side fields ---

/// base64 12-byte nonce
pub const FIELD_IV: &str = "iv";

/// Alternate nonce name written by older API versions
pub const FIELD_IV_ALT: &str = "msg_iv";

/// base64 16-byte authentication tag
pub const FIELD_TAG: &str = "tag";

/// Alternate tag name written by older API versions
pub const FIELD_TAG_ALT: &str = "auth_tag";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::encrypt_message;
    use crate::resolver::MessageCipherInput;

    #[test]
    fn fields_match_wire_format() {
        assert_eq!(FIELD_TEXT, "text");
        assert_eq!(FIELD_TEXT_ECB, "text_ecb");
        assert_eq!(FIELD_TIME, "time");
        assert_eq!(FIELD_CIPHER_VERSION, "cipher_version");
        assert_eq!(FIELD_IV, "iv");
        assert_eq!(FIELD_IV_ALT, "msg_iv");
        assert_eq!(FIELD_TAG, "tag");
        assert_eq!(FIELD_TAG_ALT, "auth_tag");
    }

    #[test]
    fn serialized_input_uses_primary_names() {
        let input = MessageCipherInput {
            text: Some("a".into()),
            text_ecb: Some("b".into()),
            time: Some(1),
            cipher_version: Some(2),
            iv: Some("c".into()),
            tag: Some("d".into()),
        };
        let value = serde_json::to_value(&input).unwrap();
        let map = value.as_object().unwrap();
        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = vec![
            FIELD_TEXT,
            FIELD_TEXT_ECB,
            FIELD_TIME,
            FIELD_CIPHER_VERSION,
            FIELD_IV,
            FIELD_TAG,
        ];
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn alternate_names_are_read() {
        let mut record = serde_json::Map::new();
        record.insert(FIELD_TEXT.into(), "x".into());
        record.insert(FIELD_TIME.into(), 10.into());
        record.insert(FIELD_IV_ALT.into(), "nonce".into());
        record.insert(FIELD_TAG_ALT.into(), "mac".into());
        let input: MessageCipherInput =
            serde_json::from_value(serde_json::Value::Object(record)).unwrap();
        assert_eq!(input.iv(), Some("nonce"));
        assert_eq!(input.tag(), Some("mac"));
    }

    #[test]
    fn encrypted_message_uses_primary_names() {
        let value = serde_json::to_value(encrypt_message("hi", 10).unwrap()).unwrap();
        for field in [FIELD_TEXT, FIELD_IV, FIELD_TAG, FIELD_CIPHER_VERSION] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
