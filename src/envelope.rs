//! Versioned ciphertext envelopes.
//!
//! Every encrypted field value is an envelope: the original JSON value is
//! stringified, wrapped with a format version and a creation timestamp, and
//! the whole wrapper is encrypted and base64-encoded. The version and
//! timestamp ride *inside* the ciphertext, so a blob that decrypts but does
//! not carry them is recognisably foreign data rather than silently
//! accepted.
//!
//! ## Wire format
//!
//! ```text
//! base64( [ IV (12 bytes) ][ AES-256-GCM( envelope JSON ) ] )
//!
//! envelope JSON = {"version":1,"timestamp":<epoch-ms>,"data":"<JSON string>"}
//! ```
//!
//! Only version 1 exists today. The field is an extensibility point: a
//! future version 2 must keep this decoder so that persisted version-1
//! ciphertext stays readable.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto;
use crate::error::FieldsealError;
use crate::keys::DerivedKey;

/// The only envelope version written today.
const ENVELOPE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    timestamp: i64,
    data: String,
}

/// Seal a JSON value into a base64 ciphertext string under `key`.
///
/// The value is stringified (double-encoded inside the envelope, so the
/// decoder recovers the exact original type), stamped with the current
/// epoch-millisecond timestamp, encrypted, and base64-encoded.
pub fn seal(key: &DerivedKey, value: &Value) -> Result<String, FieldsealError> {
    let data =
        serde_json::to_string(value).map_err(|_| FieldsealError::SerializationFailure)?;

    let envelope = Envelope {
        version: ENVELOPE_VERSION,
        timestamp: Utc::now().timestamp_millis(),
        data,
    };
    let plaintext =
        serde_json::to_vec(&envelope).map_err(|_| FieldsealError::SerializationFailure)?;

    let sealed = crypto::encrypt(key.as_bytes(), &plaintext)?;
    Ok(BASE64.encode(sealed))
}

/// Open a base64 ciphertext string back into the original JSON value.
///
/// Rejects, in order: bad base64, failed GCM authentication (wrong key or
/// tampering), non-JSON envelope bytes, a missing or zero envelope field,
/// an unsupported version, and non-JSON payload data. Callers decide the
/// failure policy; this function only reports it.
pub fn open(key: &DerivedKey, ciphertext: &str) -> Result<Value, FieldsealError> {
    let bytes = BASE64
        .decode(ciphertext)
        .map_err(|_| FieldsealError::InvalidEnvelope)?;

    let plaintext = crypto::decrypt(key.as_bytes(), &bytes)?;

    let envelope: Envelope =
        serde_json::from_slice(&plaintext).map_err(|_| FieldsealError::InvalidEnvelope)?;

    if envelope.version != ENVELOPE_VERSION || envelope.timestamp == 0 {
        return Err(FieldsealError::InvalidEnvelope);
    }

    serde_json::from_str(&envelope.data).map_err(|_| FieldsealError::InvalidEnvelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive_key;
    use serde_json::json;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = derive_key("user-123").unwrap();
        for value in [
            json!("Fever"),
            json!(42),
            json!(4.5),
            json!(true),
            json!(null),
            json!(["a", "b"]),
            json!({"nested": {"deep": 1}}),
        ] {
            let sealed = seal(&key, &value).unwrap();
            assert_eq!(open(&key, &sealed).unwrap(), value);
        }
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let key = derive_key("user-123").unwrap();

        // A well-encrypted blob carrying a version this decoder does not
        // know must be rejected, not half-parsed.
        let foreign = Envelope {
            version: 2,
            timestamp: Utc::now().timestamp_millis(),
            data: "\"value\"".to_string(),
        };
        let plaintext = serde_json::to_vec(&foreign).unwrap();
        let sealed = crypto::encrypt(key.as_bytes(), &plaintext).unwrap();
        let ciphertext = BASE64.encode(sealed);

        assert!(matches!(
            open(&key, &ciphertext),
            Err(FieldsealError::InvalidEnvelope)
        ));
    }

    #[test]
    fn test_missing_envelope_fields_rejected() {
        let key = derive_key("user-123").unwrap();

        // Valid ciphertext whose plaintext is JSON but not an envelope.
        let plaintext = br#"{"data":"\"value\""}"#;
        let sealed = crypto::encrypt(key.as_bytes(), plaintext).unwrap();
        let ciphertext = BASE64.encode(sealed);

        assert!(matches!(
            open(&key, &ciphertext),
            Err(FieldsealError::InvalidEnvelope)
        ));
    }

    #[test]
    fn test_zero_timestamp_rejected() {
        let key = derive_key("user-123").unwrap();

        let stale = Envelope {
            version: ENVELOPE_VERSION,
            timestamp: 0,
            data: "\"value\"".to_string(),
        };
        let plaintext = serde_json::to_vec(&stale).unwrap();
        let sealed = crypto::encrypt(key.as_bytes(), &plaintext).unwrap();
        let ciphertext = BASE64.encode(sealed);

        assert!(matches!(
            open(&key, &ciphertext),
            Err(FieldsealError::InvalidEnvelope)
        ));
    }

    #[test]
    fn test_bad_base64_rejected() {
        let key = derive_key("user-123").unwrap();
        assert!(matches!(
            open(&key, "not base64 at all!"),
            Err(FieldsealError::InvalidEnvelope)
        ));
    }
}
