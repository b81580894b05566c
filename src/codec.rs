//! Selective field encryption over named records.
//!
//! A record here is a JSON object (`serde_json::Map`). Callers declare which
//! field names are sensitive; the codec replaces exactly those fields with
//! envelope ciphertext on the way into storage and restores them on the way
//! out. Everything else passes through bit-identical.
//!
//! ## Failure policy
//!
//! The two directions are deliberately asymmetric:
//!
//! - **Encrypt fails hard.** A record must never be persisted with some
//!   sensitive fields in cleartext, so any failure aborts the whole
//!   operation.
//! - **Decrypt fails soft.** Stored data can contain corrupt blobs, legacy
//!   cleartext, or ciphertext written under another principal's key. One
//!   unreadable field must not block reading the rest of the record, so a
//!   failed field keeps its stored value (the caller sees opaque ciphertext,
//!   never fabricated plaintext) and the failure is logged.

use serde_json::{Map, Value};
use tracing::warn;

use crate::cache::{KeyCache, KeySource, StaticSaltDeriver};
use crate::envelope;
use crate::error::FieldsealError;
use crate::keys::DerivedKey;

/// A JSON object record, field name to value.
pub type Record = Map<String, Value>;

/// The field-encryption service.
///
/// Owns the per-principal key cache. Construct one per process (or per
/// store) and share it; cloning keys out of the cache is cheap and the
/// cache itself coalesces concurrent derivations.
pub struct FieldCipher<S: KeySource = StaticSaltDeriver> {
    keys: KeyCache<S>,
}

impl FieldCipher<StaticSaltDeriver> {
    /// A cipher using the default fixed-salt key derivation.
    pub fn new() -> Self {
        Self {
            keys: KeyCache::new(),
        }
    }
}

impl Default for FieldCipher<StaticSaltDeriver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: KeySource> FieldCipher<S> {
    /// A cipher whose key material comes from a caller-supplied source.
    pub fn with_source(source: S) -> Self {
        Self {
            keys: KeyCache::with_source(source),
        }
    }

    /// The cached derived key for a principal.
    pub async fn user_key(&self, principal_id: &str) -> Result<DerivedKey, FieldsealError> {
        self.keys.key_for(principal_id).await
    }

    /// Evict a principal's cached key (sign-out path).
    pub fn clear_user_key(&self, principal_id: &str) {
        self.keys.clear(principal_id);
    }

    /// Encrypt one value into an envelope ciphertext string.
    pub async fn encrypt_field(
        &self,
        value: &Value,
        principal_id: &str,
    ) -> Result<String, FieldsealError> {
        let key = self.keys.key_for(principal_id).await?;
        envelope::seal(&key, value)
    }

    /// Decrypt one envelope ciphertext string back into its value.
    ///
    /// Fail-soft: any failure — wrong key, tampering, foreign or corrupt
    /// blob — yields `None`. A `Some` value is always authenticated
    /// plaintext, never a guess.
    pub async fn decrypt_field(&self, ciphertext: &str, principal_id: &str) -> Option<Value> {
        let key = match self.keys.key_for(principal_id).await {
            Ok(key) => key,
            Err(err) => {
                warn!(error = %err, "field decryption skipped: no key available");
                return None;
            }
        };

        match envelope::open(&key, ciphertext) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "field decryption failed");
                None
            }
        }
    }

    /// Return a copy of `record` with each named field encrypted.
    ///
    /// Fields that are absent or null are left untouched — no envelope is
    /// written for data that is not there. Any failure aborts the whole
    /// call; a partially encrypted record is never returned.
    pub async fn encrypt_fields(
        &self,
        record: &Record,
        field_names: &[&str],
        principal_id: &str,
    ) -> Result<Record, FieldsealError> {
        let mut encrypted = record.clone();

        for &field in field_names {
            match record.get(field) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    let ciphertext = self.encrypt_field(value, principal_id).await?;
                    encrypted.insert(field.to_string(), Value::String(ciphertext));
                }
            }
        }

        Ok(encrypted)
    }

    /// Return a copy of `record` with each named field decrypted.
    ///
    /// A field that fails to decrypt keeps its stored value rather than
    /// being clobbered with null — wrong-key data, legacy cleartext, and
    /// corruption all stay visible to the caller as-is. Infallible by
    /// policy: in the worst case the record comes back unchanged.
    pub async fn decrypt_fields(
        &self,
        record: &Record,
        field_names: &[&str],
        principal_id: &str,
    ) -> Record {
        let mut decrypted = record.clone();

        for &field in field_names {
            // Only a string can be an envelope; anything else was never
            // encrypted by us and stays in place.
            let Some(Value::String(ciphertext)) = record.get(field) else {
                continue;
            };

            if let Some(value) = self.decrypt_field(ciphertext, principal_id).await {
                decrypted.insert(field.to_string(), value);
            }
        }

        decrypted
    }
}
