//! # fieldseal
//!
//! Selective field-level encryption with per-principal derived keys.
//!
//! Sensitive fields of a record are replaced by self-describing,
//! authenticated ciphertext before the record reaches shared storage, and
//! restored on read. Keys are derived deterministically from the
//! authenticated principal's opaque identifier — no key material is ever
//! persisted, so ciphertext written in one session decrypts in any later
//! one.
//!
//! ## Public API
//!
//! The public surface of this crate is intentionally narrow. Callers use
//! [`FieldCipher`] (or [`SecureStore`] around their persistence layer);
//! raw key bytes and the cipher internals are `pub(crate)` at most.
//!
//! ```no_run
//! use fieldseal::{FieldCipher, RecordKind};
//! use serde_json::{json, Map};
//!
//! # async fn demo() -> Result<(), fieldseal::FieldsealError> {
//! let cipher = FieldCipher::new();
//!
//! let mut symptom = Map::new();
//! symptom.insert("name".into(), json!("Fever"));
//! symptom.insert("severity".into(), json!(3));
//!
//! let sealed = cipher
//!     .encrypt_fields(&symptom, RecordKind::Symptom.sensitive_fields(), "user-123")
//!     .await?;
//! // `sealed["name"]` is ciphertext; `sealed["severity"]` is still 3.
//!
//! let restored = cipher
//!     .decrypt_fields(&sealed, RecordKind::Symptom.sensitive_fields(), "user-123")
//!     .await;
//! assert_eq!(restored["name"], json!("Fever"));
//! # Ok(())
//! # }
//! ```

// Module declarations.
pub(crate) mod crypto;
pub mod cache;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod record;
pub mod store;

pub use cache::{KeyCache, KeySource, StaticSaltDeriver};
pub use codec::{FieldCipher, Record};
pub use error::FieldsealError;
pub use keys::{derive_key, DerivedKey};
pub use record::RecordKind;
pub use store::{MemoryStore, RecordId, RecordStore, SecureStore, StoredRecord};
