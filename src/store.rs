//! The persistence boundary and its encrypting wrapper.
//!
//! The backend itself is out of scope; this crate sees it only as "record
//! in, record out" through the [`RecordStore`] trait. [`SecureStore`] is the
//! component callers actually use: it runs every write through
//! [`FieldCipher::encrypt_fields`] before handing the record to the store,
//! and every read through [`FieldCipher::decrypt_fields`] before handing
//! rows back. Plaintext sensitive fields never reach the store.

use std::collections::HashMap;

use crate::cache::{KeySource, StaticSaltDeriver};
use crate::codec::{FieldCipher, Record};
use crate::error::FieldsealError;
use crate::record::RecordKind;

/// Identifier assigned by the store on insert.
pub type RecordId = u64;

/// A persisted record as the store returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub fields: Record,
}

/// Generic persistence. The store sees opaque records; it neither knows nor
/// cares which fields are ciphertext.
pub trait RecordStore {
    fn insert(&mut self, kind: RecordKind, fields: Record) -> Result<StoredRecord, FieldsealError>;

    fn update(
        &mut self,
        kind: RecordKind,
        id: RecordId,
        fields: Record,
    ) -> Result<StoredRecord, FieldsealError>;

    fn select(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, FieldsealError>;
}

/// In-memory [`RecordStore`] for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: RecordId,
    rows: HashMap<RecordKind, Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&mut self, kind: RecordKind, fields: Record) -> Result<StoredRecord, FieldsealError> {
        self.next_id += 1;
        let stored = StoredRecord {
            id: self.next_id,
            fields,
        };
        self.rows.entry(kind).or_default().push(stored.clone());
        Ok(stored)
    }

    fn update(
        &mut self,
        kind: RecordKind,
        id: RecordId,
        fields: Record,
    ) -> Result<StoredRecord, FieldsealError> {
        let rows = self.rows.entry(kind).or_default();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(FieldsealError::RecordNotFound(id))?;
        row.fields = fields;
        Ok(row.clone())
    }

    fn select(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, FieldsealError> {
        Ok(self.rows.get(&kind).cloned().unwrap_or_default())
    }
}

/// A [`RecordStore`] wrapper that encrypts on the way in and decrypts on
/// the way out, using each kind's declared sensitive-field set.
pub struct SecureStore<R: RecordStore, S: KeySource = StaticSaltDeriver> {
    store: R,
    cipher: FieldCipher<S>,
}

impl<R: RecordStore> SecureStore<R, StaticSaltDeriver> {
    /// Wrap a store with the default fixed-salt cipher.
    pub fn new(store: R) -> Self {
        Self {
            store,
            cipher: FieldCipher::new(),
        }
    }
}

impl<R: RecordStore, S: KeySource> SecureStore<R, S> {
    /// Wrap a store with a caller-configured cipher.
    pub fn with_cipher(store: R, cipher: FieldCipher<S>) -> Self {
        Self { store, cipher }
    }

    /// The underlying cipher, e.g. for `clear_user_key` on sign-out.
    pub fn cipher(&self) -> &FieldCipher<S> {
        &self.cipher
    }

    /// Unwrap, returning the inner store with its records as persisted.
    pub fn into_inner(self) -> R {
        self.store
    }

    /// Encrypt the kind's sensitive fields and insert. Returns the stored
    /// record decrypted back, as callers want to render what they wrote.
    pub async fn insert(
        &mut self,
        kind: RecordKind,
        fields: Record,
        principal_id: &str,
    ) -> Result<StoredRecord, FieldsealError> {
        let encrypted = self
            .cipher
            .encrypt_fields(&fields, kind.sensitive_fields(), principal_id)
            .await?;
        let stored = self.store.insert(kind, encrypted)?;
        Ok(self.decrypted(kind, stored, principal_id).await)
    }

    /// Encrypt the kind's sensitive fields and update an existing record.
    pub async fn update(
        &mut self,
        kind: RecordKind,
        id: RecordId,
        fields: Record,
        principal_id: &str,
    ) -> Result<StoredRecord, FieldsealError> {
        let encrypted = self
            .cipher
            .encrypt_fields(&fields, kind.sensitive_fields(), principal_id)
            .await?;
        let stored = self.store.update(kind, id, encrypted)?;
        Ok(self.decrypted(kind, stored, principal_id).await)
    }

    /// Fetch all records of a kind, decrypting each row's sensitive fields.
    /// Rows with unreadable fields come back with those fields as stored.
    pub async fn select(
        &self,
        kind: RecordKind,
        principal_id: &str,
    ) -> Result<Vec<StoredRecord>, FieldsealError> {
        let rows = self.store.select(kind)?;
        let mut decrypted = Vec::with_capacity(rows.len());
        for row in rows {
            decrypted.push(self.decrypted(kind, row, principal_id).await);
        }
        Ok(decrypted)
    }

    async fn decrypted(
        &self,
        kind: RecordKind,
        stored: StoredRecord,
        principal_id: &str,
    ) -> StoredRecord {
        StoredRecord {
            id: stored.id,
            fields: self
                .cipher
                .decrypt_fields(&stored.fields, kind.sensitive_fields(), principal_id)
                .await,
        }
    }
}
