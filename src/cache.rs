//! Per-principal derived-key caching.
//!
//! Key derivation is deliberately expensive (a 1000-iteration PBKDF2), and
//! a single record read can touch many encrypted fields. The cache ensures
//! the work happens at most once per principal: the first caller starts the
//! derivation and concurrent callers for the same principal await that same
//! in-flight computation instead of starting their own.
//!
//! The cache is an explicitly constructed service, not a global singleton —
//! callers own one (usually inside a [`FieldCipher`](crate::codec::FieldCipher))
//! and pass it where it is needed.
//!
//! Failure does not poison an entry: if a derivation fails, the slot stays
//! empty and the next caller retries. `clear` evicts a principal's entry on
//! sign-out so a later sign-in re-derives rather than reusing a stale
//! session's key; callers already awaiting the old entry are unaffected.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::FieldsealError;
use crate::keys::{self, DerivedKey};

/// Produces the key material for a principal.
///
/// The default implementation is pure CPU derivation, but the seam exists so
/// key material can instead depend on an I/O-bound per-user secret fetch.
/// Implementations must be deterministic per principal: every successful
/// call for the same id must yield the same key, or previously written
/// ciphertext becomes unreadable.
pub trait KeySource: Send + Sync {
    fn key_for(
        &self,
        principal_id: &str,
    ) -> impl Future<Output = Result<DerivedKey, FieldsealError>> + Send;
}

/// The default key source: stateless PBKDF2 under the fixed static salt.
///
/// See the `keys` module for why the salt is fixed and why that convention
/// must never be mixed with a per-user-salt scheme over the same data.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSaltDeriver;

impl KeySource for StaticSaltDeriver {
    async fn key_for(&self, principal_id: &str) -> Result<DerivedKey, FieldsealError> {
        keys::derive_key(principal_id)
    }
}

/// Memoizes one derived key per principal, coalescing concurrent requests.
pub struct KeyCache<S: KeySource = StaticSaltDeriver> {
    source: S,
    entries: Mutex<HashMap<String, Arc<OnceCell<DerivedKey>>>>,
}

impl KeyCache<StaticSaltDeriver> {
    /// A cache over the default fixed-salt derivation.
    pub fn new() -> Self {
        Self::with_source(StaticSaltDeriver)
    }
}

impl Default for KeyCache<StaticSaltDeriver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: KeySource> KeyCache<S> {
    /// A cache over a caller-supplied key source.
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the derived key for `principal_id`, deriving it on first use.
    ///
    /// Concurrent calls for the same principal share a single in-flight
    /// derivation; whichever caller inserts the entry first owns it. The
    /// map lock is held only to look up or insert the entry, never across
    /// the derivation itself, so principals do not contend with each other.
    pub async fn key_for(&self, principal_id: &str) -> Result<DerivedKey, FieldsealError> {
        let cell = {
            let mut entries = self.lock_entries();
            Arc::clone(
                entries
                    .entry(principal_id.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let key = cell
            .get_or_try_init(|| async {
                debug!("deriving key for principal");
                self.source.key_for(principal_id).await
            })
            .await?;

        Ok(key.clone())
    }

    /// Evict the cached key for `principal_id`.
    ///
    /// Used on sign-out. Callers currently awaiting the evicted entry still
    /// complete against it; the next `key_for` derives fresh.
    pub fn clear(&self, principal_id: &str) {
        self.lock_entries().remove(principal_id);
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Arc<OnceCell<DerivedKey>>>> {
        // The map holds only Arcs; a panic mid-mutation cannot leave it in
        // an unusable state, so recover from poisoning instead of unwinding.
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
