use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fieldseal::{derive_key, envelope, DerivedKey, FieldsealError, KeyCache, KeySource};
use serde_json::json;

/// A key source that counts how many derivations actually run, with an
/// await point to widen the window for concurrent callers to pile up.
struct CountingSource {
    derivations: Arc<AtomicUsize>,
}

impl KeySource for CountingSource {
    async fn key_for(&self, principal_id: &str) -> Result<DerivedKey, FieldsealError> {
        self.derivations.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        derive_key(principal_id)
    }
}

/// A key source that fails its first `failures` calls, then succeeds.
struct FlakySource {
    attempts: Arc<AtomicUsize>,
    failures: usize,
}

impl KeySource for FlakySource {
    async fn key_for(&self, principal_id: &str) -> Result<DerivedKey, FieldsealError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if attempt < self.failures {
            return Err(FieldsealError::RandomnessFailure);
        }
        derive_key(principal_id)
    }
}

#[tokio::test]
async fn test_concurrent_calls_share_one_derivation() {
    let derivations = Arc::new(AtomicUsize::new(0));
    let cache = KeyCache::with_source(CountingSource {
        derivations: Arc::clone(&derivations),
    });

    // 1. Burst of concurrent requests for the same principal, as happens
    //    when several encrypted fields of several records decrypt at once.
    let (a, b, c, d) = tokio::join!(
        cache.key_for("user-123"),
        cache.key_for("user-123"),
        cache.key_for("user-123"),
        cache.key_for("user-123"),
    );

    // 2. All resolve, and the underlying derivation ran exactly once.
    let (a, b, c, d) = (a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap());
    assert_eq!(derivations.load(Ordering::SeqCst), 1);

    // 3. All callers hold the same key: ciphertext sealed under one copy
    //    opens under every other (key bytes are not exposed to compare).
    let sealed = envelope::seal(&a, &json!("shared")).unwrap();
    for key in [&b, &c, &d] {
        assert_eq!(envelope::open(key, &sealed).unwrap(), json!("shared"));
    }
}

#[tokio::test]
async fn test_distinct_principals_derive_independently() {
    let derivations = Arc::new(AtomicUsize::new(0));
    let cache = KeyCache::with_source(CountingSource {
        derivations: Arc::clone(&derivations),
    });

    let (a, b) = tokio::join!(cache.key_for("user-a"), cache.key_for("user-b"));
    a.unwrap();
    b.unwrap();
    assert_eq!(derivations.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_repeat_calls_hit_the_cache() {
    let derivations = Arc::new(AtomicUsize::new(0));
    let cache = KeyCache::with_source(CountingSource {
        derivations: Arc::clone(&derivations),
    });

    cache.key_for("user-123").await.unwrap();
    cache.key_for("user-123").await.unwrap();
    cache.key_for("user-123").await.unwrap();
    assert_eq!(derivations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clear_forces_rederivation() {
    let derivations = Arc::new(AtomicUsize::new(0));
    let cache = KeyCache::with_source(CountingSource {
        derivations: Arc::clone(&derivations),
    });

    cache.key_for("user-123").await.unwrap();
    cache.clear("user-123");
    cache.key_for("user-123").await.unwrap();
    assert_eq!(derivations.load(Ordering::SeqCst), 2);

    // Clearing an unknown principal is a no-op.
    cache.clear("never-seen");
}

#[tokio::test]
async fn test_failed_derivation_does_not_poison_the_entry() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let cache = KeyCache::with_source(FlakySource {
        attempts: Arc::clone(&attempts),
        failures: 1,
    });

    // First call fails and the failure reaches the caller.
    assert!(cache.key_for("user-123").await.is_err());

    // The entry is not stuck on the failure: the next call retries and
    // succeeds, and is cached from then on.
    assert!(cache.key_for("user-123").await.is_ok());
    assert!(cache.key_for("user-123").await.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
