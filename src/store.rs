//! The store adapter seam for the lock protocol.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LeaseStoreError;

/// Shared key-value store operations the mutex protocol requires.
///
/// Implementations map these onto whatever the backing store offers
/// natively (for Redis, `SET key value EX ttl NX` and a GET/compare/DEL
/// script; for stores with CAS, conditional writes). Both mutating
/// operations must execute as single atomic server-side steps: the
/// protocol's correctness rests entirely on that atomicity.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Atomically set `key` to `value` with expiry `ttl` if no live value
    /// exists. Returns true if the value was set, false if a live value
    /// was already present.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, LeaseStoreError>;

    /// Atomically delete `key` if its current value equals `expected`.
    ///
    /// Returns true if a deletion occurred; false when the key is absent
    /// or holds a different value. Read, compare, and delete must be one
    /// indivisible step, otherwise a lease that expires and is re-acquired
    /// between the read and the delete would be deleted out from under its
    /// new owner.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, LeaseStoreError>;

    /// Whether a live (unexpired) value exists under `key`.
    ///
    /// Not used by the lock protocol itself; exposed for test harnesses
    /// that assert lock state from outside the mutex.
    async fn exists(&self, key: &str) -> Result<bool, LeaseStoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: LeaseStore + ?Sized> LeaseStore for Arc<T> {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, LeaseStoreError> {
        (**self).set_if_absent(key, value, ttl).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, LeaseStoreError> {
        (**self).compare_and_delete(key, expected).await
    }

    async fn exists(&self, key: &str) -> Result<bool, LeaseStoreError> {
        (**self).exists(key).await
    }
}
