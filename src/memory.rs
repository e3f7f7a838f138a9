//! In-memory lease store for tests and simulation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::LeaseStoreError;
use crate::store::LeaseStore;

#[derive(Debug, Clone)]
struct LeaseRecord {
    value: String,
    deadline: Instant,
}

impl LeaseRecord {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline > now
    }
}

/// In-memory [`LeaseStore`] with genuine TTL semantics.
///
/// Expiry is lazy: entries past their deadline are treated as absent by
/// every operation and purged on contact. Time is read from the tokio
/// clock, so the store is deterministic under a paused test clock.
/// Single process only, no persistence.
#[derive(Default)]
pub struct InMemoryLeaseStore {
    inner: Mutex<HashMap<String, LeaseRecord>>,
}

impl InMemoryLeaseStore {
    /// Create an empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Drop `key` unconditionally, live or not.
    ///
    /// Test-harness hook for simulating a lease lost to store-side expiry
    /// or an external takeover.
    pub async fn evict(&self, key: &str) {
        self.inner.lock().await.remove(key);
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, LeaseStoreError> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        if let Some(record) = inner.get(key) {
            if record.is_live(now) {
                return Ok(false);
            }
        }
        inner.insert(
            key.to_string(),
            LeaseRecord {
                value: value.to_string(),
                deadline: now + ttl,
            },
        );
        Ok(true)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, LeaseStoreError> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let Some(record) = inner.get(key) else {
            return Ok(false);
        };
        if !record.is_live(now) {
            // Expired entries behave exactly like absent ones.
            inner.remove(key);
            return Ok(false);
        }
        if record.value != expected {
            return Ok(false);
        }
        inner.remove(key);
        Ok(true)
    }

    async fn exists(&self, key: &str) -> Result<bool, LeaseStoreError> {
        let inner = self.inner.lock().await;
        let now = Instant::now();
        Ok(inner.get(key).is_some_and(|record| record.is_live(now)))
    }
}
