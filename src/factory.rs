//! Factory for mutexes sharing one store handle and a default TTL.

use std::sync::Arc;
use std::time::Duration;

use crate::error::InvalidTtlSnafu;
use crate::error::MutexError;
use crate::mutex::DistributedMutex;
use crate::store::LeaseStore;

/// Creates [`DistributedMutex`] instances over a shared store.
///
/// Wiring the store and TTL once at startup keeps lock call sites free of
/// configuration, and keeps the store an explicit, swappable dependency
/// rather than process-wide hidden state.
pub struct MutexFactory<S: LeaseStore + ?Sized> {
    store: Arc<S>,
    default_ttl: Duration,
}

impl<S: LeaseStore + ?Sized + 'static> MutexFactory<S> {
    /// Lease TTL used by [`MutexFactory::with_default_ttl`].
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

    /// Create a factory with an explicit default TTL.
    ///
    /// The TTL is validated here once, so every mutex the factory hands
    /// out is well-formed.
    pub fn new(store: Arc<S>, default_ttl: Duration) -> Result<Self, MutexError> {
        if default_ttl.is_zero() {
            return InvalidTtlSnafu.fail();
        }
        Ok(Self { store, default_ttl })
    }

    /// Create a factory with the stock 30 second TTL.
    pub fn with_default_ttl(store: Arc<S>) -> Self {
        Self {
            store,
            default_ttl: Self::DEFAULT_TTL,
        }
    }

    /// Build a mutex for `name` with the factory's default TTL.
    pub fn create(&self, name: impl Into<String>) -> Result<DistributedMutex<S>, MutexError> {
        DistributedMutex::new(self.store.clone(), name, self.default_ttl)
    }

    /// Build a mutex for `name` with an explicit TTL.
    pub fn create_with_ttl(&self, name: impl Into<String>, ttl: Duration) -> Result<DistributedMutex<S>, MutexError> {
        DistributedMutex::new(self.store.clone(), name, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLeaseStore;

    #[test]
    fn zero_default_ttl_is_rejected() {
        let store = InMemoryLeaseStore::new();
        assert!(matches!(
            MutexFactory::new(store, Duration::ZERO),
            Err(MutexError::InvalidTtl)
        ));
    }

    #[test]
    fn zero_ttl_override_is_rejected() {
        let store = InMemoryLeaseStore::new();
        let factory = MutexFactory::with_default_ttl(store);
        assert!(matches!(
            factory.create_with_ttl("job", Duration::ZERO),
            Err(MutexError::InvalidTtl)
        ));
    }

    #[tokio::test]
    async fn factory_locks_for_the_same_name_contend() {
        let store = InMemoryLeaseStore::new();
        let factory = MutexFactory::new(store, Duration::from_secs(10)).unwrap();

        let mut first = factory.create("migration").unwrap();
        let mut second = factory.create("migration").unwrap();
        assert_eq!(first.key(), second.key());

        assert!(first.acquire(Duration::ZERO).await.unwrap());
        assert!(!second.acquire(Duration::ZERO).await.unwrap());
        first.release().await.unwrap();
    }
}
