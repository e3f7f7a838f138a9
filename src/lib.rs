//! Lease-based distributed mutual exclusion over a shared key-value store.
//!
//! Independent processes that share no memory coordinate through a store
//! offering two atomic primitives: a conditional set with expiry and a
//! compare-and-delete. At most one holder owns a named lock at any
//! instant; a crashed holder's lease is reclaimed by the store's TTL.
//!
//! This is a fencing lock, not a consensus protocol: safety rests on the
//! single coordinating store rather than a quorum, and a holder that
//! stalls past its lease TTL can lose the lock silently — the accepted
//! trade-off of lease-based locking.
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use fencelock::DistributedMutex;
//! use fencelock::InMemoryLeaseStore;
//!
//! let store = InMemoryLeaseStore::new();
//! let mut mutex = DistributedMutex::new(store, "reindex", Duration::from_secs(30))?;
//!
//! if mutex.acquire(Duration::from_secs(5)).await? {
//!     // protected work
//!     mutex.release().await?;
//! }
//!
//! // Or scoped, with release guaranteed on completion:
//! let done = mutex.synchronized(Duration::from_secs(5), || async {
//!     // protected work
//! }).await?;
//! ```

mod error;
mod factory;
mod memory;
mod mutex;
mod store;

pub use error::LeaseStoreError;
pub use error::MutexError;
pub use factory::MutexFactory;
pub use memory::InMemoryLeaseStore;
pub use mutex::DistributedMutex;
pub use mutex::POLL_INTERVAL;
pub use store::LeaseStore;
