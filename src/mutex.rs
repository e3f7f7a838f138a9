//! Lease-based distributed mutex.
//!
//! Mutual exclusion across processes that share nothing but a key-value
//! store. A holder is identified by a random token stored under a derived
//! key with a TTL; release deletes the key only if the stored token still
//! matches, so a lease that expired and was re-acquired by someone else is
//! never deleted out from under its new owner.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;
use tokio::time::Instant;
use tracing::debug;
use tracing::warn;

use crate::error::InvalidTtlSnafu;
use crate::error::MutexError;
use crate::error::ReleaseConflictSnafu;
use crate::store::LeaseStore;

/// Namespace prefix mixed into every derived key so mutex keys cannot
/// collide with other users of the same store.
const KEY_NAMESPACE: &str = "fencelock/mutex/";

/// Fixed interval between conditional-write attempts while waiting for a
/// contended lock. Coarse on purpose: acquisition latency is traded for
/// store load. An `acquire(timeout)` that loses returns after an elapsed
/// time in `[timeout, timeout + POLL_INTERVAL)`.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Bytes of entropy in an ownership token.
const TOKEN_BYTES: usize = 20;

/// A distributed mutex guarding one named lease.
///
/// One instance per (name, process) pairing; reusable across many
/// acquire/release cycles. Both `acquire` and `release` take `&mut self`,
/// so concurrent use of one instance from several tasks is ruled out by
/// the type system — contention is expected only across instances and
/// processes, and is arbitrated entirely by the store.
pub struct DistributedMutex<S: LeaseStore + ?Sized> {
    store: Arc<S>,
    name: String,
    key: String,
    ttl: Duration,
    token: Option<String>,
    /// Local estimate of when the current lease expires. Advisory only:
    /// the store's TTL countdown is authoritative.
    lease_deadline: Option<Instant>,
}

impl<S: LeaseStore + ?Sized + 'static> DistributedMutex<S> {
    /// Create a mutex for `name` over `store`.
    ///
    /// `ttl` bounds how long an unreleased lease survives a crashed
    /// holder. Returns [`MutexError::InvalidTtl`] for a zero TTL.
    pub fn new(store: Arc<S>, name: impl Into<String>, ttl: Duration) -> Result<Self, MutexError> {
        if ttl.is_zero() {
            return InvalidTtlSnafu.fail();
        }
        let name = name.into();
        let key = derive_key(&name);
        Ok(Self {
            store,
            name,
            key,
            ttl,
            token: None,
            lease_deadline: None,
        })
    }

    /// The lock name this mutex guards.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The store key this mutex's lease lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this instance believes it currently holds a live lease.
    ///
    /// Advisory: under clock drift the store may have expired the lease
    /// already, or may still consider it live after this returns false.
    pub fn is_acquired(&self) -> bool {
        match (&self.token, self.lease_deadline) {
            (Some(_), Some(deadline)) => Instant::now() < deadline,
            _ => false,
        }
    }

    /// Attempt to acquire the lock, polling until success or `timeout`.
    ///
    /// Returns `Ok(true)` on acquisition and `Ok(false)` when the lock
    /// stayed busy for the whole timeout — contention is an expected
    /// outcome, not an error. A zero timeout still attempts the
    /// conditional write exactly once. Re-entrant acquisition by an
    /// instance that already holds a live lease is rejected immediately.
    ///
    /// No fairness guarantee: under contention, acquisition order across
    /// competing processes is not FIFO.
    pub async fn acquire(&mut self, timeout: Duration) -> Result<bool, MutexError> {
        if self.is_acquired() {
            debug!(name = %self.name, "acquire rejected: this instance already holds the lease");
            return Ok(false);
        }

        let deadline = Instant::now() + timeout;
        let token = generate_token();

        loop {
            if self.store.set_if_absent(&self.key, &token, self.ttl).await? {
                self.lease_deadline = Some(Instant::now() + self.ttl);
                self.token = Some(token);
                debug!(name = %self.name, ttl_ms = self.ttl.as_millis() as u64, "lease acquired");
                return Ok(true);
            }
            if Instant::now() >= deadline {
                debug!(name = %self.name, "acquisition timed out: lock busy");
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Release the lock.
    ///
    /// When no lease is believed held (never acquired, already released,
    /// or locally expired) this is an idempotent no-op, safe to call
    /// defensively. Otherwise the stored token is atomically compared and
    /// deleted; if no matching lease was found the lease outlived its TTL
    /// while still held from the caller's perspective, and
    /// [`MutexError::ReleaseConflict`] is returned rather than silently
    /// succeeding.
    pub async fn release(&mut self) -> Result<(), MutexError> {
        let token = match (&self.token, self.lease_deadline) {
            (Some(token), Some(deadline)) if Instant::now() < deadline => token.clone(),
            _ => {
                self.token = None;
                self.lease_deadline = None;
                return Ok(());
            }
        };

        // A store failure propagates before local state is cleared, so the
        // caller can retry the release.
        let deleted = self.store.compare_and_delete(&self.key, &token).await?;
        self.token = None;
        self.lease_deadline = None;

        if !deleted {
            warn!(name = %self.name, "release found no matching lease: expired or taken by another owner");
            return ReleaseConflictSnafu { name: self.name.clone() }.fail();
        }

        debug!(name = %self.name, "lease released");
        Ok(())
    }

    /// Acquire the lock, run `critical`, and release on completion.
    ///
    /// Returns `Ok(None)` without running `critical` when the lock stayed
    /// busy for the whole timeout. The release runs on every completion
    /// path of the critical section; if the returned future is cancelled
    /// mid-section the lease is reclaimed by the store's TTL instead.
    pub async fn synchronized<T, F, Fut>(&mut self, timeout: Duration, critical: F) -> Result<Option<T>, MutexError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.acquire(timeout).await? {
            return Ok(None);
        }
        let value = critical().await;
        self.release().await?;
        Ok(Some(value))
    }
}

/// Derive the store key for a lock name.
///
/// All processes locking the same name must address the same entry, and
/// distinct names must never collide, so the key is a hex SHA-256 of the
/// namespaced name.
fn derive_key(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(KEY_NAMESPACE.as_bytes());
    hasher.update(name.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a fresh ownership token: [`TOKEN_BYTES`] random bytes,
/// hex-encoded. Unpredictable so a third party cannot forge a release.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
