//! Error types for the mutex and its store adapters.

use snafu::Snafu;

/// Errors reported by a lease store adapter.
///
/// Adapters must keep outage distinct from contention: a communication
/// failure is an `Err`, never a `false` return, so the acquisition loop
/// cannot busy-poll a dead store.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LeaseStoreError {
    /// Store unreachable or not accepting commands.
    #[snafu(display("lease store unavailable: {reason}"))]
    Unavailable {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// The store answered but could not execute the operation.
    #[snafu(display("lease store backend error: {reason}"))]
    Backend {
        /// Human-readable description of the failure.
        reason: String,
    },
}

/// Errors from the distributed mutex.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MutexError {
    /// TTL given at construction is not a positive duration.
    #[snafu(display("TTL must be a positive duration, got zero"))]
    InvalidTtl,

    /// Release found no lease matching this instance's token: the lease
    /// expired before release and may have been taken by another holder,
    /// so mutual exclusion may already have been violated.
    #[snafu(display("unable to release lock '{name}': lease expired or held by another owner"))]
    ReleaseConflict {
        /// Name of the lock whose release failed.
        name: String,
    },

    /// The underlying store failed.
    #[snafu(display("lease store error: {source}"))]
    Store {
        /// The underlying error.
        source: LeaseStoreError,
    },
}

impl From<LeaseStoreError> for MutexError {
    fn from(source: LeaseStoreError) -> Self {
        MutexError::Store { source }
    }
}
