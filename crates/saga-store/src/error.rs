use common::CorrelationId;
use thiserror::Error;

use crate::version::Version;

/// Errors that can occur when interacting with the saga store.
#[derive(Debug, Error)]
pub enum SagaStoreError {
    /// A concurrency conflict occurred when committing an update.
    /// The expected version did not match the stored version.
    ///
    /// Expected and recoverable: callers reload the instance and retry the
    /// transition against fresh state.
    #[error(
        "Concurrency conflict for saga {correlation_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        correlation_id: CorrelationId,
        expected: Version,
        actual: Version,
    },

    /// An instance with this correlation ID already exists.
    ///
    /// The store's uniqueness constraint on the correlation key is the
    /// mechanism preventing duplicate saga creation for repeated
    /// submissions.
    #[error("Saga already exists for correlation ID {0}")]
    DuplicateCorrelation(CorrelationId),

    /// The backing store is unreachable or failed transiently.
    #[error("Saga store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for saga store operations.
pub type Result<T> = std::result::Result<T, SagaStoreError>;
