use async_trait::async_trait;
use common::CorrelationId;

use crate::{Result, SagaInstance, Version};

/// Core trait for saga store implementations.
///
/// A store persists one instance per correlation ID. All operations are
/// atomic with respect to a single instance; no cross-instance transactions
/// are required. Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SagaStore<I: SagaInstance>: Send + Sync {
    /// Loads the instance stored under the given correlation ID.
    ///
    /// Returns `None` if no instance exists for that key, which represents
    /// the saga's implicit pre-initial state.
    async fn load(&self, correlation_id: CorrelationId) -> Result<Option<I>>;

    /// Persists a brand-new instance at [`Version::first`].
    ///
    /// Fails with [`crate::SagaStoreError::DuplicateCorrelation`] if an
    /// instance already exists under the same correlation ID.
    ///
    /// Returns the committed version.
    async fn create(&self, instance: I) -> Result<Version>;

    /// Persists an updated instance, incrementing its version by 1.
    ///
    /// Fails with [`crate::SagaStoreError::ConcurrencyConflict`] if
    /// `expected_version` does not match the currently stored version; the
    /// caller must reload and retry against fresh state.
    ///
    /// Returns the committed version (`expected_version.next()`).
    async fn commit_update(&self, instance: I, expected_version: Version) -> Result<Version>;
}
