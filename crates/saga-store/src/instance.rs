//! The stored-instance contract.

use common::CorrelationId;

use crate::version::Version;

/// Trait for saga instances that can be persisted in a [`crate::SagaStore`].
///
/// An instance is the aggregate root of one saga execution, keyed by its
/// correlation ID. The store stamps the version on create and on every
/// committed update; instance code never sets it directly.
pub trait SagaInstance: Clone + Send + Sync {
    /// Returns the instance's correlation ID (its primary key).
    ///
    /// Immutable for the lifetime of the instance.
    fn correlation_id(&self) -> CorrelationId;

    /// Returns the version of the last committed transition.
    fn version(&self) -> Version;

    /// Sets the instance version.
    ///
    /// Called by the store when a create or update commits.
    fn set_version(&mut self, version: Version);
}
