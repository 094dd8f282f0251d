//! Engine error types.

use common::CorrelationId;
use saga_store::SagaStoreError;
use thiserror::Error;

use crate::bus::BusError;

/// Errors surfaced by the transition engine.
///
/// Business failures never appear here: the saga definition expresses them
/// as transitions into its fault state, so everything below is
/// infrastructure trouble or an exhausted conflict-retry budget.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Saga store error.
    #[error("saga store error: {0}")]
    Store(#[from] SagaStoreError),

    /// Command dispatch failed after the transition committed.
    ///
    /// The state change is durable; redelivery of the inbound event
    /// degrades dispatch to at-least-once.
    #[error("command dispatch error: {0}")]
    Dispatch(#[from] BusError),

    /// The bounded conflict-retry budget was exceeded.
    ///
    /// A reportable transient failure, not data corruption: every attempt
    /// either committed fully or not at all.
    #[error("transition retries exhausted for saga {correlation_id} after {attempts} attempts")]
    RetriesExhausted {
        correlation_id: CorrelationId,
        attempts: u32,
    },
}

impl EngineError {
    /// Returns true if the transport may redeliver the inbound event.
    ///
    /// Conflicts and duplicate-create races are handled inside the engine;
    /// if one still escapes, redelivering it would not help.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Store(SagaStoreError::Unavailable(_)) => true,
            EngineError::Store(_) => false,
            EngineError::Dispatch(_) => true,
            EngineError::RetriesExhausted { .. } => true,
        }
    }
}
