//! The saga definition contract consumed by the transition engine.

use async_trait::async_trait;
use common::CorrelationId;
use saga_store::SagaInstance;

use crate::outbox::Outbox;

/// Trait for inbound saga events.
///
/// Every event carries the correlation ID of the instance it belongs to.
/// Correlation is always explicit — fault events embed the correlation ID
/// of the command that failed, never rely on delivery order or queue
/// identity.
pub trait CorrelatedEvent: Send + Sync {
    /// Discriminant type used to key the transition table.
    type Kind: Copy + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync;

    /// Returns the event's kind for transition lookup.
    fn kind(&self) -> Self::Kind;

    /// Returns the correlation ID of the owning saga instance.
    fn correlation_id(&self) -> CorrelationId;

    /// Returns the event name for logging.
    fn name(&self) -> &'static str;
}

/// Trait for outbound saga commands.
///
/// Downstream consumers are keyed by the correlation ID and must treat
/// redelivered commands idempotently.
pub trait CorrelatedCommand: Clone + Send + Sync {
    /// Returns the correlation ID of the originating saga instance.
    fn correlation_id(&self) -> CorrelationId;

    /// Returns the command name for logging.
    fn name(&self) -> &'static str;
}

/// Result of applying an event to an existing instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A handler ran and the working copy must be committed.
    Mutated,
    /// No handler is registered for (current state, event kind); the event
    /// is acknowledged without mutation.
    Ignored,
}

/// A concrete saga: its instance type, its events and commands, and the
/// transition logic between them.
///
/// The engine drives the lifecycle; the definition owns the transition
/// table. Business failures are expressed as transitions (for the purchase
/// saga, into `Faulted`), never as errors returned to the engine.
#[async_trait]
pub trait SagaDefinition: Send + Sync {
    /// The persisted aggregate root of one saga execution.
    type Instance: SagaInstance + 'static;

    /// Inbound events this saga reacts to.
    type Event: CorrelatedEvent;

    /// Outbound commands this saga emits.
    type Command: CorrelatedCommand;

    /// Handles an event for a correlation ID with no stored instance.
    ///
    /// Returns the newly created instance if this event kind is allowed to
    /// start the saga, or `None` to acknowledge the event as a no-op
    /// (stale delivery for an unknown key). May queue commands into the
    /// outbox and invoke activities such as pricing resolution.
    async fn start(
        &self,
        event: &Self::Event,
        outbox: &mut Outbox<Self::Command>,
    ) -> Option<Self::Instance>;

    /// Applies an event to an existing instance's working copy.
    ///
    /// Looks up the handler registered for (current state, event kind) and
    /// executes it; [`Applied::Ignored`] means no handler exists, which
    /// covers duplicates and deliveries against terminal states.
    async fn advance(
        &self,
        instance: &mut Self::Instance,
        event: &Self::Event,
        outbox: &mut Outbox<Self::Command>,
    ) -> Applied;
}
