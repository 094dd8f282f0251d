//! Generic event-dispatch machinery for durable saga state machines.
//!
//! One execution per inbound event: resolve the correlation ID, load the
//! instance from the [`saga_store::SagaStore`], let the saga definition
//! compute the new state plus side-effect commands, commit the new state
//! with an optimistic version check, and only then hand the buffered
//! commands to the message bus. Concurrency conflicts restart the cycle
//! against freshly loaded state, up to a bounded number of attempts.
//!
//! Business outcomes are transitions, never errors: an event with no
//! registered handler for the instance's current state is acknowledged as
//! a no-op, which is what makes redelivery and duplicate submissions safe.

pub mod bus;
pub mod definition;
pub mod engine;
pub mod error;
pub mod notify;
pub mod outbox;
pub mod table;

pub use bus::{BusError, CommandBus, InMemoryBus, RetryPolicy};
pub use definition::{Applied, CorrelatedCommand, CorrelatedEvent, SagaDefinition};
pub use engine::{DispatchOutcome, TransitionEngine};
pub use error::EngineError;
pub use notify::{InMemoryNotifier, Notifier, NotifyError, NullNotifier};
pub use outbox::{Outbox, SealedOutbox};
pub use table::TransitionTable;
