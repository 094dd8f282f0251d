//! Message bus seam and redelivery policy.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::CorrelationId;
use saga_store::Version;
use thiserror::Error;

use crate::definition::CorrelatedCommand;
use crate::outbox::SealedOutbox;

/// Errors from the message bus transport.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus is unreachable or failed transiently.
    #[error("message bus unavailable: {0}")]
    Unavailable(String),
}

/// Outbound side of the message bus.
///
/// Accepts only [`SealedOutbox`] batches, so dispatch is structurally tied
/// to a committed transition. Delivery is at-least-once; receivers key on
/// the correlation ID and must be idempotent.
#[async_trait]
pub trait CommandBus<C: CorrelatedCommand>: Send + Sync {
    /// Publishes a sealed batch of commands.
    async fn publish(&self, batch: SealedOutbox<C>) -> Result<(), BusError>;
}

/// Redelivery policy for transient dispatch failures.
///
/// Business outcomes never reach the transport as errors — the saga
/// transitions to its fault state instead — so everything this policy
/// retries is infrastructure trouble.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total delivery attempts, including the first.
    pub attempts: u32,
    /// Fixed interval between attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt count and fixed interval.
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// An immediate policy for tests (no sleeping between attempts).
    pub const fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, 5 seconds apart.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

#[derive(Default)]
struct BusState<C> {
    published: Vec<(Version, C)>,
    fail_on_publish: bool,
}

/// In-memory command bus recording every published command.
///
/// Stands in for the broker in tests and single-process wiring.
#[derive(Clone)]
pub struct InMemoryBus<C> {
    state: Arc<RwLock<BusState<C>>>,
}

impl<C: CorrelatedCommand> InMemoryBus<C> {
    /// Creates a new empty in-memory bus.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BusState {
                published: Vec::new(),
                fail_on_publish: false,
            })),
        }
    }

    /// Configures the bus to fail every publish until reset.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Returns every published command in dispatch order.
    pub fn published(&self) -> Vec<C> {
        self.state
            .read()
            .unwrap()
            .published
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Returns the number of published commands.
    pub fn published_count(&self) -> usize {
        self.state.read().unwrap().published.len()
    }

    /// Returns the commands published for one saga instance, with the
    /// committed version each batch was tagged with.
    pub fn published_for(&self, correlation_id: CorrelationId) -> Vec<(Version, C)> {
        self.state
            .read()
            .unwrap()
            .published
            .iter()
            .filter(|(_, c)| c.correlation_id() == correlation_id)
            .cloned()
            .collect()
    }
}

impl<C: CorrelatedCommand> Default for InMemoryBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: CorrelatedCommand + 'static> CommandBus<C> for InMemoryBus<C> {
    async fn publish(&self, batch: SealedOutbox<C>) -> Result<(), BusError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_publish {
            return Err(BusError::Unavailable("broker offline".to_string()));
        }

        let version = batch.version();
        for command in batch.into_commands() {
            tracing::debug!(command = command.name(), %version, "command published");
            state.published.push((version, command));
        }
        Ok(())
    }
}
