//! Push-notification seam for committed snapshots.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The channel is unreachable.
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Collaborator informed of every committed snapshot.
///
/// Fire-and-forget: the engine logs failures and never rolls back or
/// blocks the committed transition on them.
#[async_trait]
pub trait Notifier<I>: Send + Sync {
    /// Pushes the snapshot of a freshly committed instance.
    async fn notify(&self, snapshot: &I) -> Result<(), NotifyError>;
}

/// Notifier that discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

#[async_trait]
impl<I: Send + Sync> Notifier<I> for NullNotifier {
    async fn notify(&self, _snapshot: &I) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[derive(Default)]
struct NotifierState<I> {
    snapshots: Vec<I>,
    fail_on_notify: bool,
}

/// In-memory notifier recording every pushed snapshot, for tests and
/// single-process wiring.
#[derive(Clone)]
pub struct InMemoryNotifier<I> {
    state: Arc<RwLock<NotifierState<I>>>,
}

impl<I: Clone> InMemoryNotifier<I> {
    /// Creates a new empty in-memory notifier.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(NotifierState {
                snapshots: Vec::new(),
                fail_on_notify: false,
            })),
        }
    }

    /// Configures the notifier to fail every push until reset.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns every recorded snapshot in push order.
    pub fn snapshots(&self) -> Vec<I> {
        self.state.read().unwrap().snapshots.clone()
    }

    /// Returns the number of recorded snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.state.read().unwrap().snapshots.len()
    }
}

impl<I: Clone> Default for InMemoryNotifier<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<I: Clone + Send + Sync> Notifier<I> for InMemoryNotifier<I> {
    async fn notify(&self, snapshot: &I) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_notify {
            return Err(NotifyError::Unavailable("hub offline".to_string()));
        }
        state.snapshots.push(snapshot.clone());
        Ok(())
    }
}
