//! Read-side view of a purchase saga instance.

use chrono::{DateTime, Utc};
use common::{CorrelationId, Gil, ItemId, UserId};
use saga_store::{SagaInstance, SagaStore, Version};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::instance::PurchaseSaga;
use crate::state::PurchaseState;

/// Serializable snapshot of one purchase, returned by the status query
/// and pushed to notifiers on every committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseSnapshot {
    pub correlation_id: CorrelationId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub purchase_total: Option<Gil>,
    pub state: PurchaseState,
    pub error_message: Option<String>,
    pub received: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: Version,
}

impl From<&PurchaseSaga> for PurchaseSnapshot {
    fn from(saga: &PurchaseSaga) -> Self {
        Self {
            correlation_id: saga.correlation_id(),
            user_id: saga.user_id(),
            item_id: saga.item_id(),
            quantity: saga.quantity(),
            purchase_total: saga.purchase_total(),
            state: saga.state(),
            error_message: saga.error_message().map(str::to_owned),
            received: saga.received(),
            last_updated: saga.last_updated(),
            version: saga.version(),
        }
    }
}

/// Point-read of purchase status by correlation ID.
///
/// Reads committed state only; an in-flight transition is invisible until
/// its version lands in the store.
pub struct PurchaseStatus<S> {
    store: Arc<S>,
}

impl<S> PurchaseStatus<S>
where
    S: SagaStore<PurchaseSaga>,
{
    /// Wraps the store the dispatch path commits into.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the snapshot for `correlation_id`, or `None` when no
    /// purchase with that idempotency key has been accepted yet.
    pub async fn get(
        &self,
        correlation_id: CorrelationId,
    ) -> saga_store::Result<Option<PurchaseSnapshot>> {
        let instance = self.store.load(correlation_id).await?;
        Ok(instance.as_ref().map(PurchaseSnapshot::from))
    }
}
