//! The purchase saga instance aggregate.

use chrono::{DateTime, Utc};
use common::{CorrelationId, Gil, ItemId, UserId};
use saga_store::{SagaInstance, Version};
use serde::{Deserialize, Serialize};

use crate::state::PurchaseState;

/// One purchase attempt, the aggregate root of the saga.
///
/// Keyed by the correlation ID, which equals the idempotency key supplied
/// by the requester. Created on the first `PurchaseRequested` event for an
/// unseen key and mutated only inside committed transitions; never
/// physically deleted here (retention is an external concern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseSaga {
    correlation_id: CorrelationId,
    user_id: UserId,
    item_id: ItemId,
    quantity: u32,
    /// Set exactly once, during the initial transition, before any
    /// downstream command referencing it is emitted.
    purchase_total: Option<Gil>,
    state: PurchaseState,
    /// Set only on entry to `Faulted`.
    error_message: Option<String>,
    received: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    version: Version,
}

impl PurchaseSaga {
    /// Creates an instance entering `Accepted` with its priced total.
    pub fn accepted(
        correlation_id: CorrelationId,
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
        purchase_total: Gil,
    ) -> Self {
        let received = Utc::now();
        Self {
            correlation_id,
            user_id,
            item_id,
            quantity,
            purchase_total: Some(purchase_total),
            state: PurchaseState::Accepted,
            error_message: None,
            received,
            last_updated: received,
            version: Version::initial(),
        }
    }

    /// Creates an instance entering `Faulted` directly, for a purchase
    /// whose pricing failed before anything downstream was asked to act.
    pub fn faulted(
        correlation_id: CorrelationId,
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
        error_message: impl Into<String>,
    ) -> Self {
        let received = Utc::now();
        Self {
            correlation_id,
            user_id,
            item_id,
            quantity,
            purchase_total: None,
            state: PurchaseState::Faulted,
            error_message: Some(error_message.into()),
            received,
            last_updated: received,
            version: Version::initial(),
        }
    }

    /// Moves the instance to `state`, refreshing `last_updated`.
    pub fn transition_to(&mut self, state: PurchaseState) {
        self.state = state;
        self.last_updated = Utc::now();
    }

    /// Records the failure message shown on the query path.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }
}

// Query methods
impl PurchaseSaga {
    /// Returns the buyer's ID.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the catalog item being purchased.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Returns the purchased quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the priced total, unset only for pricing failures.
    pub fn purchase_total(&self) -> Option<Gil> {
        self.purchase_total
    }

    /// Returns the current saga state.
    pub fn state(&self) -> PurchaseState {
        self.state
    }

    /// Returns the failure message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns when the purchase request was first received.
    pub fn received(&self) -> DateTime<Utc> {
        self.received
    }

    /// Returns when the instance last mutated.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

impl SagaInstance for PurchaseSaga {
    fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_instance_carries_priced_total() {
        let id = CorrelationId::new();
        let saga = PurchaseSaga::accepted(id, UserId::new(), ItemId::new(), 2, Gil::from_whole(20));

        assert_eq!(saga.correlation_id(), id);
        assert_eq!(saga.state(), PurchaseState::Accepted);
        assert_eq!(saga.purchase_total(), Some(Gil::from_whole(20)));
        assert_eq!(saga.quantity(), 2);
        assert!(saga.error_message().is_none());
        assert_eq!(saga.received(), saga.last_updated());
        assert_eq!(saga.version(), Version::initial());
    }

    #[test]
    fn faulted_instance_has_error_and_no_total() {
        let saga = PurchaseSaga::faulted(
            CorrelationId::new(),
            UserId::new(),
            ItemId::new(),
            1,
            "unknown item",
        );

        assert_eq!(saga.state(), PurchaseState::Faulted);
        assert_eq!(saga.error_message(), Some("unknown item"));
        assert!(saga.purchase_total().is_none());
    }

    #[test]
    fn transition_refreshes_last_updated() {
        let mut saga = PurchaseSaga::accepted(
            CorrelationId::new(),
            UserId::new(),
            ItemId::new(),
            1,
            Gil::from_whole(5),
        );
        let before = saga.last_updated();

        saga.transition_to(PurchaseState::ItemsGranted);
        assert_eq!(saga.state(), PurchaseState::ItemsGranted);
        assert!(saga.last_updated() >= before);
        // Received never changes after creation.
        assert_eq!(saga.received(), before);
    }

    #[test]
    fn serialization_roundtrip() {
        let saga = PurchaseSaga::accepted(
            CorrelationId::new(),
            UserId::new(),
            ItemId::new(),
            3,
            Gil::from_whole(30),
        );

        let json = serde_json::to_string(&saga).unwrap();
        let deserialized: PurchaseSaga = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.correlation_id(), saga.correlation_id());
        assert_eq!(deserialized.state(), PurchaseState::Accepted);
        assert_eq!(deserialized.purchase_total(), Some(Gil::from_whole(30)));
    }
}
