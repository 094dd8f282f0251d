//! Inbound purchase saga events.

use common::{CorrelationId, ItemId, UserId};
use saga_engine::CorrelatedEvent;
use serde::{Deserialize, Serialize};

/// Events driving the purchase saga.
///
/// Fault events carry the correlation ID embedded in the command that
/// failed; correlation is never inferred from delivery order or queue
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PurchaseEvent {
    /// A buyer submitted a purchase (correlation ID = idempotency key).
    PurchaseRequested(PurchaseRequestedData),

    /// The inventory service granted the requested items.
    InventoryItemsGranted(InventoryItemsGrantedData),

    /// The inventory service could not grant the items.
    GrantItemsFaulted(FaultedData),

    /// The ledger service debited the purchase total.
    GilDebited(GilDebitedData),

    /// The ledger service could not debit the purchase total.
    DebitGilFaulted(FaultedData),
}

/// Kind discriminant for transition-table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurchaseEventKind {
    PurchaseRequested,
    InventoryItemsGranted,
    GrantItemsFaulted,
    GilDebited,
    DebitGilFaulted,
}

/// Data for the PurchaseRequested event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequestedData {
    /// The buyer.
    pub user_id: UserId,
    /// The catalog item to purchase.
    pub item_id: ItemId,
    /// How many of the item (positive).
    pub quantity: u32,
    /// The client-supplied idempotency key, used as the correlation key.
    pub correlation_id: CorrelationId,
}

/// Data for the InventoryItemsGranted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemsGrantedData {
    /// Correlation ID of the `GrantItems` command that succeeded.
    pub correlation_id: CorrelationId,
}

/// Data for the GilDebited event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GilDebitedData {
    /// Correlation ID of the `DebitGil` command that succeeded.
    pub correlation_id: CorrelationId,
}

/// Data for fault events reported by downstream services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultedData {
    /// Correlation ID of the command that failed.
    pub correlation_id: CorrelationId,
    /// Why the command failed, as reported by the service.
    pub reason: String,
}

// Convenience constructors
impl PurchaseEvent {
    /// Creates a PurchaseRequested event.
    pub fn requested(
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
        correlation_id: CorrelationId,
    ) -> Self {
        PurchaseEvent::PurchaseRequested(PurchaseRequestedData {
            user_id,
            item_id,
            quantity,
            correlation_id,
        })
    }

    /// Creates an InventoryItemsGranted event.
    pub fn items_granted(correlation_id: CorrelationId) -> Self {
        PurchaseEvent::InventoryItemsGranted(InventoryItemsGrantedData { correlation_id })
    }

    /// Creates a GrantItemsFaulted event.
    pub fn grant_items_faulted(correlation_id: CorrelationId, reason: impl Into<String>) -> Self {
        PurchaseEvent::GrantItemsFaulted(FaultedData {
            correlation_id,
            reason: reason.into(),
        })
    }

    /// Creates a GilDebited event.
    pub fn gil_debited(correlation_id: CorrelationId) -> Self {
        PurchaseEvent::GilDebited(GilDebitedData { correlation_id })
    }

    /// Creates a DebitGilFaulted event.
    pub fn debit_gil_faulted(correlation_id: CorrelationId, reason: impl Into<String>) -> Self {
        PurchaseEvent::DebitGilFaulted(FaultedData {
            correlation_id,
            reason: reason.into(),
        })
    }
}

impl CorrelatedEvent for PurchaseEvent {
    type Kind = PurchaseEventKind;

    fn kind(&self) -> PurchaseEventKind {
        match self {
            PurchaseEvent::PurchaseRequested(_) => PurchaseEventKind::PurchaseRequested,
            PurchaseEvent::InventoryItemsGranted(_) => PurchaseEventKind::InventoryItemsGranted,
            PurchaseEvent::GrantItemsFaulted(_) => PurchaseEventKind::GrantItemsFaulted,
            PurchaseEvent::GilDebited(_) => PurchaseEventKind::GilDebited,
            PurchaseEvent::DebitGilFaulted(_) => PurchaseEventKind::DebitGilFaulted,
        }
    }

    fn correlation_id(&self) -> CorrelationId {
        match self {
            PurchaseEvent::PurchaseRequested(data) => data.correlation_id,
            PurchaseEvent::InventoryItemsGranted(data) => data.correlation_id,
            PurchaseEvent::GrantItemsFaulted(data) => data.correlation_id,
            PurchaseEvent::GilDebited(data) => data.correlation_id,
            PurchaseEvent::DebitGilFaulted(data) => data.correlation_id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PurchaseEvent::PurchaseRequested(_) => "PurchaseRequested",
            PurchaseEvent::InventoryItemsGranted(_) => "InventoryItemsGranted",
            PurchaseEvent::GrantItemsFaulted(_) => "GrantItemsFaulted",
            PurchaseEvent::GilDebited(_) => "GilDebited",
            PurchaseEvent::DebitGilFaulted(_) => "DebitGilFaulted",
        }
    }
}
