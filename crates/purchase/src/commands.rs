//! Outbound commands to the inventory and ledger services.

use common::{CorrelationId, Gil, ItemId, UserId};
use saga_engine::CorrelatedCommand;
use serde::{Deserialize, Serialize};

/// Commands the purchase saga emits to downstream services.
///
/// Every command embeds the saga's correlation ID so its fault event can
/// be routed back to the originating instance, and so receivers can
/// deduplicate at-least-once deliveries. `SubstractItems` keeps the
/// inventory service's wire-contract spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PurchaseCommand {
    /// Ask the inventory service to grant items to the buyer.
    GrantItems(GrantItemsData),

    /// Ask the ledger service to debit the purchase total.
    DebitGil(DebitGilData),

    /// Compensation: return previously granted items.
    SubstractItems(SubstractItemsData),
}

/// Data for the GrantItems command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantItemsData {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub correlation_id: CorrelationId,
}

/// Data for the DebitGil command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitGilData {
    pub user_id: UserId,
    pub gil: Gil,
    pub correlation_id: CorrelationId,
}

/// Data for the SubstractItems compensation command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstractItemsData {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub correlation_id: CorrelationId,
}

// Convenience constructors
impl PurchaseCommand {
    /// Creates a GrantItems command.
    pub fn grant_items(
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
        correlation_id: CorrelationId,
    ) -> Self {
        PurchaseCommand::GrantItems(GrantItemsData {
            user_id,
            item_id,
            quantity,
            correlation_id,
        })
    }

    /// Creates a DebitGil command.
    pub fn debit_gil(user_id: UserId, gil: Gil, correlation_id: CorrelationId) -> Self {
        PurchaseCommand::DebitGil(DebitGilData {
            user_id,
            gil,
            correlation_id,
        })
    }

    /// Creates a SubstractItems compensation command.
    pub fn substract_items(
        user_id: UserId,
        item_id: ItemId,
        quantity: u32,
        correlation_id: CorrelationId,
    ) -> Self {
        PurchaseCommand::SubstractItems(SubstractItemsData {
            user_id,
            item_id,
            quantity,
            correlation_id,
        })
    }
}

impl CorrelatedCommand for PurchaseCommand {
    fn correlation_id(&self) -> CorrelationId {
        match self {
            PurchaseCommand::GrantItems(data) => data.correlation_id,
            PurchaseCommand::DebitGil(data) => data.correlation_id,
            PurchaseCommand::SubstractItems(data) => data.correlation_id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PurchaseCommand::GrantItems(_) => "GrantItems",
            PurchaseCommand::DebitGil(_) => "DebitGil",
            PurchaseCommand::SubstractItems(_) => "SubstractItems",
        }
    }
}
