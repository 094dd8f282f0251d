//! Pricing activity trait and in-memory catalog implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Gil, ItemId};
use thiserror::Error;

/// Result of a successful price resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    /// Price of a single item.
    pub unit_price: Gil,
    /// Total cost for the requested quantity.
    pub total: Gil,
}

/// Errors from price resolution.
///
/// All of these are business failures for the saga: the initial
/// transition routes them straight into `Faulted` instead of letting the
/// transport retry the event.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The item does not exist in the catalog. Deterministic; never
    /// retried.
    #[error("unknown item '{0}'")]
    UnknownItem(ItemId),

    /// The total overflowed the gil representation.
    #[error("price overflow for quantity {0}")]
    Overflow(u32),

    /// The pricing source is unreachable.
    #[error("pricing unavailable: {0}")]
    Unavailable(String),
}

/// Stateless computation resolving an item's price and total cost,
/// consulted synchronously during the initial transition.
#[async_trait]
pub trait PricingActivity: Send + Sync {
    /// Resolves the unit price and total for `quantity` of `item_id`.
    async fn resolve(&self, item_id: ItemId, quantity: u32) -> Result<PriceQuote, PricingError>;
}

#[derive(Debug, Default)]
struct CatalogState {
    prices: HashMap<ItemId, Gil>,
    fail_on_resolve: bool,
}

/// In-memory catalog for tests and single-process wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item with its unit price, returning self for chaining.
    pub fn with_item(self, item_id: ItemId, unit_price: Gil) -> Self {
        self.add_item(item_id, unit_price);
        self
    }

    /// Adds or replaces an item's unit price.
    pub fn add_item(&self, item_id: ItemId, unit_price: Gil) {
        self.state.write().unwrap().prices.insert(item_id, unit_price);
    }

    /// Configures the catalog to fail resolution as unavailable.
    pub fn set_fail_on_resolve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_resolve = fail;
    }

    /// Returns the number of catalog items.
    pub fn item_count(&self) -> usize {
        self.state.read().unwrap().prices.len()
    }
}

#[async_trait]
impl PricingActivity for InMemoryCatalog {
    async fn resolve(&self, item_id: ItemId, quantity: u32) -> Result<PriceQuote, PricingError> {
        let state = self.state.read().unwrap();

        if state.fail_on_resolve {
            return Err(PricingError::Unavailable("catalog offline".to_string()));
        }

        let unit_price = *state
            .prices
            .get(&item_id)
            .ok_or(PricingError::UnknownItem(item_id))?;
        let total = unit_price
            .checked_mul(quantity)
            .ok_or(PricingError::Overflow(quantity))?;

        Ok(PriceQuote { unit_price, total })
    }
}
