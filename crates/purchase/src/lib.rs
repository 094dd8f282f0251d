//! Purchase saga: coordinates granting items and debiting gil for one
//! purchase, with compensation when the debit fails after the grant.
//!
//! A purchase is keyed by the buyer-supplied idempotency key, which is
//! also the correlation ID on every event and command. The saga moves
//! through `Accepted`, `ItemsGranted` and into one of the two terminal
//! states `Completed` or `Faulted`; failures downstream services report
//! are ordinary transitions into `Faulted`, and a debit failure after the
//! items were granted compensates by returning them.

pub mod commands;
pub mod definition;
pub mod events;
pub mod instance;
pub mod pricing;
pub mod query;
pub mod state;

pub use commands::PurchaseCommand;
pub use definition::PurchaseSagaDefinition;
pub use events::{PurchaseEvent, PurchaseEventKind};
pub use instance::PurchaseSaga;
pub use pricing::{InMemoryCatalog, PriceQuote, PricingActivity, PricingError};
pub use query::{PurchaseSnapshot, PurchaseStatus};
pub use state::PurchaseState;
