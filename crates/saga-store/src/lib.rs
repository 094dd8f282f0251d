//! Durable keyed storage for saga instances.
//!
//! A saga store persists one document per correlation ID and arbitrates
//! concurrent writers with an optimistic version check: every committed
//! update must present the version it read, and a mismatch is rejected as
//! a recoverable [`SagaStoreError::ConcurrencyConflict`].

pub mod error;
pub mod instance;
pub mod memory;
pub mod store;
pub mod version;

pub use error::{Result, SagaStoreError};
pub use instance::SagaInstance;
pub use memory::InMemorySagaStore;
pub use store::SagaStore;
pub use version::Version;
