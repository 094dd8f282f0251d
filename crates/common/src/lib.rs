pub mod gil;
pub mod types;

pub use gil::Gil;
pub use types::{CorrelationId, ItemId, UserId};
