//! Purchase saga states.

use serde::{Deserialize, Serialize};

/// The state of a purchase saga in its lifecycle.
///
/// State transitions:
/// ```text
/// (none) ──► Accepted ──► ItemsGranted ──► Completed
///     │          │             │
///     └──────────┴─────────────┴────────► Faulted
/// ```
///
/// The pre-initial state ("not yet created") is the absence of a stored
/// instance, so it has no variant here. `Completed` and `Faulted` are
/// terminal; state only moves forward along the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseState {
    /// Purchase accepted and priced; items requested from inventory.
    Accepted,

    /// Inventory granted the items; gil debit requested.
    ItemsGranted,

    /// Gil debited; the purchase is done (terminal state).
    Completed,

    /// A step failed; compensation (if any) was emitted (terminal state).
    Faulted,
}

impl PurchaseState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseState::Completed | PurchaseState::Faulted)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseState::Accepted => "Accepted",
            PurchaseState::ItemsGranted => "ItemsGranted",
            PurchaseState::Completed => "Completed",
            PurchaseState::Faulted => "Faulted",
        }
    }
}

impl std::fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!PurchaseState::Accepted.is_terminal());
        assert!(!PurchaseState::ItemsGranted.is_terminal());
        assert!(PurchaseState::Completed.is_terminal());
        assert!(PurchaseState::Faulted.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(PurchaseState::Accepted.to_string(), "Accepted");
        assert_eq!(PurchaseState::ItemsGranted.to_string(), "ItemsGranted");
        assert_eq!(PurchaseState::Completed.to_string(), "Completed");
        assert_eq!(PurchaseState::Faulted.to_string(), "Faulted");
    }

    #[test]
    fn serialization_roundtrip() {
        let state = PurchaseState::ItemsGranted;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: PurchaseState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
