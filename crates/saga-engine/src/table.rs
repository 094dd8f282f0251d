//! Transition lookup table keyed by (state, event kind).

use std::collections::HashMap;
use std::hash::Hash;

/// A lookup table from `(current state, event kind)` to a handler.
///
/// The implicit pre-initial state (no stored instance yet) is modelled as
/// `None`; entries registered with [`TransitionTable::initially`] match it.
/// The table is a plain map of tagged handler values so the full state
/// machine stays exhaustively reviewable in one place — pairs without an
/// entry are no-ops by construction.
#[derive(Debug)]
pub struct TransitionTable<St, Ek, H> {
    handlers: HashMap<(Option<St>, Ek), H>,
}

impl<St, Ek, H> TransitionTable<St, Ek, H>
where
    St: Copy + Eq + Hash,
    Ek: Copy + Eq + Hash,
{
    /// Creates an empty transition table.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for an event arriving before the instance
    /// exists.
    pub fn initially(mut self, kind: Ek, handler: H) -> Self {
        self.handlers.insert((None, kind), handler);
        self
    }

    /// Registers a handler for an event arriving while the instance is in
    /// `state`.
    pub fn during(mut self, state: St, kind: Ek, handler: H) -> Self {
        self.handlers.insert((Some(state), kind), handler);
        self
    }

    /// Looks up the handler registered for `(state, kind)`, if any.
    pub fn lookup(&self, state: Option<St>, kind: Ek) -> Option<&H> {
        self.handlers.get(&(state, kind))
    }

    /// Returns the number of registered transitions.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no transitions are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<St, Ek, H> Default for TransitionTable<St, Ek, H>
where
    St: Copy + Eq + Hash,
    Ek: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum State {
        Open,
        Closed,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Created,
        Bumped,
        Closed,
    }

    #[test]
    fn lookup_finds_registered_handlers() {
        let table: TransitionTable<State, Kind, &str> = TransitionTable::new()
            .initially(Kind::Created, "create")
            .during(State::Open, Kind::Bumped, "bump")
            .during(State::Open, Kind::Closed, "close");

        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(None, Kind::Created), Some(&"create"));
        assert_eq!(table.lookup(Some(State::Open), Kind::Bumped), Some(&"bump"));
        assert_eq!(
            table.lookup(Some(State::Open), Kind::Closed),
            Some(&"close")
        );
    }

    #[test]
    fn lookup_misses_unregistered_pairs() {
        let table: TransitionTable<State, Kind, &str> =
            TransitionTable::new().initially(Kind::Created, "create");

        // Creation event against an existing instance is not the same key
        assert_eq!(table.lookup(Some(State::Open), Kind::Created), None);
        // Terminal state with no registered handlers
        assert_eq!(table.lookup(Some(State::Closed), Kind::Bumped), None);
        assert_eq!(table.lookup(None, Kind::Bumped), None);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let table: TransitionTable<State, Kind, &str> = TransitionTable::new()
            .during(State::Open, Kind::Bumped, "first")
            .during(State::Open, Kind::Bumped, "second");

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup(Some(State::Open), Kind::Bumped),
            Some(&"second")
        );
    }
}
