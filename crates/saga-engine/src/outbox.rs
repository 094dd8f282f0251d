//! In-memory outbox tying command dispatch to a committed transition.

use saga_store::Version;

/// Buffer for commands produced while a transition executes.
///
/// Commands accumulate here and are only handed to the message bus after
/// the owning transition's commit succeeds: the bus accepts a
/// [`SealedOutbox`], and sealing requires the committed version. A failed
/// or conflicted commit simply drops the outbox, so commands are never
/// dispatched for state that was not persisted.
#[derive(Debug)]
pub struct Outbox<C> {
    pending: Vec<C>,
}

impl<C> Outbox<C> {
    /// Creates an empty outbox.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queues a command for dispatch after commit.
    pub fn send(&mut self, command: C) {
        self.pending.push(command);
    }

    /// Returns the commands queued so far.
    pub fn pending(&self) -> &[C] {
        &self.pending
    }

    /// Returns the number of queued commands.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no commands are queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Seals the outbox against the version of a committed transition.
    ///
    /// Called only after `create`/`commit_update` succeeded; the resulting
    /// batch is what the message bus accepts.
    pub fn seal(self, version: Version) -> SealedOutbox<C> {
        SealedOutbox {
            version,
            commands: self.pending,
        }
    }
}

impl<C> Default for Outbox<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A batch of commands tagged with the committed version that produced
/// them, ready for dispatch.
#[derive(Debug, Clone)]
pub struct SealedOutbox<C> {
    version: Version,
    commands: Vec<C>,
}

impl<C> SealedOutbox<C> {
    /// Returns the committed version this batch belongs to.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the commands in dispatch order.
    pub fn commands(&self) -> &[C] {
        &self.commands
    }

    /// Returns the number of commands in the batch.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if the batch carries no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Consumes the batch, yielding its commands.
    pub fn into_commands(self) -> Vec<C> {
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbox_queues_in_order() {
        let mut outbox = Outbox::new();
        assert!(outbox.is_empty());

        outbox.send("grant");
        outbox.send("debit");

        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.pending(), &["grant", "debit"]);
    }

    #[test]
    fn seal_tags_commands_with_committed_version() {
        let mut outbox = Outbox::new();
        outbox.send("grant");

        let sealed = outbox.seal(Version::new(3));
        assert_eq!(sealed.version(), Version::new(3));
        assert_eq!(sealed.commands(), &["grant"]);
        assert_eq!(sealed.into_commands(), vec!["grant"]);
    }

    #[test]
    fn sealing_an_empty_outbox_yields_an_empty_batch() {
        let outbox: Outbox<&str> = Outbox::new();
        let sealed = outbox.seal(Version::first());
        assert!(sealed.is_empty());
        assert_eq!(sealed.len(), 0);
    }
}
