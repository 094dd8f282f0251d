//! The transition engine: one load-handle-commit-dispatch cycle per event.

use saga_store::{SagaInstance, SagaStore, SagaStoreError, Version};

use crate::bus::{CommandBus, RetryPolicy};
use crate::definition::{Applied, CorrelatedEvent, SagaDefinition};
use crate::error::EngineError;
use crate::notify::Notifier;
use crate::outbox::Outbox;

/// Default bound on conflict-triggered retries per inbound event.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Outcome of dispatching one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A transition committed at the given version and its commands were
    /// handed to the bus.
    Committed(Version),
    /// No transition is registered for (current state, event kind); the
    /// event was acknowledged without mutation.
    Ignored,
}

/// Drives a saga definition against a store, a command bus, and a
/// notification channel.
///
/// Concurrency is arbitrated per instance by the store's optimistic
/// version check: the losing writer reloads post-commit state and
/// re-evaluates its transition, which may turn it into a no-op. Unrelated
/// instances proceed fully in parallel.
pub struct TransitionEngine<D, S, B, N> {
    definition: D,
    store: S,
    bus: B,
    notifier: N,
    max_attempts: u32,
}

impl<D, S, B, N> TransitionEngine<D, S, B, N>
where
    D: SagaDefinition,
    S: SagaStore<D::Instance>,
    B: CommandBus<D::Command>,
    N: Notifier<D::Instance>,
{
    /// Creates an engine with the default conflict-retry bound.
    pub fn new(definition: D, store: S, bus: B, notifier: N) -> Self {
        Self {
            definition,
            store,
            bus,
            notifier,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the conflict-retry bound.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Dispatches one inbound event through the full cycle.
    ///
    /// Either exactly one transition commits (and its sealed outbox is
    /// published, and the notifier sees the committed snapshot), or the
    /// event is acknowledged as a no-op, or an error is surfaced with no
    /// partial state visible to readers.
    #[tracing::instrument(skip(self, event), fields(event = event.name(), correlation_id = %event.correlation_id()))]
    pub async fn dispatch(&self, event: D::Event) -> Result<DispatchOutcome, EngineError> {
        let dispatch_start = std::time::Instant::now();
        let correlation_id = event.correlation_id();

        for attempt in 1..=self.max_attempts {
            let mut outbox = Outbox::new();

            let committed = match self.store.load(correlation_id).await? {
                None => {
                    let Some(instance) = self.definition.start(&event, &mut outbox).await else {
                        metrics::counter!("saga_events_ignored").increment(1);
                        tracing::debug!("event ignored: no instance and not a creation event");
                        return Ok(DispatchOutcome::Ignored);
                    };

                    match self.store.create(instance.clone()).await {
                        Ok(version) => {
                            metrics::counter!("sagas_started").increment(1);
                            (version, instance)
                        }
                        Err(SagaStoreError::DuplicateCorrelation(_)) => {
                            // Lost a create race; re-evaluate against the
                            // winner's committed state.
                            metrics::counter!("saga_transition_conflicts").increment(1);
                            tracing::debug!(attempt, "lost create race, reloading");
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                Some(mut instance) => {
                    let expected = instance.version();
                    match self.definition.advance(&mut instance, &event, &mut outbox).await {
                        Applied::Ignored => {
                            metrics::counter!("saga_events_ignored").increment(1);
                            tracing::debug!("event ignored: no transition registered");
                            return Ok(DispatchOutcome::Ignored);
                        }
                        Applied::Mutated => {
                            match self.store.commit_update(instance.clone(), expected).await {
                                Ok(version) => (version, instance),
                                Err(SagaStoreError::ConcurrencyConflict { actual, .. }) => {
                                    metrics::counter!("saga_transition_conflicts").increment(1);
                                    tracing::warn!(
                                        attempt,
                                        %expected,
                                        %actual,
                                        "concurrency conflict, reloading"
                                    );
                                    continue;
                                }
                                Err(e) => return Err(e.into()),
                            }
                        }
                    }
                }
            };

            let (version, mut snapshot) = committed;
            snapshot.set_version(version);

            // Commit succeeded; only now may the buffered commands leave
            // the process.
            let sealed = outbox.seal(version);
            if !sealed.is_empty() {
                self.bus.publish(sealed).await?;
            }

            if let Err(e) = self.notifier.notify(&snapshot).await {
                tracing::warn!(error = %e, "snapshot notification failed");
            }

            // Counted only after a successful commit, so conflict-retried
            // handler runs never inflate the totals.
            metrics::counter!("saga_transitions_committed", "event" => event.name()).increment(1);
            metrics::histogram!("saga_dispatch_duration_seconds")
                .record(dispatch_start.elapsed().as_secs_f64());
            tracing::info!(%version, "transition committed");

            return Ok(DispatchOutcome::Committed(version));
        }

        metrics::counter!("saga_transition_retries_exhausted").increment(1);
        Err(EngineError::RetriesExhausted {
            correlation_id,
            attempts: self.max_attempts,
        })
    }

    /// Dispatches with transport-style redelivery on transient failures.
    ///
    /// Fixed-interval retry; non-transient errors are surfaced
    /// immediately and never redelivered.
    pub async fn dispatch_with_redelivery(
        &self,
        event: D::Event,
        policy: &RetryPolicy,
    ) -> Result<DispatchOutcome, EngineError>
    where
        D::Event: Clone,
    {
        let attempts = policy.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.dispatch(event.clone()).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if err.is_transient() && attempt < attempts => {
                    tracing::warn!(error = %err, attempt, "transient failure, redelivering");
                    metrics::counter!("saga_event_redeliveries").increment(1);
                    tokio::time::sleep(policy.interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Answers "what is the current status" without mutating state.
    ///
    /// Reads only committed instances; it may trail an in-flight
    /// transition but never exposes a partially-mutated one.
    pub async fn status(
        &self,
        correlation_id: common::CorrelationId,
    ) -> Result<Option<D::Instance>, EngineError> {
        Ok(self.store.load(correlation_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use common::CorrelationId;
    use saga_store::InMemorySagaStore;

    use crate::bus::InMemoryBus;
    use crate::definition::CorrelatedCommand;
    use crate::notify::{InMemoryNotifier, NullNotifier};

    // A toy two-step saga: Open creates the instance, Bump mutates it
    // while open, Close makes it terminal.

    #[derive(Debug, Clone)]
    struct TestSaga {
        correlation_id: CorrelationId,
        open: bool,
        bumps: u32,
        version: Version,
    }

    impl SagaInstance for TestSaga {
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

    #[derive(Debug, Clone)]
    enum TestEvent {
        Open(CorrelationId),
        Bump(CorrelationId),
        Close(CorrelationId),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestEventKind {
        Open,
        Bump,
        Close,
    }

    impl CorrelatedEvent for TestEvent {
        type Kind = TestEventKind;

        fn kind(&self) -> TestEventKind {
            match self {
                TestEvent::Open(_) => TestEventKind::Open,
                TestEvent::Bump(_) => TestEventKind::Bump,
                TestEvent::Close(_) => TestEventKind::Close,
            }
        }

        fn correlation_id(&self) -> CorrelationId {
            match self {
                TestEvent::Open(id) | TestEvent::Bump(id) | TestEvent::Close(id) => *id,
            }
        }

        fn name(&self) -> &'static str {
            match self {
                TestEvent::Open(_) => "Open",
                TestEvent::Bump(_) => "Bump",
                TestEvent::Close(_) => "Close",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(CorrelationId);

    impl CorrelatedCommand for Ping {
        fn correlation_id(&self) -> CorrelationId {
            self.0
        }

        fn name(&self) -> &'static str {
            "Ping"
        }
    }

    struct TestDefinition;

    #[async_trait]
    impl SagaDefinition for TestDefinition {
        type Instance = TestSaga;
        type Event = TestEvent;
        type Command = Ping;

        async fn start(
            &self,
            event: &TestEvent,
            outbox: &mut Outbox<Ping>,
        ) -> Option<TestSaga> {
            match event {
                TestEvent::Open(id) => {
                    outbox.send(Ping(*id));
                    Some(TestSaga {
                        correlation_id: *id,
                        open: true,
                        bumps: 0,
                        version: Version::initial(),
                    })
                }
                _ => None,
            }
        }

        async fn advance(
            &self,
            instance: &mut TestSaga,
            event: &TestEvent,
            outbox: &mut Outbox<Ping>,
        ) -> Applied {
            match event {
                TestEvent::Bump(id) if instance.open => {
                    instance.bumps += 1;
                    outbox.send(Ping(*id));
                    Applied::Mutated
                }
                TestEvent::Close(_) if instance.open => {
                    instance.open = false;
                    Applied::Mutated
                }
                _ => Applied::Ignored,
            }
        }
    }

    type TestEngine = TransitionEngine<
        TestDefinition,
        InMemorySagaStore<TestSaga>,
        InMemoryBus<Ping>,
        InMemoryNotifier<TestSaga>,
    >;

    fn setup() -> (
        TestEngine,
        InMemorySagaStore<TestSaga>,
        InMemoryBus<Ping>,
        InMemoryNotifier<TestSaga>,
    ) {
        let store = InMemorySagaStore::new();
        let bus = InMemoryBus::new();
        let notifier = InMemoryNotifier::new();
        let engine =
            TransitionEngine::new(TestDefinition, store.clone(), bus.clone(), notifier.clone());
        (engine, store, bus, notifier)
    }

    #[tokio::test]
    async fn creation_event_commits_first_version_and_dispatches() {
        let (engine, store, bus, notifier) = setup();
        let id = CorrelationId::new();

        let outcome = engine.dispatch(TestEvent::Open(id)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Committed(Version::first()));

        assert_eq!(store.len().await, 1);
        assert_eq!(bus.published(), vec![Ping(id)]);
        assert_eq!(notifier.snapshot_count(), 1);
        assert_eq!(notifier.snapshots()[0].version(), Version::first());
    }

    #[tokio::test]
    async fn non_creation_event_for_unknown_key_is_ignored() {
        let (engine, store, bus, _notifier) = setup();

        let outcome = engine
            .dispatch(TestEvent::Bump(CorrelationId::new()))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(store.len().await, 0);
        assert_eq!(bus.published_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_creation_event_is_ignored() {
        let (engine, store, bus, _notifier) = setup();
        let id = CorrelationId::new();

        engine.dispatch(TestEvent::Open(id)).await.unwrap();
        let outcome = engine.dispatch(TestEvent::Open(id)).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(store.len().await, 1);
        // The first dispatch published one Ping; the duplicate none.
        assert_eq!(bus.published_count(), 1);
    }

    #[tokio::test]
    async fn each_committed_transition_increments_version_once() {
        let (engine, store, _bus, _notifier) = setup();
        let id = CorrelationId::new();

        engine.dispatch(TestEvent::Open(id)).await.unwrap();
        let outcome = engine.dispatch(TestEvent::Bump(id)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Committed(Version::new(2)));

        let outcome = engine.dispatch(TestEvent::Close(id)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Committed(Version::new(3)));

        let saga = store.load(id).await.unwrap().unwrap();
        assert_eq!(saga.bumps, 1);
        assert!(!saga.open);
        assert_eq!(saga.version(), Version::new(3));
    }

    #[tokio::test]
    async fn events_against_terminal_state_are_noops() {
        let (engine, store, bus, _notifier) = setup();
        let id = CorrelationId::new();

        engine.dispatch(TestEvent::Open(id)).await.unwrap();
        engine.dispatch(TestEvent::Close(id)).await.unwrap();
        let before = bus.published_count();

        let outcome = engine.dispatch(TestEvent::Bump(id)).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert_eq!(bus.published_count(), before);

        let saga = store.load(id).await.unwrap().unwrap();
        assert_eq!(saga.version(), Version::new(2));
    }

    /// Store wrapper that sneaks a competing commit in between the
    /// engine's load and its first `commit_update`, forcing exactly one
    /// deterministic version conflict.
    struct ContendedStore {
        inner: InMemorySagaStore<TestSaga>,
        competing: fn(&mut TestSaga),
        injected: AtomicBool,
    }

    impl ContendedStore {
        fn new(inner: InMemorySagaStore<TestSaga>, competing: fn(&mut TestSaga)) -> Self {
            Self {
                inner,
                competing,
                injected: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SagaStore<TestSaga> for ContendedStore {
        async fn load(&self, correlation_id: CorrelationId) -> saga_store::Result<Option<TestSaga>> {
            self.inner.load(correlation_id).await
        }

        async fn create(&self, instance: TestSaga) -> saga_store::Result<Version> {
            self.inner.create(instance).await
        }

        async fn commit_update(
            &self,
            instance: TestSaga,
            expected_version: Version,
        ) -> saga_store::Result<Version> {
            if !self.injected.swap(true, Ordering::SeqCst) {
                let mut winner = self
                    .inner
                    .load(instance.correlation_id())
                    .await?
                    .expect("instance exists");
                (self.competing)(&mut winner);
                self.inner.commit_update(winner, expected_version).await?;
            }
            self.inner.commit_update(instance, expected_version).await
        }
    }

    #[tokio::test]
    async fn conflicting_update_reevaluates_into_a_noop() {
        let store = InMemorySagaStore::new();
        let bus = InMemoryBus::new();
        // The competing writer closes the saga first.
        let engine = TransitionEngine::new(
            TestDefinition,
            ContendedStore::new(store.clone(), |saga| saga.open = false),
            bus.clone(),
            NullNotifier,
        );
        let id = CorrelationId::new();
        engine.dispatch(TestEvent::Open(id)).await.unwrap();

        let outcome = engine.dispatch(TestEvent::Bump(id)).await.unwrap();

        // The stale Bump commit conflicted, reloaded the closed state,
        // and re-evaluated to a no-op.
        assert_eq!(outcome, DispatchOutcome::Ignored);
        let saga = store.load(id).await.unwrap().unwrap();
        assert!(!saga.open);
        assert_eq!(saga.bumps, 0);
        assert_eq!(saga.version(), Version::new(2));
        // Only the Open transition published; the conflicted attempt's
        // outbox was discarded.
        assert_eq!(bus.published(), vec![Ping(id)]);
    }

    #[tokio::test]
    async fn conflicting_update_recommits_against_fresh_state() {
        let store = InMemorySagaStore::new();
        let bus = InMemoryBus::new();
        // The competing writer bumps too, leaving the saga open so the
        // retried transition still applies.
        let engine = TransitionEngine::new(
            TestDefinition,
            ContendedStore::new(store.clone(), |saga| saga.bumps += 1),
            bus.clone(),
            NullNotifier,
        );
        let id = CorrelationId::new();
        engine.dispatch(TestEvent::Open(id)).await.unwrap();

        let outcome = engine.dispatch(TestEvent::Bump(id)).await.unwrap();

        // Conflict on the first attempt, then a clean commit on top of
        // the competing writer's version.
        assert_eq!(outcome, DispatchOutcome::Committed(Version::new(3)));
        let saga = store.load(id).await.unwrap().unwrap();
        assert_eq!(saga.bumps, 2);
        // One Ping for Open, exactly one for the retried Bump.
        assert_eq!(bus.published(), vec![Ping(id), Ping(id)]);
    }

    #[tokio::test]
    async fn concurrent_creations_commit_exactly_once() {
        let (engine, store, bus, _notifier) = setup();
        let id = CorrelationId::new();

        let (a, b) = tokio::join!(
            engine.dispatch(TestEvent::Open(id)),
            engine.dispatch(TestEvent::Open(id))
        );

        let outcomes = [a.unwrap(), b.unwrap()];
        let committed = outcomes
            .iter()
            .filter(|o| matches!(o, DispatchOutcome::Committed(_)))
            .count();
        assert_eq!(committed, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(bus.published_count(), 1);
    }

    #[tokio::test]
    async fn store_outage_surfaces_as_transient_error() {
        let (engine, store, _bus, _notifier) = setup();
        store.set_unavailable(true).await;

        let err = engine
            .dispatch(TestEvent::Open(CorrelationId::new()))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn redelivery_retries_transient_failures() {
        let (engine, store, _bus, _notifier) = setup();
        let id = CorrelationId::new();
        store.set_unavailable(true).await;

        let err = engine
            .dispatch_with_redelivery(TestEvent::Open(id), &RetryPolicy::immediate(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Store(SagaStoreError::Unavailable(_))
        ));

        store.set_unavailable(false).await;
        let outcome = engine
            .dispatch_with_redelivery(TestEvent::Open(id), &RetryPolicy::immediate(2))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Committed(Version::first()));
    }

    #[tokio::test]
    async fn status_reads_committed_state_only() {
        let (engine, _store, _bus, _notifier) = setup();
        let id = CorrelationId::new();

        assert!(engine.status(id).await.unwrap().is_none());

        engine.dispatch(TestEvent::Open(id)).await.unwrap();
        let saga = engine.status(id).await.unwrap().unwrap();
        assert_eq!(saga.correlation_id(), id);
        assert_eq!(saga.version(), Version::first());
    }
}
