use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::CorrelationId;
use tokio::sync::RwLock;

use crate::{Result, SagaInstance, SagaStore, SagaStoreError, Version};

/// In-memory saga store implementation.
///
/// Backs unit and integration tests and the default single-process wiring,
/// with the same contract as a document-store implementation. The
/// `set_unavailable` toggle exercises the transient-failure path.
#[derive(Clone, Default)]
pub struct InMemorySagaStore<I> {
    inner: Arc<RwLock<StoreState<I>>>,
}

#[derive(Default)]
struct StoreState<I> {
    instances: HashMap<CorrelationId, I>,
    unavailable: bool,
}

impl<I: SagaInstance> InMemorySagaStore<I> {
    /// Creates a new empty in-memory saga store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreState {
                instances: HashMap::new(),
                unavailable: false,
            })),
        }
    }

    /// Returns the number of stored instances.
    pub async fn len(&self) -> usize {
        self.inner.read().await.instances.len()
    }

    /// Returns true if no instances are stored.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.instances.is_empty()
    }

    /// Removes all stored instances.
    pub async fn clear(&self) {
        self.inner.write().await.instances.clear();
    }

    /// Makes every subsequent operation fail with
    /// [`SagaStoreError::Unavailable`] until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl<I: SagaInstance> SagaStore<I> for InMemorySagaStore<I> {
    async fn load(&self, correlation_id: CorrelationId) -> Result<Option<I>> {
        let state = self.inner.read().await;
        if state.unavailable {
            return Err(SagaStoreError::Unavailable("store offline".to_string()));
        }
        Ok(state.instances.get(&correlation_id).cloned())
    }

    async fn create(&self, mut instance: I) -> Result<Version> {
        let mut state = self.inner.write().await;
        if state.unavailable {
            return Err(SagaStoreError::Unavailable("store offline".to_string()));
        }

        let correlation_id = instance.correlation_id();
        if state.instances.contains_key(&correlation_id) {
            return Err(SagaStoreError::DuplicateCorrelation(correlation_id));
        }

        let version = Version::first();
        instance.set_version(version);
        state.instances.insert(correlation_id, instance);
        tracing::debug!(%correlation_id, %version, "saga instance created");
        Ok(version)
    }

    async fn commit_update(&self, mut instance: I, expected_version: Version) -> Result<Version> {
        let mut state = self.inner.write().await;
        if state.unavailable {
            return Err(SagaStoreError::Unavailable("store offline".to_string()));
        }

        let correlation_id = instance.correlation_id();
        let actual = state
            .instances
            .get(&correlation_id)
            .map(|stored| stored.version())
            .unwrap_or(Version::initial());

        if actual != expected_version {
            tracing::debug!(
                %correlation_id,
                expected = %expected_version,
                %actual,
                "version check failed"
            );
            return Err(SagaStoreError::ConcurrencyConflict {
                correlation_id,
                expected: expected_version,
                actual,
            });
        }

        let version = expected_version.next();
        instance.set_version(version);
        state.instances.insert(correlation_id, instance);
        tracing::debug!(%correlation_id, %version, "saga instance updated");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestInstance {
        correlation_id: CorrelationId,
        value: i32,
        version: Version,
    }

    impl TestInstance {
        fn new(correlation_id: CorrelationId) -> Self {
            Self {
                correlation_id,
                value: 0,
                version: Version::initial(),
            }
        }
    }

    impl SagaInstance for TestInstance {
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

    #[tokio::test]
    async fn create_stamps_first_version() {
        let store = InMemorySagaStore::new();
        let id = CorrelationId::new();

        let version = store.create(TestInstance::new(id)).await.unwrap();
        assert_eq!(version, Version::first());

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.version(), Version::first());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_correlation_id() {
        let store = InMemorySagaStore::new();
        let id = CorrelationId::new();

        store.create(TestInstance::new(id)).await.unwrap();
        let result = store.create(TestInstance::new(id)).await;

        assert!(matches!(
            result,
            Err(SagaStoreError::DuplicateCorrelation(dup)) if dup == id
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn commit_update_increments_version() {
        let store = InMemorySagaStore::new();
        let id = CorrelationId::new();
        store.create(TestInstance::new(id)).await.unwrap();

        let mut loaded = store.load(id).await.unwrap().unwrap();
        loaded.value = 42;
        let version = store.commit_update(loaded, Version::first()).await.unwrap();
        assert_eq!(version, Version::new(2));

        let reloaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(reloaded.value, 42);
        assert_eq!(reloaded.version(), Version::new(2));
    }

    #[tokio::test]
    async fn commit_update_rejects_stale_version() {
        let store = InMemorySagaStore::new();
        let id = CorrelationId::new();
        store.create(TestInstance::new(id)).await.unwrap();

        let loaded = store.load(id).await.unwrap().unwrap();
        store
            .commit_update(loaded.clone(), Version::first())
            .await
            .unwrap();

        // Second writer still holds version 1
        let result = store.commit_update(loaded, Version::first()).await;
        assert!(matches!(
            result,
            Err(SagaStoreError::ConcurrencyConflict {
                expected,
                actual,
                ..
            }) if expected == Version::first() && actual == Version::new(2)
        ));
    }

    #[tokio::test]
    async fn load_missing_instance_returns_none() {
        let store: InMemorySagaStore<TestInstance> = InMemorySagaStore::new();
        let result = store.load(CorrelationId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unavailable_store_fails_all_operations() {
        let store = InMemorySagaStore::new();
        let id = CorrelationId::new();
        store.set_unavailable(true).await;

        assert!(matches!(
            store.load(id).await,
            Err(SagaStoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.create(TestInstance::new(id)).await,
            Err(SagaStoreError::Unavailable(_))
        ));

        store.set_unavailable(false).await;
        assert!(store.load(id).await.unwrap().is_none());
    }
}
