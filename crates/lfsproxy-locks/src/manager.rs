//! Lock manager.

use std::future::Future;
use std::sync::Arc;

use lfsproxy_core::{AuthenticatedUser, RepositoryKey};
use tracing::{debug, info, warn};

use crate::error::{LockError, LockStoreError};
use crate::gate::GateRegistry;
use crate::store::LockStore;
use crate::types::FileLock;

/// A repository's locks split by holder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockPartition {
    /// Locks held by the caller.
    pub ours: Vec<FileLock>,
    /// Locks held by everybody else.
    pub theirs: Vec<FileLock>,
}

/// Create, list and release locks.
///
/// Every operation holds the repository's gate from the load until the save
/// completes, so a set is never read while another request is changing it.
/// Mutations run on their own task once the gate is taken: dropping the
/// calling future does not release the gate before the save has finished.
#[derive(Debug)]
pub struct LockManager {
    store: Arc<dyn LockStore>,
    gates: GateRegistry,
}

impl LockManager {
    /// Create a manager persisting through `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self {
            store,
            gates: GateRegistry::new(),
        }
    }

    /// Locks of `repository`, optionally narrowed to one path and/or one id.
    /// Empty filters are ignored.
    pub async fn list(
        &self,
        repository: &RepositoryKey,
        path: Option<&str>,
        id: Option<&str>,
    ) -> Result<Vec<FileLock>, LockError> {
        let gate = self.gates.gate(&self.store.location(repository));
        let _guard = gate.lock().await;

        let locks = self.store.load(repository).await?;
        let path = path.filter(|p| !p.is_empty());
        let id = id.filter(|i| !i.is_empty());

        Ok(locks
            .into_iter()
            .filter(|lock| path.is_none_or(|p| lock.path == p))
            .filter(|lock| id.is_none_or(|i| lock.id == i))
            .collect())
    }

    /// Lock `path` for `owner`.
    ///
    /// # Errors
    ///
    /// [`LockError::Conflict`] with the existing lock if the path is taken,
    /// [`LockError::InvalidPath`] for an empty path.
    pub async fn create(
        &self,
        repository: &RepositoryKey,
        path: &str,
        owner: &AuthenticatedUser,
    ) -> Result<FileLock, LockError> {
        if path.is_empty() {
            return Err(LockError::InvalidPath);
        }

        let path = path.to_owned();
        let owner = owner.clone();
        self.mutate(repository, move |store, repository| {
            insert_lock(store, repository, path, owner)
        })
        .await
    }

    /// Release lock `id` on behalf of `owner_id`.
    ///
    /// # Errors
    ///
    /// [`LockError::NotFound`] for an unknown id, [`LockError::NotOwner`]
    /// with the untouched lock if somebody else holds it.
    pub async fn unlock(
        &self,
        repository: &RepositoryKey,
        id: &str,
        owner_id: &str,
    ) -> Result<FileLock, LockError> {
        let id = id.to_owned();
        let owner_id = owner_id.to_owned();
        self.mutate(repository, move |store, repository| {
            remove_lock(store, repository, id, owner_id)
        })
        .await
    }

    /// Split the locks of `repository` into those held by `owner_id` and
    /// the rest.
    pub async fn verify(
        &self,
        repository: &RepositoryKey,
        owner_id: &str,
    ) -> Result<LockPartition, LockError> {
        let locks = self.list(repository, None, None).await?;
        let (ours, theirs): (Vec<_>, Vec<_>) =
            locks.into_iter().partition(|lock| lock.is_owned_by(owner_id));
        Ok(LockPartition { ours, theirs })
    }

    /// Run a load/modify/save sequence under the gate of `repository`.
    ///
    /// The gate is taken by the caller, then moved with the sequence into a
    /// spawned task, so it is held until the save returns even if the
    /// caller goes away.
    async fn mutate<T, F, Fut>(&self, repository: &RepositoryKey, op: F) -> Result<T, LockError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn LockStore>, RepositoryKey) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, LockError>> + Send + 'static,
    {
        let gate = self.gates.gate(&self.store.location(repository));
        let guard = gate.lock_owned().await;
        let store = Arc::clone(&self.store);
        let repository = repository.clone();

        tokio::spawn(async move {
            let result = op(store, repository).await;
            drop(guard);
            result
        })
        .await
        .map_err(|e| LockError::Store(LockStoreError::Task(e.to_string())))?
    }
}

async fn insert_lock(
    store: Arc<dyn LockStore>,
    repository: RepositoryKey,
    path: String,
    owner: AuthenticatedUser,
) -> Result<FileLock, LockError> {
    let mut locks = store.load(&repository).await?;
    if let Some(existing) = locks.iter().find(|lock| lock.path == path) {
        warn!(
            repository = %repository,
            path = %path,
            holder = %existing.owner_name,
            "path already locked"
        );
        return Err(LockError::Conflict(Box::new(existing.clone())));
    }

    let lock = FileLock::new(&repository, &path, &owner);
    locks.push(lock.clone());
    store.save(&repository, &locks).await?;

    info!(repository = %repository, path = %path, lock_id = %lock.id, owner = %owner.name, "lock created");
    Ok(lock)
}

async fn remove_lock(
    store: Arc<dyn LockStore>,
    repository: RepositoryKey,
    id: String,
    owner_id: String,
) -> Result<FileLock, LockError> {
    let mut locks = store.load(&repository).await?;
    let Some(index) = locks.iter().position(|lock| lock.id == id) else {
        debug!(repository = %repository, lock_id = %id, "lock not found");
        return Err(LockError::NotFound(id));
    };

    if !locks[index].is_owned_by(&owner_id) {
        warn!(
            repository = %repository,
            lock_id = %id,
            holder = %locks[index].owner_name,
            "refusing to release a lock held by someone else"
        );
        return Err(LockError::NotOwner(Box::new(locks.swap_remove(index))));
    }

    let lock = locks.remove(index);
    store.save(&repository, &locks).await?;

    info!(repository = %repository, path = %lock.path, lock_id = %id, "lock released");
    Ok(lock)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::json::JsonFileLockStore;
    use crate::memory::InMemoryLockStore;

    /// In-memory store whose saves take a while to land.
    #[derive(Debug, Default)]
    struct SlowSaveStore {
        inner: InMemoryLockStore,
    }

    #[async_trait]
    impl LockStore for SlowSaveStore {
        fn location(&self, repository: &RepositoryKey) -> String {
            self.inner.location(repository)
        }

        async fn load(&self, repository: &RepositoryKey) -> Result<Vec<FileLock>, LockStoreError> {
            self.inner.load(repository).await
        }

        async fn save(
            &self,
            repository: &RepositoryKey,
            locks: &[FileLock],
        ) -> Result<(), LockStoreError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.inner.save(repository, locks).await
        }
    }

    fn repo(key: &str) -> RepositoryKey {
        RepositoryKey::parse(key).unwrap()
    }

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser::new("u-alice", "alice")
    }

    fn bob() -> AuthenticatedUser {
        AuthenticatedUser::new("u-bob", "bob")
    }

    fn manager() -> LockManager {
        LockManager::new(Arc::new(InMemoryLockStore::new()))
    }

    #[tokio::test]
    async fn test_should_create_and_list_lock() {
        let manager = manager();
        let key = repo("alice/game");
        let lock = manager.create(&key, "hero.psd", &alice()).await.unwrap();

        assert_eq!(lock.path, "hero.psd");
        assert_eq!(lock.owner_name, "alice");
        assert_eq!(manager.list(&key, None, None).await.unwrap(), vec![lock]);
    }

    #[tokio::test]
    async fn test_should_return_existing_lock_on_conflict() {
        let manager = manager();
        let key = repo("alice/game");
        let first = manager.create(&key, "hero.psd", &alice()).await.unwrap();

        match manager.create(&key, "hero.psd", &bob()).await {
            Err(LockError::Conflict(existing)) => assert_eq!(*existing, first),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(manager.list(&key, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_let_exactly_one_concurrent_create_win() {
        let manager = Arc::new(manager());
        let key = repo("alice/game");

        let tasks = (0..8).map(|i| {
            let manager = Arc::clone(&manager);
            let key = key.clone();
            tokio::spawn(async move {
                let user = AuthenticatedUser::new(format!("u{i}"), format!("user{i}"));
                manager.create(&key, "same.bin", &user).await
            })
        });
        let results: Vec<_> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        let winner = winners[0];
        for result in &results {
            if let Err(err) = result {
                match err {
                    LockError::Conflict(existing) => assert_eq!(existing.id, winner.id),
                    other => panic!("unexpected error {other:?}"),
                }
            }
        }
        assert_eq!(manager.list(&key, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_let_exactly_one_concurrent_unlock_win() {
        let manager = Arc::new(manager());
        let key = repo("alice/game");
        let lock = manager.create(&key, "hero.psd", &alice()).await.unwrap();

        let tasks = (0..8).map(|_| {
            let manager = Arc::clone(&manager);
            let key = key.clone();
            let id = lock.id.clone();
            tokio::spawn(async move { manager.unlock(&key, &id, &alice().id).await })
        });
        let results: Vec<_> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let released: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(released, vec![&lock]);
        for result in &results {
            if let Err(err) = result {
                assert!(matches!(err, LockError::NotFound(_)), "unexpected error {err:?}");
            }
        }
        assert!(manager.list(&key, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_should_finish_create_when_caller_is_dropped() {
        let manager = LockManager::new(Arc::new(SlowSaveStore::default()));
        let key = repo("alice/game");

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), manager.create(&key, "hero.psd", &alice()))
                .await;
        assert!(abandoned.is_err());

        match manager.create(&key, "hero.psd", &bob()).await {
            Err(LockError::Conflict(existing)) => assert_eq!(existing.owner_name, "alice"),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(manager.list(&key, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_should_keep_lock_when_non_owner_unlocks() {
        let manager = manager();
        let key = repo("alice/game");
        let lock = manager.create(&key, "hero.psd", &alice()).await.unwrap();

        match manager.unlock(&key, &lock.id, &bob().id).await {
            Err(LockError::NotOwner(existing)) => assert_eq!(existing.id, lock.id),
            other => panic!("expected not-owner, got {other:?}"),
        }
        assert_eq!(manager.list(&key, None, None).await.unwrap(), vec![lock]);
    }

    #[tokio::test]
    async fn test_should_unlock_exactly_once() {
        let manager = manager();
        let key = repo("alice/game");
        let lock = manager.create(&key, "hero.psd", &alice()).await.unwrap();

        let released = manager.unlock(&key, &lock.id, &alice().id).await.unwrap();
        assert_eq!(released, lock);
        assert!(matches!(
            manager.unlock(&key, &lock.id, &alice().id).await,
            Err(LockError::NotFound(_))
        ));
        assert!(manager.list(&key, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_should_filter_by_path_and_id() {
        let manager = manager();
        let key = repo("alice/game");
        let a = manager.create(&key, "a.bin", &alice()).await.unwrap();
        let b = manager.create(&key, "b.bin", &bob()).await.unwrap();

        assert_eq!(manager.list(&key, Some("b.bin"), None).await.unwrap(), vec![b.clone()]);
        assert_eq!(manager.list(&key, None, Some(&a.id)).await.unwrap(), vec![a.clone()]);
        assert!(manager.list(&key, Some("a.bin"), Some(&b.id)).await.unwrap().is_empty());
        assert_eq!(manager.list(&key, Some(""), Some("")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_should_partition_locks_by_owner() {
        let manager = manager();
        let key = repo("alice/game");
        let a = manager.create(&key, "a.bin", &alice()).await.unwrap();
        let b = manager.create(&key, "b.bin", &bob()).await.unwrap();

        let partition = manager.verify(&key, &alice().id).await.unwrap();
        assert_eq!(partition.ours, vec![a]);
        assert_eq!(partition.theirs, vec![b]);
    }

    #[tokio::test]
    async fn test_should_isolate_repositories() {
        let manager = manager();
        manager.create(&repo("alice/one"), "x", &alice()).await.unwrap();
        assert!(manager.create(&repo("alice/two"), "x", &bob()).await.is_ok());
        assert!(manager.list(&repo("bob/none"), None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_empty_path() {
        let manager = manager();
        assert!(matches!(
            manager.create(&repo("alice/game"), "", &alice()).await,
            Err(LockError::InvalidPath)
        ));
    }

    #[tokio::test]
    async fn test_should_survive_restart_with_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let key = repo("alice/game");

        let lock = {
            let manager = LockManager::new(Arc::new(JsonFileLockStore::new(dir.path())));
            manager.create(&key, "hero.psd", &alice()).await.unwrap()
        };

        let manager = LockManager::new(Arc::new(JsonFileLockStore::new(dir.path())));
        assert_eq!(manager.list(&key, None, None).await.unwrap(), vec![lock.clone()]);
        assert!(matches!(
            manager.create(&key, "hero.psd", &bob()).await,
            Err(LockError::Conflict(_))
        ));
        manager.unlock(&key, &lock.id, &alice().id).await.unwrap();

        let manager = LockManager::new(Arc::new(JsonFileLockStore::new(dir.path())));
        assert!(manager.list(&key, None, None).await.unwrap().is_empty());
    }
}
