//! Async counterparts of the repository operations.
//!
//! Each `*_async` method runs exactly the same body as its synchronous twin on
//! the tokio blocking pool, bounded by the handle's configured operation
//! timeout. Sync and async paths therefore agree on every edge case.

use tracing::Instrument;

use crate::entity::{HasIdentity, Identity};
use crate::error::StoreResult;
use crate::predicate::Predicate;
use crate::runtime::offload;
use crate::store::Store;

use super::Repository;

impl<T: HasIdentity, S: Store> Repository<T, S> {
    async fn run<R, F>(&self, operation: &'static str, work: F) -> StoreResult<R>
    where
        F: FnOnce(Repository<T, S>) -> StoreResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let repo = self.clone();
        let timeout = self.handle().config().operation_timeout();
        let span = tracing::debug_span!("repository", collection = T::COLLECTION, operation);
        offload(operation, timeout, move || work(repo))
            .instrument(span)
            .await
    }

    pub async fn get_async(&self, id: Identity) -> StoreResult<Option<T>> {
        self.run("get", move |repo| repo.get(id)).await
    }

    pub async fn get_all_async(&self) -> StoreResult<Vec<T>> {
        self.run("get_all", |repo| repo.get_all()).await
    }

    pub async fn find_async<P>(&self, predicate: P) -> StoreResult<Option<T>>
    where
        P: Predicate<T> + 'static,
    {
        self.run("find", move |repo| repo.find(predicate)).await
    }

    pub async fn find_all_async<P>(&self, predicate: P) -> StoreResult<Vec<T>>
    where
        P: Predicate<T> + 'static,
    {
        self.run("find_all", move |repo| repo.find_all(predicate))
            .await
    }

    pub async fn exists_async<P>(&self, predicate: P) -> StoreResult<bool>
    where
        P: Predicate<T> + 'static,
    {
        self.run("exists", move |repo| repo.exists(predicate)).await
    }

    pub async fn save_async(&self, entity: T) -> StoreResult<T> {
        self.run("save", move |repo| repo.save(entity)).await
    }

    pub async fn save_optional_async(&self, entity: Option<T>) -> StoreResult<Option<T>> {
        self.run("save_optional", move |repo| repo.save_optional(entity))
            .await
    }

    pub async fn save_all_async<I>(&self, entities: I) -> StoreResult<Vec<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let entities: Vec<T> = entities.into_iter().collect();
        self.run("save_all", move |repo| repo.save_all(entities))
            .await
    }

    pub async fn insert_async(&self, entity: T) -> StoreResult<T> {
        self.run("insert", move |repo| repo.insert(entity)).await
    }

    /// Async delete. Unlike [`delete`](Repository::delete) it reports how many
    /// rows the commit affected.
    pub async fn delete_async(&self, entity: &T) -> StoreResult<usize> {
        let entity = entity.clone();
        self.run("delete", move |repo| repo.remove(&entity)).await
    }

    pub async fn count_async(&self) -> StoreResult<usize> {
        self.run("count", |repo| repo.count()).await
    }
}
