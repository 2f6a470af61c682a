//! StoreHandle - shared access to a store, and scoped sessions over it.
//!
//! A [`StoreHandle`] is constructed once and passed explicitly to everything
//! that needs the store; clones share the same engine. Each logical unit of
//! work opens its own [`Session`], which collects pending changes and commits
//! them atomically. Sessions never share pending state, so concurrent callers
//! cannot commit each other's changes.
//!
//! ## Example
//!
//! ```ignore
//! let handle = StoreHandle::new(InMemoryStore::new());
//!
//! let mut session = handle.session();
//! session.accessor_for::<User>().add(&alice)?;
//! session.mark_modified(&bob)?;
//! let receipt = session.commit()?;
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use crate::config::RepositoryConfig;
use crate::entity::{HasIdentity, Identity};
use crate::error::StoreResult;
use crate::predicate::Predicate;
use crate::runtime::offload;
use crate::store::{Change, CommitReceipt, Document, InMemoryStore, Store};

/// Process-wide handle to a store. Cheap to clone.
pub struct StoreHandle<S = InMemoryStore> {
    store: Arc<S>,
    config: Arc<RepositoryConfig>,
}

impl<S> Clone for StoreHandle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: Store> StoreHandle<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, RepositoryConfig::default())
    }

    pub fn with_config(store: S, config: RepositoryConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Get the underlying store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Open a new unit of work.
    pub fn session(&self) -> Session<S> {
        Session {
            store: Arc::clone(&self.store),
            pending: Vec::new(),
        }
    }
}

/// A unit of work: pending adds, removals and modifications, committed together.
///
/// Dropping a session without committing discards its pending changes.
pub struct Session<S = InMemoryStore> {
    store: Arc<S>,
    pending: Vec<Change>,
}

impl<S: Store> Session<S> {
    /// Typed access to one collection.
    pub fn accessor_for<T: HasIdentity>(&mut self) -> TypedAccessor<'_, S, T> {
        TypedAccessor {
            session: self,
            _marker: PhantomData,
        }
    }

    /// Declare an already-persisted entity as changed; the next commit writes
    /// its current field values to the row at its identity.
    pub fn mark_modified<T: HasIdentity>(&mut self, entity: &T) -> StoreResult<()> {
        let document = serde_json::to_value(entity)?;
        self.pending.push(Change::Update {
            collection: T::COLLECTION,
            id_field: T::ID_FIELD,
            id: entity.id(),
            document,
        });
        Ok(())
    }

    /// Number of changes waiting for commit.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Durably apply every pending change as one atomic batch.
    pub fn commit(self) -> StoreResult<CommitReceipt> {
        if self.pending.is_empty() {
            return Ok(CommitReceipt::default());
        }

        let changes = self.pending.len();
        let span = debug_span!("store.commit", changes);
        let _enter = span.enter();

        match self.store.apply(self.pending) {
            Ok(receipt) => {
                debug!(affected = receipt.affected, "commit applied");
                Ok(receipt)
            }
            Err(err) => {
                warn!(error = %err, "commit failed");
                Err(err)
            }
        }
    }

    /// [`commit`](Self::commit) on the tokio blocking pool.
    pub async fn commit_async(self) -> StoreResult<CommitReceipt> {
        offload("commit", None, move || self.commit()).await
    }

    /// Discard pending changes. Returns how many were dropped.
    pub fn rollback(self) -> usize {
        self.pending.len()
    }
}

/// Add, remove, find and query entities of one type within a session.
///
/// Reads see committed state only; staged changes become visible after commit.
pub struct TypedAccessor<'a, S, T> {
    session: &'a mut Session<S>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, S: Store, T: HasIdentity> TypedAccessor<'a, S, T> {
    /// Stage an insert. The store assigns the identity at commit.
    pub fn add(&mut self, entity: &T) -> StoreResult<()> {
        let document = serde_json::to_value(entity)?;
        self.session.pending.push(Change::Insert {
            collection: T::COLLECTION,
            id_field: T::ID_FIELD,
            id: entity.id(),
            document,
        });
        Ok(())
    }

    /// Stage removal of the row at the entity's identity.
    pub fn remove(&mut self, entity: &T) {
        self.session.pending.push(Change::Delete {
            collection: T::COLLECTION,
            id: entity.id(),
        });
    }

    /// Find by primary key.
    pub fn find(&self, id: Identity) -> StoreResult<Option<T>> {
        self.session
            .store
            .fetch(T::COLLECTION, id)?
            .map(|document| decode(id, document))
            .transpose()
    }

    /// Every entity of the collection, in store order.
    pub fn all(&self) -> StoreResult<Vec<T>> {
        self.session
            .store
            .scan(T::COLLECTION, None, None)?
            .into_iter()
            .map(|(id, document)| decode(id, document))
            .collect()
    }

    /// Entities matching `predicate`, in store order, stopping after `limit` matches.
    ///
    /// Structured filters are handed to the store; closures are evaluated here
    /// against deserialized entities.
    pub fn query(
        &self,
        predicate: &dyn Predicate<T>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<T>> {
        let store = &self.session.store;

        if let Some(filter) = predicate.filter() {
            return store
                .scan(T::COLLECTION, Some(filter), limit)?
                .into_iter()
                .map(|(id, document)| decode(id, document))
                .collect();
        }

        let limit = limit.unwrap_or(usize::MAX);
        let mut matches = Vec::new();
        for (id, document) in store.scan(T::COLLECTION, None, None)? {
            if matches.len() >= limit {
                break;
            }
            let entity: T = decode(id, document)?;
            if predicate.matches(&entity) {
                matches.push(entity);
            }
        }
        Ok(matches)
    }

    pub fn count(&self) -> StoreResult<usize> {
        self.session.store.count(T::COLLECTION)
    }
}

fn decode<T: HasIdentity>(id: Identity, document: Document) -> StoreResult<T> {
    let mut entity: T = serde_json::from_value(document)?;
    entity.set_id(id);
    Ok(entity)
}
