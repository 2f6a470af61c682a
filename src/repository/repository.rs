use std::marker::PhantomData;

use tracing::debug;

use crate::config::FindPolicy;
use crate::entity::{HasIdentity, Identity};
use crate::error::{StoreError, StoreResult};
use crate::handle::{Session, StoreHandle};
use crate::predicate::Predicate;
use crate::store::{CommitReceipt, InMemoryStore, Store};

/// Generic CRUD repository for any entity with an integer identity.
///
/// Every operation opens its own session on the shared [`StoreHandle`] and,
/// when it mutates, commits before returning. The repository itself performs
/// no locking or version checks: concurrent saves of the same identity race,
/// and the last commit wins.
///
/// # Example
///
/// ```ignore
/// let users = Repository::<User>::new(handle.clone());
/// let alice = users.save(User::new("alice"))?;   // insert, identity assigned
/// let found = users.find(|u: &User| u.name == "alice")?;
/// ```
pub struct Repository<T, S = InMemoryStore> {
    handle: StoreHandle<S>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> Clone for Repository<T, S> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: HasIdentity, S: Store> Repository<T, S> {
    pub fn new(handle: StoreHandle<S>) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    pub fn handle(&self) -> &StoreHandle<S> {
        &self.handle
    }

    /// Fetch by primary key. Absence is `Ok(None)`, never an error.
    pub fn get(&self, id: Identity) -> StoreResult<Option<T>> {
        let mut session = self.handle.session();
        let found = session.accessor_for::<T>().find(id)?;
        debug!(collection = T::COLLECTION, id, found = found.is_some(), "get");
        Ok(found)
    }

    /// Every persisted entity, in store order.
    pub fn get_all(&self) -> StoreResult<Vec<T>> {
        let mut session = self.handle.session();
        let all = session.accessor_for::<T>().all()?;
        debug!(collection = T::COLLECTION, rows = all.len(), "get_all");
        Ok(all)
    }

    /// The single entity matching `predicate`.
    ///
    /// No match gives `None`. More than one match also gives `None` under
    /// [`FindPolicy::Collapse`] (the default) and fails with
    /// [`StoreError::AmbiguousMatch`] under [`FindPolicy::Strict`].
    pub fn find<P: Predicate<T>>(&self, predicate: P) -> StoreResult<Option<T>> {
        let mut session = self.handle.session();
        let mut matches = session.accessor_for::<T>().query(&predicate, Some(2))?;

        match matches.len() {
            0 | 1 => {
                let found = matches.pop();
                debug!(collection = T::COLLECTION, found = found.is_some(), "find");
                Ok(found)
            }
            n => match self.handle.config().find_policy {
                FindPolicy::Collapse => {
                    debug!(collection = T::COLLECTION, "find matched several rows, returning none");
                    Ok(None)
                }
                FindPolicy::Strict => Err(StoreError::AmbiguousMatch {
                    collection: T::COLLECTION.to_string(),
                    matches: n,
                }),
            },
        }
    }

    /// Every entity matching `predicate`, in store order.
    pub fn find_all<P: Predicate<T>>(&self, predicate: P) -> StoreResult<Vec<T>> {
        let mut session = self.handle.session();
        let matches = session.accessor_for::<T>().query(&predicate, None)?;
        debug!(collection = T::COLLECTION, rows = matches.len(), "find_all");
        Ok(matches)
    }

    /// True if at least one entity matches `predicate`.
    pub fn exists<P: Predicate<T>>(&self, predicate: P) -> StoreResult<bool> {
        let mut session = self.handle.session();
        let hit = !session
            .accessor_for::<T>()
            .query(&predicate, Some(1))?
            .is_empty();
        debug!(collection = T::COLLECTION, hit, "exists");
        Ok(hit)
    }

    /// Upsert and commit.
    ///
    /// A positive identity updates the row at that identity without checking it
    /// exists first; a missing row fails the commit with
    /// [`StoreError::RowMissing`]. Any other identity inserts, and the returned
    /// entity carries the identity the store assigned.
    pub fn save(&self, entity: T) -> StoreResult<T> {
        if entity.is_transient() {
            return self.insert(entity);
        }

        let mut session = self.handle.session();
        session.mark_modified(&entity)?;
        self.commit(session, "save")?;
        Ok(entity)
    }

    /// [`save`](Self::save) for a possibly absent entity. `None` is a no-op.
    pub fn save_optional(&self, entity: Option<T>) -> StoreResult<Option<T>> {
        entity.map(|entity| self.save(entity)).transpose()
    }

    /// Insert every entity in one commit, all or nothing.
    ///
    /// Always inserts, whatever the identities say: entities that are already
    /// persisted must go through [`save`](Self::save) instead.
    pub fn save_all<I>(&self, entities: I) -> StoreResult<Vec<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let mut entities: Vec<T> = entities.into_iter().collect();
        if entities.is_empty() {
            return Ok(entities);
        }

        let mut session = self.handle.session();
        {
            let mut accessor = session.accessor_for::<T>();
            for entity in &entities {
                accessor.add(entity)?;
            }
        }

        let receipt = self.commit(session, "save_all")?;
        for (entity, id) in entities.iter_mut().zip(receipt.assigned) {
            entity.set_id(id);
        }
        Ok(entities)
    }

    /// Insert a single entity, ignoring the update branch of [`save`](Self::save).
    ///
    /// A positive identity is kept if no row holds it yet.
    pub fn insert(&self, mut entity: T) -> StoreResult<T> {
        let mut session = self.handle.session();
        session.accessor_for::<T>().add(&entity)?;

        let receipt = self.commit(session, "insert")?;
        if let Some(id) = receipt.assigned.first() {
            entity.set_id(*id);
        }
        Ok(entity)
    }

    /// Remove the entity's row and commit.
    ///
    /// The in-memory value keeps its identity; saving it again updates a row
    /// that no longer exists.
    pub fn delete(&self, entity: &T) -> StoreResult<()> {
        self.remove(entity).map(|_| ())
    }

    pub(crate) fn remove(&self, entity: &T) -> StoreResult<usize> {
        let mut session = self.handle.session();
        session.accessor_for::<T>().remove(entity);
        let receipt = self.commit(session, "delete")?;
        Ok(receipt.affected)
    }

    /// Number of persisted entities.
    pub fn count(&self) -> StoreResult<usize> {
        let mut session = self.handle.session();
        let rows = session.accessor_for::<T>().count()?;
        debug!(collection = T::COLLECTION, rows, "count");
        Ok(rows)
    }

    fn commit(&self, session: Session<S>, operation: &'static str) -> StoreResult<CommitReceipt> {
        let receipt = session.commit()?;
        debug!(
            collection = T::COLLECTION,
            operation,
            affected = receipt.affected,
            assigned = ?receipt.assigned,
            "committed"
        );
        Ok(receipt)
    }
}
