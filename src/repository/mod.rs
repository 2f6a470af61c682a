//! Repository - typed CRUD over a shared store handle.
//!
//! [`Repository<T>`] works for any [`HasIdentity`](crate::HasIdentity) entity.
//! Obtain one with [`Repository::new`] or through [`RepositoriesExt`]:
//!
//! ```ignore
//! use stored_rust::{InMemoryStore, RepositoriesExt, StoreHandle};
//!
//! let handle = StoreHandle::new(InMemoryStore::new());
//! let users = handle.repository::<User>();
//!
//! let alice = users.save(User::new("alice"))?;
//! assert_eq!(users.get(alice.id)?, Some(alice.clone()));
//! users.delete(&alice)?;
//! ```

mod asynchronous;
mod repository;

pub use repository::Repository;

use crate::entity::HasIdentity;
use crate::handle::StoreHandle;
use crate::store::Store;

/// Extension trait for typed repository access on a store handle.
pub trait RepositoriesExt<S: Store> {
    /// Get a typed repository sharing this handle's store and configuration.
    fn repository<T: HasIdentity>(&self) -> Repository<T, S>;
}

impl<S: Store> RepositoriesExt<S> for StoreHandle<S> {
    fn repository<T: HasIdentity>(&self) -> Repository<T, S> {
        Repository::new(self.clone())
    }
}
