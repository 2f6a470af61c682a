//! Generic CRUD repositories over a pluggable document store.
//!
//! - [`HasIdentity`] marks an entity type with an integer primary key.
//! - [`Store`] is the persistence engine; [`InMemoryStore`] ships with the crate.
//! - [`StoreHandle`] shares one store and [`RepositoryConfig`] across the process.
//! - [`Repository<T>`] offers get/find/save/delete/count, each with an `_async` twin.

extern crate self as stored_rust;

pub mod config;
mod entity;
mod error;
mod handle;
mod predicate;
mod repository;
mod runtime;
pub mod store;
pub mod telemetry;

pub use config::{FindPolicy, RepositoryConfig};
pub use entity::{HasIdentity, Identity, TRANSIENT};
pub use error::{StoreError, StoreResult};
pub use handle::{Session, StoreHandle, TypedAccessor};
pub use predicate::{Filter, Predicate};
pub use repository::{RepositoriesExt, Repository};
pub use store::{Change, CommitReceipt, Document, InMemoryStore, InMemoryStoreBuilder, Store};

#[cfg(feature = "derive")]
pub use stored_rust_macros::Entity;
