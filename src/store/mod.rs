//! Store - the persistence engine behind a [`StoreHandle`](crate::StoreHandle).
//!
//! The engine works on type-erased JSON documents grouped by collection; the
//! typed layer ([`TypedAccessor`](crate::TypedAccessor)) does the serde work.
//! Engines must be internally synchronized: one instance is shared by every
//! session and repository created from the same handle.

mod in_memory;

use serde_json::Value;

use crate::entity::Identity;
use crate::error::StoreResult;
use crate::predicate::Filter;

pub use in_memory::{InMemoryStore, InMemoryStoreBuilder};

/// A serialized entity.
pub type Document = Value;

/// A single pending mutation, applied by [`Store::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Add a row. An identity `<= 0` asks the store to assign one.
    Insert {
        collection: &'static str,
        id_field: &'static str,
        id: Identity,
        document: Document,
    },
    /// Overwrite the row at `id` with the current field values.
    Update {
        collection: &'static str,
        id_field: &'static str,
        id: Identity,
        document: Document,
    },
    /// Remove the row at `id`.
    Delete {
        collection: &'static str,
        id: Identity,
    },
}

impl Change {
    pub fn collection(&self) -> &'static str {
        match self {
            Change::Insert { collection, .. }
            | Change::Update { collection, .. }
            | Change::Delete { collection, .. } => collection,
        }
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Durable identity of each insert, in staging order.
    pub assigned: Vec<Identity>,
    /// Rows inserted, updated or removed.
    pub affected: usize,
}

/// Abstract storage engine.
pub trait Store: Send + Sync + 'static {
    /// Fetch one document by identity. Returns None if not found.
    fn fetch(&self, collection: &str, id: Identity) -> StoreResult<Option<Document>>;

    /// Documents of a collection in ascending identity order, optionally
    /// filtered natively and truncated to `limit` rows.
    fn scan(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<(Identity, Document)>>;

    /// Number of rows in a collection.
    fn count(&self, collection: &str) -> StoreResult<usize>;

    /// Apply a batch of changes atomically: either every change lands or none does.
    fn apply(&self, changes: Vec<Change>) -> StoreResult<CommitReceipt>;
}
