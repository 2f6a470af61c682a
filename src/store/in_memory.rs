//! InMemoryStore - HashMap-backed store for testing and development.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::{Change, CommitReceipt, Document, Store};
use crate::entity::Identity;
use crate::error::{StoreError, StoreResult};
use crate::predicate::Filter;

/// Rows of one collection plus its identity counter.
#[derive(Clone, Debug)]
struct Table {
    next_id: Identity,
    rows: BTreeMap<Identity, Document>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct UniqueIndex {
    collection: String,
    field: String,
}

/// In-memory store backed by a HashMap of tables.
///
/// Identities are assigned per collection starting at 1 and are never reused.
/// Clone-friendly via Arc: clones share storage.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    unique: Arc<Vec<UniqueIndex>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn check_unique(&self, collection: &str, table: &Table) -> StoreResult<()> {
        for index in self.unique.iter().filter(|i| i.collection == collection) {
            let mut seen = HashSet::new();
            for document in table.rows.values() {
                let value = match document.get(&index.field) {
                    Some(Value::Null) | None => continue,
                    Some(value) => value.to_string(),
                };
                if !seen.insert(value.clone()) {
                    return Err(StoreError::ConstraintViolation {
                        collection: collection.to_string(),
                        field: index.field.clone(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builder for an [`InMemoryStore`] with unique indexes.
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    unique: Vec<UniqueIndex>,
}

impl InMemoryStoreBuilder {
    /// Reject commits that leave two rows of `collection` with the same
    /// non-null `field` value.
    pub fn unique(mut self, collection: &str, field: &str) -> Self {
        self.unique.push(UniqueIndex {
            collection: collection.to_string(),
            field: field.to_string(),
        });
        self
    }

    pub fn build(self) -> InMemoryStore {
        InMemoryStore {
            tables: Arc::new(RwLock::new(HashMap::new())),
            unique: Arc::new(self.unique),
        }
    }
}

fn stamp_identity(document: &mut Document, id_field: &str, id: Identity) {
    if let Value::Object(fields) = document {
        fields.insert(id_field.to_string(), Value::from(id));
    }
}

impl Store for InMemoryStore {
    fn fetch(&self, collection: &str, id: Identity) -> StoreResult<Option<Document>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("fetch"))?;

        Ok(tables
            .get(collection)
            .and_then(|table| table.rows.get(&id))
            .cloned())
    }

    fn scan(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<(Identity, Document)>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("scan"))?;

        let Some(table) = tables.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(table
            .rows
            .iter()
            .filter(|(_, document)| filter.map_or(true, |f| f.matches_document(document)))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(id, document)| (*id, document.clone()))
            .collect())
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("count"))?;

        Ok(tables.get(collection).map_or(0, |table| table.rows.len()))
    }

    fn apply(&self, changes: Vec<Change>) -> StoreResult<CommitReceipt> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("commit"))?;

        // Stage copies of the touched tables so a failing change leaves storage untouched.
        let mut staged: HashMap<&'static str, Table> = HashMap::new();
        for change in &changes {
            let collection = change.collection();
            if !staged.contains_key(collection) {
                let table = tables.get(collection).cloned().unwrap_or_default();
                staged.insert(collection, table);
            }
        }

        let mut receipt = CommitReceipt::default();
        for change in changes {
            match change {
                Change::Insert {
                    collection,
                    id_field,
                    id,
                    mut document,
                } => {
                    let table = staged.entry(collection).or_default();
                    let id = if id > 0 {
                        if table.rows.contains_key(&id) {
                            return Err(StoreError::DuplicateIdentity {
                                collection: collection.to_string(),
                                id,
                            });
                        }
                        let after = id
                            .checked_add(1)
                            .ok_or_else(|| StoreError::identity_exhausted(collection))?;
                        table.next_id = table.next_id.max(after);
                        id
                    } else {
                        let id = table.next_id;
                        table.next_id = id
                            .checked_add(1)
                            .ok_or_else(|| StoreError::identity_exhausted(collection))?;
                        id
                    };
                    stamp_identity(&mut document, id_field, id);
                    table.rows.insert(id, document);
                    receipt.assigned.push(id);
                }
                Change::Update {
                    collection,
                    id_field,
                    id,
                    mut document,
                } => {
                    let table = staged.entry(collection).or_default();
                    let Some(row) = table.rows.get_mut(&id) else {
                        return Err(StoreError::row_missing(collection, id));
                    };
                    stamp_identity(&mut document, id_field, id);
                    *row = document;
                }
                Change::Delete { collection, id } => {
                    let table = staged.entry(collection).or_default();
                    if table.rows.remove(&id).is_none() {
                        return Err(StoreError::row_missing(collection, id));
                    }
                }
            }
            receipt.affected += 1;
        }

        for (collection, table) in &staged {
            self.check_unique(collection, table)?;
        }

        for (collection, table) in staged {
            tables.insert(collection.to_string(), table);
        }

        Ok(receipt)
    }
}
