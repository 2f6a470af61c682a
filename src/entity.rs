//! Entities - records with a durable integer identity.
//!
//! ## Example
//!
//! ```ignore
//! use stored_rust::{Entity, HasIdentity};
//!
//! #[derive(Clone, Serialize, Deserialize, Entity)]
//! #[entity(collection = "users")]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let user = User { id: 0, name: "a".into() };
//! assert!(user.is_transient());
//! ```

use serde::{de::DeserializeOwned, Serialize};

/// Primary key of an entity. `0` means "not yet persisted".
pub type Identity = i64;

/// Identity of an entity that has never been saved.
pub const TRANSIENT: Identity = 0;

/// Capability required by [`Repository`](crate::Repository): an integer identity
/// plus the serde bounds the store needs to persist the rest of the record.
///
/// The identity is assigned by the store on first insert; callers construct new
/// entities with identity `0`.
pub trait HasIdentity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name for this entity type (a table in SQL, a key prefix in KV stores, ...).
    const COLLECTION: &'static str;

    /// Name of the serialized field holding the identity.
    const ID_FIELD: &'static str = "id";

    fn id(&self) -> Identity;

    fn set_id(&mut self, id: Identity);

    /// True until the store has assigned an identity.
    fn is_transient(&self) -> bool {
        self.id() <= TRANSIENT
    }
}
