use std::time::Duration;

use thiserror::Error;

use crate::entity::Identity;

/// Result type used across the store and repository layers.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by stores, sessions and repositories.
///
/// Absence is never an error: `get`/`find` report it as `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An update or delete targeted an identity with no stored row.
    #[error("no {collection} row with identity {id}")]
    RowMissing { collection: String, id: Identity },

    /// An insert carried an explicit identity that is already taken.
    #[error("identity {id} already exists in {collection}")]
    DuplicateIdentity { collection: String, id: Identity },

    /// The collection's identity counter cannot advance past `i64::MAX`.
    #[error("no identities left in {collection}")]
    IdentityExhausted { collection: String },

    /// A unique index rejected the commit.
    #[error("unique constraint on {collection}.{field} violated by value {value}")]
    ConstraintViolation {
        collection: String,
        field: String,
        value: String,
    },

    /// Entity (de)serialization failed.
    #[error("entity serialization error: {0}")]
    Serde(String),

    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    /// A unique lookup matched more than one row (strict find policy only).
    /// `matches` is a lower bound: the lookup stops scanning at the second hit.
    #[error("expected at most one {collection} match, found {matches} or more")]
    AmbiguousMatch { collection: String, matches: usize },

    /// An async operation exceeded the configured timeout.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The blocking task running an async operation failed.
    #[error("store task failed: {0}")]
    Join(String),

    #[error("invalid repository configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn row_missing(collection: impl Into<String>, id: Identity) -> Self {
        Self::RowMissing {
            collection: collection.into(),
            id,
        }
    }

    pub fn identity_exhausted(collection: impl Into<String>) -> Self {
        Self::IdentityExhausted {
            collection: collection.into(),
        }
    }

    pub fn serde(err: impl std::fmt::Display) -> Self {
        Self::Serde(err.to_string())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures raised while applying a commit.
    pub fn is_commit_failure(&self) -> bool {
        matches!(
            self,
            Self::RowMissing { .. }
                | Self::DuplicateIdentity { .. }
                | Self::IdentityExhausted { .. }
                | Self::ConstraintViolation { .. }
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err)
    }
}
