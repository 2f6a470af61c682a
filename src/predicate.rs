//! Predicates - filters over entities for `find` / `find_all`.
//!
//! A predicate is either a plain closure, evaluated in-process against
//! deserialized entities, or a structured [`Filter`] that a store can evaluate
//! natively against stored documents. Both paths give the same answer: a
//! `Filter` used as an in-process predicate serializes the entity and runs
//! the exact same evaluation.
//!
//! ## Example
//!
//! ```ignore
//! // In-process
//! repo.find_all(|u: &User| u.age >= 18)?;
//!
//! // Store-native
//! repo.find_all(Filter::gte("age", 18).and(Filter::eq("active", true)))?;
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pure boolean test over a single entity.
pub trait Predicate<T>: Send + Sync {
    fn matches(&self, entity: &T) -> bool;

    /// Structured form the store can evaluate natively, if any.
    fn filter(&self) -> Option<&Filter> {
        None
    }
}

impl<T, F> Predicate<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, entity: &T) -> bool {
        self(entity)
    }
}

impl<T: Serialize> Predicate<T> for Filter {
    fn matches(&self, entity: &T) -> bool {
        match serde_json::to_value(entity) {
            Ok(document) => self.matches_document(&document),
            Err(_) => false,
        }
    }

    fn filter(&self) -> Option<&Filter> {
        Some(self)
    }
}

/// Structured filter over the serialized fields of an entity.
///
/// Fields are addressed by name; dotted names (`"address.city"`) descend into
/// nested objects. A missing field reads as `null`. Ordering comparisons only
/// hold between two numbers or two strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    Gt { field: String, value: Value },
    Gte { field: String, value: Value },
    Lt { field: String, value: Value },
    Lte { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    IsNull { field: String },
    IsNotNull { field: String },
    And { filters: Vec<Filter> },
    Or { filters: Vec<Filter> },
    Not { filter: Box<Filter> },
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Filter::Ne {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gt {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gte {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lt {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lte {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(field: &str) -> Self {
        Filter::IsNull {
            field: field.to_string(),
        }
    }

    pub fn is_not_null(field: &str) -> Self {
        Filter::IsNotNull {
            field: field.to_string(),
        }
    }

    /// Conjunction. Nested `And`s are flattened.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And { mut filters } => {
                filters.push(other);
                Filter::And { filters }
            }
            first => Filter::And {
                filters: vec![first, other],
            },
        }
    }

    /// Disjunction. Nested `Or`s are flattened.
    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or { mut filters } => {
                filters.push(other);
                Filter::Or { filters }
            }
            first => Filter::Or {
                filters: vec![first, other],
            },
        }
    }

    pub fn negate(self) -> Self {
        Filter::Not {
            filter: Box::new(self),
        }
    }

    /// Evaluate against a stored document.
    pub fn matches_document(&self, document: &Value) -> bool {
        match self {
            Filter::Eq { field, value } => values_equal(lookup(document, field), value),
            Filter::Ne { field, value } => !values_equal(lookup(document, field), value),
            Filter::Gt { field, value } => {
                compare(lookup(document, field), value) == Some(Ordering::Greater)
            }
            Filter::Gte { field, value } => matches!(
                compare(lookup(document, field), value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt { field, value } => {
                compare(lookup(document, field), value) == Some(Ordering::Less)
            }
            Filter::Lte { field, value } => matches!(
                compare(lookup(document, field), value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::In { field, values } => {
                let actual = lookup(document, field);
                values.iter().any(|candidate| values_equal(actual, candidate))
            }
            Filter::IsNull { field } => lookup(document, field).is_null(),
            Filter::IsNotNull { field } => !lookup(document, field).is_null(),
            Filter::And { filters } => filters.iter().all(|f| f.matches_document(document)),
            Filter::Or { filters } => filters.iter().any(|f| f.matches_document(document)),
            Filter::Not { filter } => !filter.matches_document(document),
        }
    }
}

static NULL: Value = Value::Null;

fn lookup<'a>(document: &'a Value, field: &str) -> &'a Value {
    let mut current = document;
    for segment in field.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return &NULL,
        }
    }
    current
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(_), Value::Number(_)) => compare(actual, expected) == Some(Ordering::Equal),
        _ => actual == expected,
    }
}

fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                Some(a.cmp(&b))
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                Some(a.cmp(&b))
            } else {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
