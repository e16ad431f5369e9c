//! Data contributed by middleware.
//!
//! Each middleware may hand data forward to the handler. The chain executor
//! merges it into an [`Accumulator`] which the handler can declare as an
//! argument. Later middleware see earlier contributions through a read-only
//! view and overwrite keys on conflict.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered key/value data accumulated across a middleware chain.
///
/// # Example
///
/// ```
/// use switchyard_middleware::Accumulator;
///
/// let mut acc = Accumulator::new();
/// acc.insert("user_id", 42);
/// acc.insert("role", "admin");
///
/// assert_eq!(acc.get_i64("user_id"), Some(42));
/// assert_eq!(acc.get_str("role"), Some("admin"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Accumulator {
    values: IndexMap<String, Value>,
}

impl Accumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Returns a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a string value by key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns an integer value by key.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Merges `other` into this accumulator. Keys in `other` win.
    pub fn merge(&mut self, other: Accumulator) {
        self.values.extend(other.values);
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing was accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts the accumulator into a JSON object.
    #[must_use]
    pub fn into_json(self) -> Value {
        Value::Object(self.values.into_iter().collect())
    }
}

impl<K, V> FromIterator<(K, V)> for Accumulator
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
