//! Ordered request parameter storage.
//!
//! [`ParamBag`] holds string parameters gathered from path captures, the query
//! string and the request body. It keeps insertion order, which makes
//! validation reports deterministic (the first offending field is always the
//! first one the request supplied).

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Ordered name/value parameters for one request.
///
/// Uses small-vector optimization to avoid heap allocation for the common
/// case of a handful of parameters. Names are unique: [`ParamBag::insert`]
/// replaces an existing value in place.
///
/// # Example
///
/// ```rust
/// use switchyard_core::ParamBag;
///
/// let mut params = ParamBag::new();
/// params.insert("id", "42");
/// params.insert("verbose", "true");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamBag {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl ParamBag {
    /// Creates a new empty parameter bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parameter bag with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Sets a parameter, replacing the value of an existing name.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.inner.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.inner.push((name, value));
        None
    }

    /// Sets a parameter only if the name is not present yet.
    ///
    /// Returns `true` if the value was stored.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.inner.push((name, value.into()));
        true
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if a parameter with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(n, _)| n == name)
    }

    /// Removes a parameter, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.inner.iter().position(|(n, _)| n == name)?;
        Some(self.inner.remove(index).1)
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the parameter names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(n, _)| n.as_str())
    }

    /// Adds every parameter of `other` whose name is not present yet.
    ///
    /// Existing values win, so merging the path captures first gives them
    /// precedence over query and body parameters.
    pub fn merge_missing(&mut self, other: &ParamBag) {
        for (name, value) in other.iter() {
            self.insert_if_absent(name, value);
        }
    }
}

impl<'a> IntoIterator for &'a ParamBag {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for ParamBag {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (name, value) in iter {
            bag.insert(name, value);
        }
        bag
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ParamBag {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }
}

impl Serialize for ParamBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for (name, value) in &self.inner {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_new() {
        let params = ParamBag::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut params = ParamBag::new();
        params.insert("a", "1");
        params.insert("b", "2");
        let previous = params.insert("a", "3");

        assert_eq!(previous, Some("1".to_string()));
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_insert_if_absent() {
        let mut params = ParamBag::new();
        assert!(params.insert_if_absent("id", "42"));
        assert!(!params.insert_if_absent("id", "7"));
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut captures: ParamBag = [("id", "42")].into_iter().collect();
        let query: ParamBag = [("id", "99"), ("page", "2")].into_iter().collect();

        captures.merge_missing(&query);
        assert_eq!(captures.get("id"), Some("42"));
        assert_eq!(captures.get("page"), Some("2"));
        assert_eq!(captures.names().collect::<Vec<_>>(), vec!["id", "page"]);
    }

    #[test]
    fn test_remove() {
        let mut params: ParamBag = [("_token", "abc"), ("q", "rust")].into_iter().collect();
        assert_eq!(params.remove("_token"), Some("abc".to_string()));
        assert_eq!(params.remove("_token"), None);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_many_params_spill_to_heap() {
        let mut params = ParamBag::new();
        for i in 0..10 {
            params.insert(format!("key{i}"), format!("value{i}"));
        }

        assert_eq!(params.len(), 10);
        assert_eq!(params.get("key5"), Some("value5"));
    }

    #[test]
    fn test_serializes_as_object_in_order() {
        let params: ParamBag = [("b", "2"), ("a", "1")].into_iter().collect();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"b":"2","a":"1"}"#);
    }
}
