// ============================================================================
// spark-state - ImmutableMap
// Persistent keyed container with path operations
// ============================================================================

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::path::PathSegment;
use super::value::{set_in, Value};

// =============================================================================
// IMMUTABLE MAP
// =============================================================================

/// A persistent, insertion-ordered map from string keys to [`Value`]s.
///
/// Every mutator returns a new map and leaves the receiver untouched. The new
/// map shares every untouched child with the old one by reference count;
/// only the top-level entry table is copied.
///
/// # Example
///
/// ```
/// use spark_state::{path, ImmutableMap, Value};
///
/// let m1 = ImmutableMap::new().set("a", 1).set("b", ImmutableMap::new().set("c", 2));
/// let m2 = m1.set_path(&path!["b", "c"], 20);
///
/// assert_eq!(m1.get_path(&path!["b", "c"]), Some(&Value::Int(2)));
/// assert_eq!(m2.get_path(&path!["b", "c"]), Some(&Value::Int(20)));
/// ```
#[derive(Clone, Default)]
pub struct ImmutableMap {
    entries: Rc<IndexMap<String, Value>>,
}

impl ImmutableMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: IndexMap<String, Value>) -> Self {
        Self {
            entries: Rc::new(entries),
        }
    }

    /// Copy-on-write: clone the entry table, mutate the copy, wrap it.
    fn with_entries(&self, f: impl FnOnce(&mut IndexMap<String, Value>)) -> Self {
        let mut entries = IndexMap::clone(&self.entries);
        f(&mut entries);
        Self::from_entries(entries)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The value bound to `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// The value bound to `key`, or `default`.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        match self.entries.get(key) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    pub(crate) fn get_segment(&self, segment: &PathSegment) -> Option<&Value> {
        match segment {
            PathSegment::Key(key) => self.entries.get(key.as_str()),
            PathSegment::Index(index) => self.entries.get(index.to_string().as_str()),
        }
    }

    /// True if `key` is bound
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read the value at `path`. An empty path resolves to nothing here;
    /// use [`Value::get_path`] to address the root itself.
    pub fn get_path(&self, path: &[PathSegment]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        self.get_segment(first)?.get_path(rest)
    }

    /// Read the value at `path`, or `default` if it does not resolve.
    /// An empty path yields the map itself.
    pub fn get_path_or(&self, path: &[PathSegment], default: impl Into<Value>) -> Value {
        if path.is_empty() {
            return Value::Map(self.clone());
        }
        match self.get_path(path) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    // =========================================================================
    // WRITES (each returns a new map)
    // =========================================================================

    /// Bind `key` to `value`. An existing key keeps its position.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        self.with_entries(|entries| {
            entries.insert(key, value);
        })
    }

    /// Remove `key`, preserving the order of the remaining entries.
    /// An absent key returns the receiver.
    pub fn remove(&self, key: &str) -> Self {
        if !self.entries.contains_key(key) {
            return self.clone();
        }
        self.with_entries(|entries| {
            entries.shift_remove(key);
        })
    }

    /// Bind `key` to `f(current)`. Always writes, even when `key` is absent.
    pub fn update<V, F>(&self, key: impl Into<String>, f: F) -> Self
    where
        V: Into<Value>,
        F: FnOnce(Option<&Value>) -> V,
    {
        let key = key.into();
        let next = f(self.entries.get(&key)).into();
        self.set(key, next)
    }

    /// Write `value` at `path`, materialising missing branches.
    ///
    /// The kind of each materialised branch follows the segment that
    /// addresses into it: index → sequence, key → map. An impossible write
    /// (index past the end of an existing sequence, non-numeric key on a
    /// sequence) returns the receiver unchanged.
    ///
    /// An empty path replaces the map itself; since the result must stay a
    /// map, a non-map `value` leaves the receiver unchanged. Use
    /// [`Value::set_path`] for unrestricted root replacement.
    pub fn set_path(&self, path: &[PathSegment], value: impl Into<Value>) -> Self {
        let value = value.into();
        if path.is_empty() {
            return match value {
                Value::Map(map) => map,
                _ => self.clone(),
            };
        }

        let root = Value::Map(self.clone());
        match set_in(Some(&root), path, value) {
            Some(Value::Map(map)) => map,
            _ => self.clone(),
        }
    }

    /// Write `f(current)` at `path`; `current` is None when nothing resolves.
    pub fn update_path<V, F>(&self, path: &[PathSegment], f: F) -> Self
    where
        V: Into<Value>,
        F: FnOnce(Option<&Value>) -> V,
    {
        let next = f(self.get_path(path)).into();
        self.set_path(path, next)
    }

    // =========================================================================
    // EQUALITY
    // =========================================================================

    /// Structural deep equality (order-insensitive). Same as `==`.
    pub fn equals(&self, other: &ImmutableMap) -> bool {
        self == other
    }

    /// True if both maps share the same backing allocation.
    pub fn ptr_eq(&self, other: &ImmutableMap) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

impl PartialEq for ImmutableMap {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.entries.get(key) == Some(value))
    }
}

impl fmt::Debug for ImmutableMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for ImmutableMap
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::ImmutableSequence;
    use crate::path;

    fn sample() -> ImmutableMap {
        ImmutableMap::new()
            .set("a", 1)
            .set("b", ImmutableMap::new().set("c", 2))
    }

    #[test]
    fn get_with_default() {
        let m = sample();
        assert_eq!(m.get("a"), Some(&Value::Int(1)));
        assert_eq!(m.get_or("missing", "fallback"), "fallback");
        assert!(m.get("missing").is_none());
    }

    #[test]
    fn set_returns_new_map_and_keeps_receiver() {
        let m1 = sample();
        let m2 = m1.set("a", 100);

        assert_eq!(m1.get("a"), Some(&Value::Int(1)));
        assert_eq!(m2.get("a"), Some(&Value::Int(100)));
        assert!(!m1.ptr_eq(&m2));
    }

    #[test]
    fn sibling_branches_are_shared() {
        let m1 = sample();
        let m2 = m1.set("a", 1000);

        let before = m1.get("b").unwrap();
        let after = m2.get("b").unwrap();
        assert!(before.identical(after));
    }

    #[test]
    fn set_keeps_key_position() {
        let m = ImmutableMap::new().set("x", 1).set("y", 2).set("x", 3);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn remove_key() {
        let m = ImmutableMap::new().set("x", 1).set("y", 2).set("z", 3);
        let removed = m.remove("y");
        assert_eq!(removed.keys().collect::<Vec<_>>(), vec!["x", "z"]);
        assert_eq!(m.len(), 3);

        assert!(m.remove("nope").ptr_eq(&m));
    }

    #[test]
    fn update_always_writes() {
        let m = ImmutableMap::new();
        let m = m.update("count", |current| {
            assert!(current.is_none());
            1
        });
        let m = m.update("count", |current| current.and_then(Value::as_int).unwrap_or(0) + 1);
        assert_eq!(m.get("count"), Some(&Value::Int(2)));
    }

    #[test]
    fn set_path_materialises_by_next_segment() {
        let m = ImmutableMap::new().set_path(&path!["a", 0, "b"], "x");

        assert_eq!(m.get_path(&path!["a", 0, "b"]), Some(&Value::from("x")));
        assert!(m.get("a").and_then(Value::as_seq).is_some());
        assert!(m.get_path(&path!["a", 0]).and_then(Value::as_map).is_some());
    }

    #[test]
    fn set_path_leaves_original_untouched() {
        let m = sample();
        let m2 = m.set_path(&path!["b", "c"], 20);

        assert_eq!(m.get_path(&path!["b", "c"]), Some(&Value::Int(2)));
        assert_eq!(m2.get_path(&path!["b", "c"]), Some(&Value::Int(20)));
        assert!(m.get("a").unwrap().identical(m2.get("a").unwrap()));
    }

    #[test]
    fn set_path_index_on_map_uses_decimal_key() {
        let m = ImmutableMap::new().set("items", ImmutableMap::new());
        let m = m.set_path(&path!["items", 3], "three");
        assert_eq!(m.get_path(&path!["items", "3"]), Some(&Value::from("three")));
        assert_eq!(m.get_path(&path!["items", 3]), Some(&Value::from("three")));
    }

    #[test]
    fn set_path_empty() {
        let m = sample();
        let replacement = ImmutableMap::new().set("only", true);
        assert!(m.set_path(&path![], replacement.clone()).ptr_eq(&replacement));
        assert!(m.set_path(&path![], 5).ptr_eq(&m));
    }

    #[test]
    fn set_path_out_of_range_is_noop() {
        let m = ImmutableMap::new().set("list", ImmutableSequence::from_iter([1, 2]));
        let same = m.set_path(&path!["list", 4], 9);
        assert!(same.ptr_eq(&m));
    }

    #[test]
    fn set_path_past_fresh_sequence_leaves_empty_map() {
        // "a" would materialise as an empty sequence, and index 2 is past
        // its end, so the whole write is dropped: no empty "a" is left behind.
        let m = ImmutableMap::new();
        let same = m.set_path(&path!["a", 2], "x");
        assert!(same.ptr_eq(&m));
        assert!(same.is_empty());
        assert!(!same.contains_key("a"));

        // Index 0 on the fresh sequence is an append and succeeds
        let written = m.set_path(&path!["a", 0], "x");
        assert_eq!(written.to_plain(), serde_json::json!({"a": ["x"]}));
    }

    #[test]
    fn update_path_reads_then_writes() {
        let m = sample().update_path(&path!["b", "c"], |v| {
            v.and_then(Value::as_int).unwrap_or(0) + 1
        });
        assert_eq!(m.get_path(&path!["b", "c"]), Some(&Value::Int(3)));

        let m = m.update_path(&path!["x", "y"], |v| v.cloned().unwrap_or(Value::Null));
        assert_eq!(m.get_path(&path!["x", "y"]), Some(&Value::Null));
    }

    #[test]
    fn get_path_default() {
        let m = sample();
        assert_eq!(m.get_path_or(&path!["a", "deeper"], -1), -1);
    }

    #[test]
    fn get_path_or_empty_path_is_the_map() {
        let m = sample();
        let root = m.get_path_or(&path![], "root");
        assert!(root.as_map().is_some_and(|r| r.ptr_eq(&m)));
        assert!(m.get_path(&path![]).is_none());
    }

    #[test]
    fn structural_equality_ignores_order() {
        let a = ImmutableMap::new().set("x", 1).set("y", 2);
        let b = ImmutableMap::new().set("y", 2).set("x", 1.0);
        assert!(a.equals(&b));
        assert_ne!(a, b.set("z", 3));
        assert_ne!(a, ImmutableMap::new().set("x", 1).set("y", "2"));
    }

    #[test]
    fn from_iterator() {
        let m: ImmutableMap = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(m.len(), 2);
        assert_eq!(m.iter().map(|(k, _)| k).collect::<String>(), "ab");
    }
}
