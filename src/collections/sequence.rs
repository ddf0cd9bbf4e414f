// ============================================================================
// spark-state - ImmutableSequence
// Persistent indexed container with path operations
// ============================================================================

use std::fmt;
use std::rc::Rc;

use super::path::PathSegment;
use super::value::{set_in, Value};

// =============================================================================
// IMMUTABLE SEQUENCE
// =============================================================================

/// A persistent, indexed list of [`Value`]s.
///
/// Out-of-range writes are not errors: they return the receiver itself
/// (same allocation), so callers can detect a no-op with [`ptr_eq`].
///
/// [`ptr_eq`]: ImmutableSequence::ptr_eq
///
/// # Example
///
/// ```
/// use spark_state::{ImmutableSequence, Value};
///
/// let s = ImmutableSequence::from_iter(["a", "b"]);
/// let appended = s.set(2, "c");
/// let ignored = s.set(5, "z");
///
/// assert_eq!(appended.len(), 3);
/// assert!(ignored.ptr_eq(&s));
/// ```
#[derive(Clone, Default)]
pub struct ImmutableSequence {
    items: Rc<Vec<Value>>,
}

impl ImmutableSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_items(items: Vec<Value>) -> Self {
        Self {
            items: Rc::new(items),
        }
    }

    /// Copy-on-write: clone the item list, mutate the copy, wrap it.
    fn with_items(&self, f: impl FnOnce(&mut Vec<Value>)) -> Self {
        let mut items = Vec::clone(&self.items);
        f(&mut items);
        Self::from_items(items)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// The element at `index`, or `default`.
    pub fn get_or(&self, index: usize, default: impl Into<Value>) -> Value {
        match self.items.get(index) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Value> {
        self.items.last()
    }

    /// Elements in order
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Read the value at `path`. The first segment must address a position.
    /// An empty path resolves to nothing here; use [`Value::get_path`] to
    /// address the root itself.
    pub fn get_path(&self, path: &[PathSegment]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        self.get(first.as_index()?)?.get_path(rest)
    }

    /// Read the value at `path`, or `default` if it does not resolve.
    /// An empty path yields the sequence itself.
    pub fn get_path_or(&self, path: &[PathSegment], default: impl Into<Value>) -> Value {
        if path.is_empty() {
            return Value::Seq(self.clone());
        }
        match self.get_path(path) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    // =========================================================================
    // WRITES (each returns a new sequence, or the receiver on a no-op)
    // =========================================================================

    /// Replace the element at `index`. `index == len` appends; anything
    /// beyond returns the receiver.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Self {
        let len = self.items.len();
        if index > len {
            return self.clone();
        }
        let value = value.into();
        self.with_items(|items| {
            if index == len {
                items.push(value);
            } else {
                items[index] = value;
            }
        })
    }

    /// Append an element.
    pub fn push(&self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.with_items(|items| items.push(value))
    }

    /// Remove the element at `index`, shifting later elements down.
    /// Out of range returns the receiver.
    pub fn delete(&self, index: usize) -> Self {
        if index >= self.items.len() {
            return self.clone();
        }
        self.with_items(|items| {
            items.remove(index);
        })
    }

    /// Replace the element at `index` with `f(current)`. An absent index
    /// returns the receiver without calling `f`.
    pub fn update<V, F>(&self, index: usize, f: F) -> Self
    where
        V: Into<Value>,
        F: FnOnce(&Value) -> V,
    {
        match self.items.get(index) {
            Some(current) => {
                let next = f(current).into();
                self.set(index, next)
            }
            None => self.clone(),
        }
    }

    /// Write `value` at `path`, materialising missing branches.
    ///
    /// Same rules as [`ImmutableMap::set_path`](super::ImmutableMap::set_path):
    /// an impossible write returns the receiver, and an empty path replaces
    /// the sequence only when `value` is itself a sequence.
    pub fn set_path(&self, path: &[PathSegment], value: impl Into<Value>) -> Self {
        let value = value.into();
        if path.is_empty() {
            return match value {
                Value::Seq(seq) => seq,
                _ => self.clone(),
            };
        }

        let root = Value::Seq(self.clone());
        match set_in(Some(&root), path, value) {
            Some(Value::Seq(seq)) => seq,
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

    /// Structural deep equality. Same as `==`.
    pub fn equals(&self, other: &ImmutableSequence) -> bool {
        self == other
    }

    /// True if both sequences share the same backing allocation.
    pub fn ptr_eq(&self, other: &ImmutableSequence) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl PartialEq for ImmutableSequence {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.items == other.items
    }
}

impl fmt::Debug for ImmutableSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<V: Into<Value>> FromIterator<V> for ImmutableSequence {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a ImmutableSequence {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::ImmutableMap;
    use crate::path;

    fn abc() -> ImmutableSequence {
        ImmutableSequence::from_iter(["a", "b", "c"])
    }

    #[test]
    fn get_in_and_out_of_range() {
        let s = abc();
        assert_eq!(s.get(1), Some(&Value::from("b")));
        assert!(s.get(3).is_none());
        assert_eq!(s.get_or(10, "none"), "none");
        assert_eq!(s.first(), Some(&Value::from("a")));
        assert_eq!(s.last(), Some(&Value::from("c")));
    }

    #[test]
    fn get_path_or_empty_path_is_the_sequence() {
        let s = abc();
        let root = s.get_path_or(&path![], "none");
        assert!(root.as_seq().is_some_and(|r| r.ptr_eq(&s)));
        assert_eq!(s.get_path_or(&path![7], "none"), "none");
    }

    #[test]
    fn set_replaces_appends_or_ignores() {
        let s = abc();

        let replaced = s.set(0, "z");
        assert_eq!(replaced.get(0), Some(&Value::from("z")));
        assert_eq!(s.get(0), Some(&Value::from("a")));

        let appended = s.set(3, "d");
        assert_eq!(appended.len(), 4);

        let ignored = s.set(4, "e");
        assert!(ignored.ptr_eq(&s));
        assert!(ignored.equals(&s));
    }

    #[test]
    fn push_appends() {
        let s = ImmutableSequence::new().push(1).push(2);
        assert_eq!(s, ImmutableSequence::from_iter([1, 2]));
    }

    #[test]
    fn delete_shifts_down() {
        let s = abc();
        let d = s.delete(1);
        assert_eq!(d, ImmutableSequence::from_iter(["a", "c"]));
        assert_eq!(s.len(), 3);

        assert!(s.delete(3).ptr_eq(&s));
    }

    #[test]
    fn update_absent_index_is_noop() {
        let s = ImmutableSequence::from_iter([1, 2]);

        let doubled = s.update(1, |v| v.as_int().unwrap_or(0) * 2);
        assert_eq!(doubled.get(1), Some(&Value::Int(4)));

        let mut called = false;
        let same = s.update(2, |_| {
            called = true;
            0
        });
        assert!(!called);
        assert!(same.ptr_eq(&s));
    }

    #[test]
    fn set_path_into_nested_map() {
        let s = ImmutableSequence::new().push(ImmutableMap::new().set("name", "ann"));
        let s2 = s.set_path(&path![0, "name"], "bob");

        assert_eq!(s.get_path(&path![0, "name"]), Some(&Value::from("ann")));
        assert_eq!(s2.get_path(&path![0, "name"]), Some(&Value::from("bob")));
    }

    #[test]
    fn set_path_appends_materialised_branch() {
        let s = ImmutableSequence::new().set_path(&path![0, 0], true);
        assert_eq!(s.get_path(&path![0, 0]), Some(&Value::Bool(true)));
        assert!(s.get(0).and_then(Value::as_seq).is_some());
    }

    #[test]
    fn set_path_rejects_keys_on_sequence() {
        let s = abc();
        assert!(s.set_path(&path!["name"], 1).ptr_eq(&s));
        // numeric strings are positions
        assert_eq!(s.set_path(&path!["1"], "B").get(1), Some(&Value::from("B")));
    }

    #[test]
    fn update_path_on_sequence() {
        let s = ImmutableSequence::from_iter([10, 20]);
        let s = s.update_path(&path![1], |v| v.and_then(Value::as_int).unwrap_or(0) + 1);
        assert_eq!(s.get(1), Some(&Value::Int(21)));
    }

    #[test]
    fn untouched_elements_are_shared() {
        let inner = ImmutableMap::new().set("k", 1);
        let s = ImmutableSequence::new().push(inner).push(2);
        let s2 = s.set(1, 3);
        assert!(s.get(0).unwrap().identical(s2.get(0).unwrap()));
    }

    #[test]
    fn equality_is_ordered() {
        assert_ne!(
            ImmutableSequence::from_iter([1, 2]),
            ImmutableSequence::from_iter([2, 1])
        );
        assert_ne!(
            ImmutableSequence::from_iter([1]),
            ImmutableSequence::from_iter([1, 1])
        );
    }

    #[test]
    fn iterates_by_reference() {
        let s = ImmutableSequence::from_iter([1, 2, 3]);
        let sum: i64 = (&s).into_iter().filter_map(Value::as_int).sum();
        assert_eq!(sum, 6);
        assert_eq!(s.iter().count(), 3);
    }
}
