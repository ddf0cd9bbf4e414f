// ============================================================================
// spark-state - Value
// Scalars and persistent containers stored in a state tree
// ============================================================================

use std::fmt;
use std::rc::Rc;

use super::map::ImmutableMap;
use super::path::PathSegment;
use super::sequence::ImmutableSequence;

// =============================================================================
// VALUE
// =============================================================================

/// A node of a persistent state tree.
///
/// Scalars (`Null`, `Bool`, `Int`, `UInt`, `Float`, `Str`) are stored as-is.
/// Keyed and indexed data is always held in a persistent container, never
/// in a raw nested structure: every `From` conversion into `Value` converts
/// nested vectors and maps recursively.
///
/// Cloning a `Value` is cheap: containers and strings are reference counted.
#[derive(Clone)]
pub enum Value {
    /// Absent / null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer number
    Int(i64),
    /// Unsigned integer above `i64::MAX`; smaller ones are `Int`
    UInt(u64),
    /// Floating-point number
    Float(f64),
    /// UTF-8 string
    Str(Rc<str>),
    /// Keyed persistent container
    Map(ImmutableMap),
    /// Indexed persistent container
    Seq(ImmutableSequence),
}

impl Value {
    // =========================================================================
    // CLASSIFICATION
    // =========================================================================

    /// True for leaf values that are never converted further.
    pub fn is_scalar(&self) -> bool {
        !self.is_persistent()
    }

    /// True if this value is one of the persistent containers.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Seq(_))
    }

    /// True for `Value::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Map(_) => "map",
            Value::Seq(_) => "sequence",
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Integer value as u64, if it is non-negative
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            Value::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Numeric value as f64 (integers are widened)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            Value::UInt(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ImmutableMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&ImmutableSequence> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    // =========================================================================
    // EQUALITY
    // =========================================================================

    /// Structural deep equality. Same as `==`.
    pub fn equals(&self, other: &Value) -> bool {
        self == other
    }

    /// Identity equality: scalars compare by value, containers by allocation.
    ///
    /// Two containers are identical only if one is a clone of the other (or
    /// an operation returned the receiver unchanged).
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Seq(a), Value::Seq(b)) => a.ptr_eq(b),
            (Value::Map(_) | Value::Seq(_), _) | (_, Value::Map(_) | Value::Seq(_)) => false,
            (a, b) => a == b,
        }
    }

    // =========================================================================
    // PATH OPERATIONS
    // =========================================================================

    /// Read the value at `path`. `None` as soon as a segment does not resolve.
    ///
    /// An empty path resolves to `self`.
    pub fn get_path(&self, path: &[PathSegment]) -> Option<&Value> {
        let mut node = self;
        for segment in path {
            node = match node {
                Value::Map(map) => map.get_segment(segment)?,
                Value::Seq(seq) => seq.get(segment.as_index()?)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Read the value at `path`, or `default` if it does not resolve.
    pub fn get_path_or(&self, path: &[PathSegment], default: impl Into<Value>) -> Value {
        match self.get_path(path) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    /// Return a new tree with `value` written at `path`.
    ///
    /// Missing branches (and scalars in the way) are replaced by fresh
    /// containers: a sequence when the segment addressing into them is an
    /// index, a map otherwise. An empty path replaces the whole value.
    ///
    /// If the write is impossible (an index beyond a sequence's length, or a
    /// non-numeric key addressing a sequence), the receiver is returned
    /// unchanged.
    pub fn set_path(&self, path: &[PathSegment], value: impl Into<Value>) -> Value {
        match set_in(Some(self), path, value.into()) {
            Some(updated) => updated,
            None => self.clone(),
        }
    }

    /// Apply `f` to the value at `path` (None if absent) and write the result there.
    pub fn update_path<V, F>(&self, path: &[PathSegment], f: F) -> Value
    where
        V: Into<Value>,
        F: FnOnce(Option<&Value>) -> V,
    {
        let next = f(self.get_path(path)).into();
        self.set_path(path, next)
    }
}

/// Write `value` under `node` at `path`, materialising missing containers.
///
/// Returns `None` when the write is a no-op somewhere along the path.
pub(crate) fn set_in(node: Option<&Value>, path: &[PathSegment], value: Value) -> Option<Value> {
    let Some((segment, rest)) = path.split_first() else {
        return Some(value);
    };

    match node {
        Some(Value::Map(map)) => {
            let child = map.get_segment(segment);
            let updated = set_in(child, rest, value)?;
            Some(Value::Map(map.set(segment.to_key(), updated)))
        }
        Some(Value::Seq(seq)) => {
            let index = segment.as_index()?;
            if index > seq.len() {
                return None;
            }
            let updated = set_in(seq.get(index), rest, value)?;
            Some(Value::Seq(seq.set(index, updated)))
        }
        _ => {
            let fresh = if segment.is_index() {
                Value::Seq(ImmutableSequence::new())
            } else {
                Value::Map(ImmutableMap::new())
            };
            set_in(Some(&fresh), path, value)
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Int(a), Value::UInt(b)) | (Value::UInt(b), Value::Int(a)) => {
                i128::from(*a) == i128::from(*b)
            }
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::UInt(a), Value::Float(b)) | (Value::Float(b), Value::UInt(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Map(m) => fmt::Debug::fmt(m, f),
            Value::Seq(s) => fmt::Debug::fmt(s, f),
        }
    }
}

// Direct comparisons with primitives
impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        *self == Value::Int(*other)
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        *self == Value::Int(i64::from(*other))
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        *self == Value::Float(*other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

/// True if `value` is one of the persistent containers.
pub fn is_persistent(value: &Value) -> bool {
    value.is_persistent()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    fn sample() -> Value {
        Value::from(
            ImmutableMap::new()
                .set("a", 1)
                .set("b", ImmutableMap::new().set("c", 2))
                .set("list", ImmutableSequence::from_iter(["x", "y"])),
        )
    }

    #[test]
    fn classification() {
        assert!(Value::Null.is_scalar());
        assert!(Value::from("s").is_scalar());
        assert!(Value::from(ImmutableMap::new()).is_persistent());
        assert!(is_persistent(&Value::from(ImmutableSequence::new())));
        assert_eq!(Value::from(1.5).type_name(), "float");
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Float(1.5));
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Int(0), Value::Bool(false));
    }

    #[test]
    fn unsigned_compares_across_variants() {
        assert_eq!(Value::UInt(7), Value::Int(7));
        assert_ne!(Value::UInt(u64::MAX), Value::Int(-1));
        assert_eq!(Value::UInt(1 << 63), Value::Float(9_223_372_036_854_775_808.0));
        assert_eq!(Value::UInt(u64::MAX).as_int(), None);
        assert_eq!(Value::Int(-1).as_uint(), None);
        assert_eq!(Value::Int(5).as_uint(), Some(5));
    }

    #[test]
    fn primitive_comparisons() {
        assert!(Value::from("hi") == "hi");
        assert!(Value::from(3) == 3);
        assert!(Value::from(true) == true);
        assert!(!(Value::from(3) == "3"));
    }

    #[test]
    fn get_path_walks_mixed_containers() {
        let v = sample();
        assert_eq!(v.get_path(&path!["b", "c"]), Some(&Value::Int(2)));
        assert_eq!(v.get_path(&path!["list", 1]), Some(&Value::from("y")));
        assert_eq!(v.get_path(&path![]), Some(&v));
    }

    #[test]
    fn get_path_misses_return_default() {
        let v = sample();
        // through a scalar
        assert_eq!(v.get_path_or(&path!["a", "x"], "none"), "none");
        // absent key
        assert_eq!(v.get_path_or(&path!["zzz"], 0), 0);
        // out of range
        assert!(v.get_path(&path!["list", 9]).is_none());
        // non-numeric key on a sequence
        assert!(v.get_path(&path!["list", "first"]).is_none());
    }

    #[test]
    fn set_path_on_scalar_root_materialises() {
        let v = Value::from(5).set_path(&path!["a"], 1);
        assert_eq!(v.get_path(&path!["a"]), Some(&Value::Int(1)));
        assert!(v.as_map().is_some());
    }

    #[test]
    fn set_path_empty_replaces_value() {
        let v = sample().set_path(&path![], "replaced");
        assert_eq!(v, "replaced");
    }

    #[test]
    fn set_path_through_scalar_replaces_it() {
        let v = sample().set_path(&path!["a", 0], "first");
        let a = v.get_path(&path!["a"]).unwrap();
        assert!(a.as_seq().is_some());
        assert_eq!(v.get_path(&path!["a", 0]), Some(&Value::from("first")));
    }

    #[test]
    fn impossible_set_path_is_noop() {
        let v = sample();
        let same = v.set_path(&path!["list", 5, "k"], 1);
        assert!(same.identical(&v));

        let same = v.set_path(&path!["list", "name"], 1);
        assert!(same.identical(&v));
    }

    #[test]
    fn update_path_sees_current_value() {
        let v = sample().update_path(&path!["b", "c"], |current| {
            current.and_then(Value::as_int).unwrap_or(0) * 10
        });
        assert_eq!(v.get_path(&path!["b", "c"]), Some(&Value::Int(20)));

        let v = v.update_path(&path!["new"], |current| current.is_none());
        assert_eq!(v.get_path(&path!["new"]), Some(&Value::Bool(true)));
    }

    #[test]
    fn identity_vs_structure() {
        let a = sample();
        let b = sample();
        assert!(a.equals(&b));
        assert!(!a.identical(&b));
        assert!(a.identical(&a.clone()));
    }

    #[test]
    fn debug_output_is_json_like() {
        let v = Value::from(ImmutableMap::new().set("k", "v"));
        assert_eq!(format!("{v:?}"), r#"{"k": "v"}"#);
    }
}
