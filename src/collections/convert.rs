// ============================================================================
// spark-state - Deep Conversion
// Plain nested data <-> persistent state trees
// ============================================================================
//
// "Plain" data is anything shaped like JSON: scalars, arrays and string-keyed
// objects. `serde_json::Value` is the canonical plain form; Rust vectors and
// string-keyed maps convert the same way.
//
// Conversion is recursive and idempotent: converting a `Value` (or one of
// the containers) into a `Value` hands back the same allocation.
// ============================================================================

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map as JsonMap, Number};

use super::map::ImmutableMap;
use super::sequence::ImmutableSequence;
use super::value::Value;
use crate::error::{Error, Result};

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Build a persistent tree from plain data.
///
/// Scalars come back as scalars, arrays become [`ImmutableSequence`]s and
/// objects become [`ImmutableMap`]s, recursively. A value that is already
/// persistent is returned as-is.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use spark_state::{from_plain, path, Value};
///
/// let m = from_plain(json!({"a": 1, "b": {"c": 2}}));
/// assert_eq!(m.get_path(&path!["b", "c"]), Some(&Value::Int(2)));
///
/// // idempotent, same allocation
/// let again = from_plain(m.clone());
/// assert!(again.identical(&m));
/// ```
pub fn from_plain(plain: impl Into<Value>) -> Value {
    plain.into()
}

/// Parse JSON text straight into a persistent tree.
pub fn from_json_str(json: &str) -> Result<Value> {
    let plain: serde_json::Value = serde_json::from_str(json)?;
    Ok(Value::from(plain))
}

/// Serialize a persistent tree as JSON text.
pub fn to_json_string(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

// =============================================================================
// BACK TO PLAIN
// =============================================================================

impl Value {
    /// Recursively convert back to plain data.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_plain(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number(Number::from(*n)),
            Value::UInt(n) => serde_json::Value::Number(Number::from(*n)),
            Value::Float(n) => Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Map(m) => m.to_plain(),
            Value::Seq(s) => s.to_plain(),
        }
    }
}

impl ImmutableMap {
    /// Recursively convert to a plain JSON object.
    pub fn to_plain(&self) -> serde_json::Value {
        let object: JsonMap<String, serde_json::Value> = self
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_plain()))
            .collect();
        serde_json::Value::Object(object)
    }
}

impl ImmutableSequence {
    /// Recursively convert to a plain JSON array.
    pub fn to_plain(&self) -> serde_json::Value {
        serde_json::Value::Array(self.iter().map(Value::to_plain).collect())
    }
}

// =============================================================================
// INTO VALUE
// =============================================================================

impl From<serde_json::Value> for Value {
    fn from(plain: serde_json::Value) -> Self {
        match plain {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(Rc::from(s)),
            serde_json::Value::Array(items) => {
                Value::Seq(ImmutableSequence::from_items(
                    items.into_iter().map(Value::from).collect(),
                ))
            }
            serde_json::Value::Object(object) => Value::Map(ImmutableMap::from_entries(
                object.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl From<ImmutableMap> for Value {
    fn from(map: ImmutableMap) -> Self {
        Value::Map(map)
    }
}

impl From<ImmutableSequence> for Value {
    fn from(seq: ImmutableSequence) -> Self {
        Value::Seq(seq)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    /// Values above `i64::MAX` are stored as `UInt`.
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::UInt(n),
        }
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::from(n as u64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(entries: BTreeMap<K, V>) -> Self {
        Value::Map(entries.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(entries: HashMap<K, V>) -> Self {
        Value::Map(entries.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<IndexMap<K, V>> for Value {
    fn from(entries: IndexMap<K, V>) -> Self {
        Value::Map(entries.into_iter().collect())
    }
}

// =============================================================================
// OUT OF VALUE
// =============================================================================

fn mismatch(expected: &'static str, actual: &Value) -> Error {
    Error::TypeMismatch {
        expected,
        actual: actual.type_name(),
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_int().ok_or_else(|| mismatch("int", &value))
    }
}

impl TryFrom<Value> for u64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_uint().ok_or_else(|| mismatch("uint", &value))
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value.as_float().ok_or_else(|| mismatch("float", &value))
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", &value))
    }
}

impl TryFrom<Value> for ImmutableMap {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(mismatch("map", &other)),
        }
    }
}

impl TryFrom<Value> for ImmutableSequence {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Seq(seq) => Ok(seq),
            other => Err(mismatch("sequence", &other)),
        }
    }
}

// =============================================================================
// SERDE
// =============================================================================

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Map(m) => m.serialize(serializer),
            Value::Seq(s) => s.serialize(serializer),
        }
    }
}

impl Serialize for ImmutableMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for ImmutableSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.iter() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl<'de> Deserialize<'de> for ImmutableMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ImmutableMap::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ImmutableSequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ImmutableSequence::try_from(value).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================
