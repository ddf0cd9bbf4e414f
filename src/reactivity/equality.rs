// ============================================================================
// spark-state - Equality Functions
// Change-detection policies usable as EqualsFn<T>
// ============================================================================

use std::any::Any;

use crate::collections::{ImmutableMap, ImmutableSequence, Value};

// =============================================================================
// DEFAULT EQUALITY
// =============================================================================

/// The equality used by `signal()` and `derived()` when none is given.
///
/// Persistent containers ([`Value`], [`ImmutableMap`], [`ImmutableSequence`])
/// compare by identity: a freshly built tree is a change even when its
/// contents equal the old one. Every other type uses `PartialEq`.
///
/// # Example
/// ```
/// use spark_state::{default_equals, ImmutableMap};
///
/// let a = ImmutableMap::new().set("x", 1);
/// let b = ImmutableMap::new().set("x", 1);
///
/// assert!(default_equals(&a, &a.clone()));
/// assert!(!default_equals(&a, &b));
/// assert!(default_equals(&42, &42));
/// ```
pub fn default_equals<T: PartialEq + 'static>(a: &T, b: &T) -> bool {
    let (any_a, any_b) = (a as &dyn Any, b as &dyn Any);

    if let (Some(a), Some(b)) = (any_a.downcast_ref::<Value>(), any_b.downcast_ref::<Value>()) {
        return a.identical(b);
    }
    if let (Some(a), Some(b)) = (
        any_a.downcast_ref::<ImmutableMap>(),
        any_b.downcast_ref::<ImmutableMap>(),
    ) {
        return a.ptr_eq(b);
    }
    if let (Some(a), Some(b)) = (
        any_a.downcast_ref::<ImmutableSequence>(),
        any_b.downcast_ref::<ImmutableSequence>(),
    ) {
        return a.ptr_eq(b);
    }

    a == b
}

// =============================================================================
// STRUCTURAL EQUALITY
// =============================================================================

/// Plain `PartialEq` equality.
///
/// For [`Value`] this is structural: two distinct containers holding equal
/// entries compare equal. Pass it to `signal_with_equals` to skip
/// notifications when an equal state tree is rebuilt.
///
/// # Example
/// ```
/// use spark_state::reactivity::equality::equals;
///
/// assert!(equals(&42, &42));
/// assert!(!equals(&42, &43));
/// ```
pub fn equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

// =============================================================================
// IDENTITY EQUALITY
// =============================================================================

/// Identity equality for [`Value`]: scalars by value, containers by allocation.
///
/// Same policy `default_equals` applies to `Value`.
///
/// # Example
/// ```
/// use spark_state::{identical, ImmutableMap, Value};
///
/// let a = Value::from(ImmutableMap::new().set("x", 1));
/// let b = Value::from(ImmutableMap::new().set("x", 1));
///
/// assert!(identical(&a, &a.clone()));
/// assert!(!identical(&a, &b));
/// assert!(identical(&Value::from(3), &Value::from(3)));
/// ```
pub fn identical(a: &Value, b: &Value) -> bool {
    a.identical(b)
}

// =============================================================================
// SAFE EQUALITY (NaN-aware)
// =============================================================================

/// Safe equality for f64 values. NaN == NaN returns true.
///
/// # Example
/// ```
/// use spark_state::reactivity::equality::safe_equals_f64;
///
/// assert!(safe_equals_f64(&1.0, &1.0));
/// assert!(!safe_equals_f64(&1.0, &2.0));
/// assert!(safe_equals_f64(&f64::NAN, &f64::NAN));
/// ```
pub fn safe_equals_f64(a: &f64, b: &f64) -> bool {
    if a.is_nan() {
        return b.is_nan();
    }
    a == b
}

/// Safe equality for f32 values. NaN == NaN returns true.
pub fn safe_equals_f32(a: &f32, b: &f32) -> bool {
    if a.is_nan() {
        return b.is_nan();
    }
    a == b
}

// =============================================================================
// ALWAYS / NEVER
// =============================================================================

/// Never equal - every write counts as a change.
pub fn never_equals<T>(_a: &T, _b: &T) -> bool {
    false
}

/// Always equal - writes never count as a change.
pub fn always_equals<T>(_a: &T, _b: &T) -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{ImmutableMap, ImmutableSequence};

    #[test]
    fn equals_basic() {
        assert!(equals(&"a", &"a"));
        assert!(!equals(&Some(1), &None));
    }

    #[test]
    fn structural_vs_identity_on_values() {
        let a = Value::from(ImmutableSequence::from_iter([1, 2]));
        let b = Value::from(ImmutableSequence::from_iter([1, 2]));

        assert!(equals(&a, &b));
        assert!(!identical(&a, &b));
        assert!(identical(&a, &a.clone()));
    }

    #[test]
    fn identity_on_scalars_is_value_equality() {
        assert!(identical(&Value::from("x"), &Value::from("x")));
        assert!(!identical(&Value::from(1), &Value::from(2)));
        assert!(identical(&Value::Null, &Value::Null));
        assert!(!identical(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(!identical(
            &Value::from(ImmutableMap::new()),
            &Value::from(ImmutableSequence::new())
        ));
    }

    #[test]
    fn default_compares_containers_by_identity() {
        let a = Value::from(ImmutableSequence::from_iter([1, 2]));
        let b = Value::from(ImmutableSequence::from_iter([1, 2]));
        assert!(!default_equals(&a, &b));
        assert!(default_equals(&a, &a.clone()));

        let m = ImmutableMap::new().set("k", 1);
        assert!(default_equals(&m, &m.clone()));
        assert!(!default_equals(&m, &ImmutableMap::new().set("k", 1)));

        let s = ImmutableSequence::from_iter(["x"]);
        assert!(!default_equals(&s, &ImmutableSequence::from_iter(["x"])));
    }

    #[test]
    fn default_is_value_equality_elsewhere() {
        assert!(default_equals(&String::from("a"), &String::from("a")));
        assert!(default_equals(&vec![1, 2], &vec![1, 2]));
        assert!(!default_equals(&1.5, &2.5));
        assert!(default_equals(&Value::from(3), &Value::from(3)));
    }

    #[test]
    fn nan_handling() {
        assert!(safe_equals_f64(&f64::NAN, &f64::NAN));
        assert!(!safe_equals_f64(&f64::NAN, &1.0));
        assert!(safe_equals_f32(&f32::NAN, &f32::NAN));
        assert!(!safe_equals_f32(&1.0, &f32::NAN));
    }

    #[test]
    fn always_and_never() {
        assert!(always_equals(&1, &2));
        assert!(!never_equals(&1, &1));
    }
}
