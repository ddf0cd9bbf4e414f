// ============================================================================
// spark-state - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// This reduces the boilerplate of manually cloning `Signal` or `Derived`
/// handles before moving them into a closure.
///
/// # Usage
///
/// ```rust
/// use spark_state::{cloned, derived, signal};
///
/// let a = signal(1);
/// let b = signal(2);
///
/// let sum = derived(cloned!(a, b => move || a.get() + b.get()));
/// assert_eq!(sum.get(), 3);
/// a.set(10);
/// assert_eq!(sum.get(), 12);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Create a derivation with automatic variable capturing.
///
/// Wraps `derived(cloned!(... => move || ...))`.
///
/// # Usage
///
/// ```rust
/// use spark_state::{derived, signal};
/// let a = signal(1);
/// let b = signal(2);
///
/// // list deps => expression
/// let sum = derived!(a, b => a.get() + b.get());
/// assert_eq!(sum.get(), 3);
/// ```
#[macro_export]
macro_rules! derived {
    // With dependencies
    ($($deps:ident),+ => $body:expr) => {
        $crate::derived($crate::cloned!($($deps),+ => move || $body))
    };
    // No dependencies
    ($body:expr) => {
        $crate::derived(move || $body)
    };
}

/// Build a [`Path`](crate::Path) from keys and indices.
///
/// Integer literals become index segments, strings become key segments.
///
/// ```rust
/// use spark_state::{path, PathSegment};
///
/// let p = path!["users", 0, "name"];
/// assert_eq!(p[1], PathSegment::Index(0));
/// assert!(path![].is_empty());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::default()
    };
    ($($seg:expr),+ $(,)?) => {
        $crate::Path::new(vec![$($crate::PathSegment::from($seg)),+])
    };
}
