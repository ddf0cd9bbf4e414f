// ============================================================================
// spark-state - Signal Primitive
// The writable reactive cell
// ============================================================================

use std::rc::Rc;

use crate::core::types::{AnySource, EqualsFn, SourceInner};
use crate::reactivity::equality::never_equals;
use crate::reactivity::tracking::{notify_write, track_read};

// =============================================================================
// SIGNAL<T> - The public signal handle
// =============================================================================

/// A reactive cell that holds a value of type T.
///
/// Reading a signal inside a derivation's computation subscribes that
/// derivation. Writing a different value synchronously re-runs every
/// subscriber, in the order they subscribed, before `set` returns.
///
/// # Example
///
/// ```
/// use spark_state::signal;
///
/// let count = signal(0);
/// assert_eq!(count.get(), 0);
///
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
#[derive(Clone)]
pub struct Signal<T> {
    inner: Rc<SourceInner<T>>,
}

impl<T> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self
    where
        T: PartialEq + 'static,
    {
        Self {
            inner: Rc::new(SourceInner::new(value)),
        }
    }

    /// Create a new signal with a custom equality function.
    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self
    where
        T: 'static,
    {
        Self {
            inner: Rc::new(SourceInner::new_with_equals(value, equals)),
        }
    }

    /// Get the current value (cloning).
    ///
    /// Inside a derivation's computation this registers the derivation as a
    /// dependent of this signal.
    pub fn get(&self) -> T
    where
        T: Clone + 'static,
    {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.get()
    }

    /// Access the current value with a closure (avoids cloning).
    ///
    /// # Example
    ///
    /// ```
    /// use spark_state::signal;
    ///
    /// let items = signal(vec![1, 2, 3]);
    /// let sum = items.with(|v| v.iter().sum::<i32>());
    /// assert_eq!(sum, 6);
    /// ```
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R
    where
        T: 'static,
    {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.with(f)
    }

    /// Set the signal's value.
    ///
    /// Returns true if the value changed (based on the equality function).
    /// An unchanged value stores nothing and notifies no one.
    pub fn set(&self, value: T) -> bool
    where
        T: 'static,
    {
        let changed = self.inner.set(value);
        if changed {
            notify_write(self.inner.clone() as Rc<dyn AnySource>);
        }
        changed
    }

    /// Compute a new value from a copy of the current one and `set` it.
    ///
    /// The usual equality check applies, so an update that leaves the value
    /// equal notifies no one.
    ///
    /// # Example
    ///
    /// ```
    /// use spark_state::signal;
    ///
    /// let count = signal(0);
    /// count.update(|n| *n += 1);
    /// assert_eq!(count.get(), 1);
    /// ```
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool
    where
        T: Clone + 'static,
    {
        let mut next = self.inner.get();
        f(&mut next);
        self.set(next)
    }

    /// Get a reference to the inner source (for advanced use).
    pub fn inner(&self) -> &Rc<SourceInner<T>> {
        &self.inner
    }

    /// Get the inner source as a type-erased AnySource.
    pub fn as_any_source(&self) -> Rc<dyn AnySource>
    where
        T: 'static,
    {
        self.inner.clone()
    }
}

impl<T> std::fmt::Debug for Signal<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Reads through the inner cell so formatting never subscribes
        self.inner
            .with(|value| f.debug_struct("Signal").field("value", value).finish())
    }
}

// =============================================================================
// SIGNAL CREATION FUNCTIONS
// =============================================================================

/// Create a new reactive signal.
///
/// Writes are compared with [`default_equals`](crate::default_equals):
/// state trees by identity, everything else by `PartialEq`.
///
/// # Example
///
/// ```
/// use spark_state::signal;
///
/// let count = signal(0);
/// let name = signal(String::from("hello"));
///
/// count.set(42);
/// assert_eq!(count.get(), 42);
/// assert_eq!(name.get(), "hello");
/// ```
pub fn signal<T>(value: T) -> Signal<T>
where
    T: PartialEq + 'static,
{
    Signal::new(value)
}

/// Alias for [`signal`].
pub fn create_signal<T>(value: T) -> Signal<T>
where
    T: PartialEq + 'static,
{
    Signal::new(value)
}

/// Create a signal with a custom equality function.
///
/// # Example
///
/// ```
/// use spark_state::signal_with_equals;
///
/// // Signal that always considers values different (always notifies)
/// let always_notify = signal_with_equals(0, |_, _| false);
/// assert!(always_notify.set(0));
/// ```
pub fn signal_with_equals<T>(value: T, equals: EqualsFn<T>) -> Signal<T>
where
    T: 'static,
{
    Signal::new_with_equals(value, equals)
}

/// Create a signal that treats every write as a change.
///
/// Useful for types without a meaningful `PartialEq`.
pub fn mutable_signal<T>(value: T) -> Signal<T>
where
    T: 'static,
{
    Signal::new_with_equals(value, never_equals)
}

// =============================================================================
// TESTS
// =============================================================================
