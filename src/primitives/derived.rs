// ============================================================================
// spark-state - Derivations
// Read-only cells computed from other cells, recomputed eagerly on change
// ============================================================================
//
// A Derived is BOTH a Source (can be read, has dependents) AND a Reaction
// (has deps, is re-run when one of them changes). The reaction side is what
// sources hold (weakly); the source side is what downstream derivations read.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::types::{source_ptr, AnyReaction, AnySource, EqualsFn, ReactionList};
use crate::reactivity::equality::default_equals;
use crate::reactivity::tracking::{disconnect_reaction, notify_write, run_tracked, track_read};

type ComputeFn<T> = Rc<dyn Fn() -> T>;

// =============================================================================
// DERIVED INNER
// =============================================================================

/// The internal data for a derivation.
///
/// Implements BOTH AnySource (can be read, has dependents) AND AnyReaction
/// (has deps, executes computation).
pub struct DerivedInner<T> {
    /// Flags bitmask (DERIVED | SOURCE | state)
    flags: Cell<u32>,

    /// The computation function (None once disposed)
    fn_: RefCell<Option<ComputeFn<T>>>,

    /// Cached value (None only before the first computation finishes)
    value: RefCell<Option<Rc<T>>>,

    /// Equality function for comparing results
    equals: EqualsFn<T>,

    /// Dependents of this derivation (Source side)
    reactions: ReactionList,

    /// Sources read during the last run (Reaction side)
    deps: RefCell<Vec<Rc<dyn AnySource>>>,

    /// Self-reference for handing ourselves to the tracking layer
    self_ref: Weak<DerivedInner<T>>,
}

impl<T: 'static + Clone> DerivedInner<T> {
    /// Create a derivation and run its first computation.
    pub fn new<F>(fn_: F) -> Rc<Self>
    where
        F: Fn() -> T + 'static,
        T: PartialEq + 'static,
    {
        Self::new_with_equals(fn_, default_equals)
    }

    /// Create a derivation with a custom equality function and run its first computation.
    ///
    /// Every cell read during that first run subscribes the new derivation.
    /// A panic inside `fn_` propagates to the caller.
    pub fn new_with_equals<F>(fn_: F, equals: EqualsFn<T>) -> Rc<Self>
    where
        F: Fn() -> T + 'static,
    {
        let inner = Rc::new_cyclic(|self_ref| Self {
            flags: Cell::new(DERIVED | SOURCE),
            fn_: RefCell::new(Some(Rc::new(fn_))),
            value: RefCell::new(None),
            equals,
            reactions: ReactionList::default(),
            deps: RefCell::new(Vec::new()),
            self_ref: self_ref.clone(),
        });

        inner.compute();
        inner
    }

    fn current(&self) -> Rc<T> {
        self.value
            .borrow()
            .clone()
            .expect("derived read before its first computation")
    }

    /// Get the cached value
    pub fn get_value(&self) -> T {
        T::clone(&self.current())
    }

    /// Access the cached value without cloning.
    ///
    /// `f` sees a snapshot, so it may write cells this derivation reads.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.current())
    }

    /// Execute the computation under tracking and store the result if it differs.
    /// Returns true if the cached value changed.
    pub fn compute(&self) -> bool {
        let Some(this) = self.self_ref.upgrade() else {
            return false;
        };
        // Clone the function out so no borrow is held while user code runs
        let Some(fn_) = self.fn_.borrow().clone() else {
            return false;
        };

        let reaction: Rc<dyn AnyReaction> = this;
        let new_value = run_tracked(&reaction, || fn_());

        let current = self.value.borrow().clone();
        let changed = match current {
            Some(v) => !(self.equals)(&v, &new_value),
            None => true,
        };

        if changed {
            *self.value.borrow_mut() = Some(Rc::new(new_value));
        }

        changed
    }

    /// Tear down: unsubscribe from every source, forget every dependent and
    /// drop the computation. The last cached value stays readable.
    pub fn dispose(&self) {
        if AnyReaction::is_disposed(self) {
            return;
        }
        AnyReaction::mark_disposed(self);

        if let Some(this) = self.self_ref.upgrade() {
            disconnect_reaction(&(this as Rc<dyn AnyReaction>));
        }
        self.reactions.clear();
        self.fn_.borrow_mut().take();
    }

    /// Get the equality function
    pub fn equals_fn(&self) -> EqualsFn<T> {
        self.equals
    }
}

// =============================================================================
// AnySource implementation for DerivedInner
// =============================================================================

impl<T: 'static + Clone> AnySource for DerivedInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    fn add_reaction(&self, reaction: Weak<dyn AnyReaction>) {
        if AnyReaction::is_disposed(self) {
            return;
        }
        self.reactions.add(reaction);
    }

    fn cleanup_dead_reactions(&self) {
        self.reactions.cleanup_dead();
    }

    fn for_each_reaction(&self, f: &mut dyn FnMut(Rc<dyn AnyReaction>) -> bool) {
        self.reactions.for_each(f);
    }

    fn remove_reaction(&self, reaction: &Rc<dyn AnyReaction>) {
        self.reactions.remove(reaction);
    }

    fn clear_reactions(&self) {
        self.reactions.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_derived_reaction(&self) -> Option<Rc<dyn AnyReaction>> {
        self.self_ref.upgrade().map(|rc| rc as Rc<dyn AnyReaction>)
    }
}

// =============================================================================
// AnyReaction implementation for DerivedInner
// =============================================================================

impl<T: 'static + Clone> AnyReaction for DerivedInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    fn add_dep(&self, source: Rc<dyn AnySource>) {
        let ptr = source_ptr(&source);
        let mut deps = self.deps.borrow_mut();
        if !deps.iter().any(|dep| source_ptr(dep) == ptr) {
            deps.push(source);
        }
    }

    fn take_deps(&self) -> Vec<Rc<dyn AnySource>> {
        self.deps.take()
    }

    fn for_each_dep(&self, f: &mut dyn FnMut(&Rc<dyn AnySource>) -> bool) {
        for dep in self.deps.borrow().iter() {
            if !f(dep) {
                break;
            }
        }
    }

    fn update(&self) -> bool {
        if AnyReaction::is_disposed(self) {
            return false;
        }

        let changed = self.compute();
        tracing::trace!(changed, "derivation recomputed");

        if changed {
            if let Some(this) = self.self_ref.upgrade() {
                notify_write(this as Rc<dyn AnySource>);
            }
        }
        changed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_derived_source(&self) -> Option<Rc<dyn AnySource>> {
        self.self_ref.upgrade().map(|rc| rc as Rc<dyn AnySource>)
    }
}

// =============================================================================
// DERIVED<T> WRAPPER
// =============================================================================

/// A read-only reactive cell whose value is computed from other cells.
///
/// The computation runs once at construction and again, synchronously,
/// whenever a cell it read during its previous run changes. Its dependency
/// set is whatever that previous run touched.
///
/// Sources only hold a derivation weakly: dropping every `Derived` handle
/// (and every downstream derivation reading it) stops it from running.
///
/// # Example
/// ```
/// use spark_state::{derived, signal};
///
/// let count = signal(1);
/// let doubled = derived({
///     let count = count.clone();
///     move || count.get() * 2
/// });
/// assert_eq!(doubled.get(), 2);
///
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
#[derive(Clone)]
pub struct Derived<T> {
    inner: Rc<DerivedInner<T>>,
}

impl<T: 'static + Clone> Derived<T> {
    /// Create a new derived handle from an inner
    pub(crate) fn from_inner(inner: Rc<DerivedInner<T>>) -> Self {
        Self { inner }
    }

    /// Get the derivation's cached value.
    ///
    /// Inside another derivation's computation, this registers that
    /// derivation as a dependent (derivations compose).
    pub fn get(&self) -> T {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.get_value()
    }

    /// Access the cached value with a closure (avoids cloning).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.with_value(f)
    }

    /// Detach from the graph. The last value stays readable but will no
    /// longer change.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Whether `dispose` has been called
    pub fn is_disposed(&self) -> bool {
        AnyReaction::is_disposed(&*self.inner)
    }

    /// Get access to the inner for graph operations
    pub fn inner(&self) -> &Rc<DerivedInner<T>> {
        &self.inner
    }

    /// Convert to type-erased AnySource
    pub fn as_any_source(&self) -> Rc<dyn AnySource> {
        self.inner.clone() as Rc<dyn AnySource>
    }

    /// Convert to type-erased AnyReaction
    pub fn as_any_reaction(&self) -> Rc<dyn AnyReaction> {
        self.inner.clone() as Rc<dyn AnyReaction>
    }
}

impl<T> std::fmt::Debug for Derived<T>
where
    T: std::fmt::Debug + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner
            .with_value(|value| f.debug_struct("Derived").field("value", value).finish())
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Create a derivation.
///
/// The computation runs immediately; every cell it reads becomes a
/// dependency.
pub fn derived<T, F>(fn_: F) -> Derived<T>
where
    T: 'static + Clone + PartialEq,
    F: Fn() -> T + 'static,
{
    Derived::from_inner(DerivedInner::new(fn_))
}

/// Alias for [`derived`].
pub fn create_derivation<T, F>(fn_: F) -> Derived<T>
where
    T: 'static + Clone + PartialEq,
    F: Fn() -> T + 'static,
{
    derived(fn_)
}

/// Create a derivation with a custom equality function.
pub fn derived_with_equals<T, F>(fn_: F, equals: EqualsFn<T>) -> Derived<T>
where
    T: 'static + Clone,
    F: Fn() -> T + 'static,
{
    Derived::from_inner(DerivedInner::new_with_equals(fn_, equals))
}

// =============================================================================
// TESTS
// =============================================================================
