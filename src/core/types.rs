// ============================================================================
// spark-state - Type Definitions
// Type-erased traits and base types for the reactive graph
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::constants::*;
use crate::reactivity::equality::default_equals;

// =============================================================================
// TYPE-ERASED TRAITS
// =============================================================================
//
// Graph operations (register a reader, notify dependents, drop stale deps)
// don't need to know the value type T. Only reading/writing values needs T.
//
// - Vec<Rc<dyn AnySource>> on a derivation: what it read during its last run
// - Vec<Weak<dyn AnyReaction>> on a source: who to notify on change
//
// Sources hold their dependents weakly. A derivation keeps its sources alive,
// never the other way around.
// =============================================================================

/// Type-erased source interface for reactive graph operations.
///
/// Implemented by both `SourceInner<T>` (signals) and `DerivedInner<T>` (derivations).
pub trait AnySource: Any {
    /// Get the flags bitmask
    fn flags(&self) -> u32;

    /// Set the flags bitmask
    fn set_flags(&self, flags: u32);

    /// Get the number of registered dependents (live or not yet pruned)
    fn reaction_count(&self) -> usize;

    /// Register a dependent. Registering an existing dependent is a no-op.
    fn add_reaction(&self, reaction: Weak<dyn AnyReaction>);

    /// Remove dead (dropped) dependents from the list
    fn cleanup_dead_reactions(&self);

    /// Iterate over live dependents in registration order.
    /// The callback can return false to stop iteration.
    fn for_each_reaction(&self, f: &mut dyn FnMut(Rc<dyn AnyReaction>) -> bool);

    /// Remove a specific dependent from this source.
    fn remove_reaction(&self, reaction: &Rc<dyn AnyReaction>);

    /// Clear all dependents from this source.
    fn clear_reactions(&self);

    /// Check if this is a derivation (has DERIVED flag)
    fn is_derived(&self) -> bool {
        self.flags() & DERIVED != 0
    }

    /// Upcast to Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// If this source is also a reaction (i.e., a Derived), return it as an AnyReaction.
    fn as_derived_reaction(&self) -> Option<Rc<dyn AnyReaction>> {
        None
    }
}

/// Type-erased reaction interface: something notified when its sources change.
///
/// Implemented by `DerivedInner<T>`.
pub trait AnyReaction: Any {
    /// Get the flags bitmask
    fn flags(&self) -> u32;

    /// Set the flags bitmask
    fn set_flags(&self, flags: u32);

    /// Get the number of dependencies
    fn dep_count(&self) -> usize;

    /// Record a source read during the current run. Duplicates are ignored.
    fn add_dep(&self, source: Rc<dyn AnySource>);

    /// Take the dependency list, leaving it empty (start of a tracked run)
    fn take_deps(&self) -> Vec<Rc<dyn AnySource>>;

    /// Iterate over dependencies
    fn for_each_dep(&self, f: &mut dyn FnMut(&Rc<dyn AnySource>) -> bool);

    /// Re-run the reaction. Returns true if its value changed.
    fn update(&self) -> bool;

    /// Check if this is a derivation
    fn is_derived(&self) -> bool {
        self.flags() & DERIVED != 0
    }

    /// Check if this reaction has been torn down
    fn is_disposed(&self) -> bool {
        self.flags() & DISPOSED != 0
    }

    /// Mark as disposed
    fn mark_disposed(&self) {
        self.set_flags(self.flags() | DISPOSED);
    }

    /// Upcast to Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// If this reaction is also a source (i.e., a Derived), return it as an AnySource.
    fn as_derived_source(&self) -> Option<Rc<dyn AnySource>>;
}

// =============================================================================
// POINTER IDENTITY
// =============================================================================

/// Address of a source allocation, for identity comparison across trait objects.
pub(crate) fn source_ptr(source: &Rc<dyn AnySource>) -> *const () {
    Rc::as_ptr(source) as *const ()
}

/// Address of a reaction allocation, for identity comparison across trait objects.
pub(crate) fn reaction_ptr(reaction: &Rc<dyn AnyReaction>) -> *const () {
    Rc::as_ptr(reaction) as *const ()
}

/// Shared dependent-list behaviour for every source kind.
#[derive(Default)]
pub(crate) struct ReactionList {
    reactions: RefCell<Vec<Weak<dyn AnyReaction>>>,
}

impl ReactionList {
    pub(crate) fn len(&self) -> usize {
        self.reactions.borrow().len()
    }

    pub(crate) fn add(&self, reaction: Weak<dyn AnyReaction>) {
        let ptr = Weak::as_ptr(&reaction) as *const ();
        let mut reactions = self.reactions.borrow_mut();
        if !reactions.iter().any(|w| Weak::as_ptr(w) as *const () == ptr) {
            reactions.push(reaction);
        }
    }

    pub(crate) fn cleanup_dead(&self) {
        self.reactions.borrow_mut().retain(|w| w.strong_count() > 0);
    }

    pub(crate) fn for_each(&self, f: &mut dyn FnMut(Rc<dyn AnyReaction>) -> bool) {
        // Upgrade first so the borrow is released before `f` runs
        let live: Vec<Rc<dyn AnyReaction>> = self
            .reactions
            .borrow()
            .iter()
            .filter_map(|w| w.upgrade())
            .collect();
        for rc in live {
            if !f(rc) {
                break;
            }
        }
    }

    pub(crate) fn remove(&self, reaction: &Rc<dyn AnyReaction>) {
        let target = reaction_ptr(reaction);
        self.reactions
            .borrow_mut()
            .retain(|weak| weak.strong_count() > 0 && Weak::as_ptr(weak) as *const () != target);
    }

    pub(crate) fn clear(&self) {
        self.reactions.borrow_mut().clear();
    }
}

// =============================================================================
// SOURCE INNER (the data behind Signal<T>)
// =============================================================================

/// Equality function type for comparing cell values
pub type EqualsFn<T> = fn(&T, &T) -> bool;

/// The internal data for a signal source.
///
/// This is separate from Signal<T> so we can implement AnySource on it
/// and store Rc<SourceInner<T>> as Rc<dyn AnySource>.
pub struct SourceInner<T> {
    /// Flags bitmask
    flags: Cell<u32>,

    /// The current value. Readers take a clone of the `Rc` so no borrow
    /// is held while their code runs.
    value: RefCell<Rc<T>>,

    /// Dependents, in registration order
    reactions: ReactionList,

    /// Equality function for comparing values
    equals: EqualsFn<T>,
}

impl<T> SourceInner<T> {
    /// Create a new source with the given value
    pub fn new(value: T) -> Self
    where
        T: PartialEq + 'static,
    {
        Self::new_with_equals(value, default_equals)
    }

    /// Create a new source with a custom equality function
    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self {
        Self {
            flags: Cell::new(SOURCE),
            value: RefCell::new(Rc::new(value)),
            reactions: ReactionList::default(),
            equals,
        }
    }

    /// Get the current value (cloning)
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        T::clone(&self.current())
    }

    /// Get the current value with a closure (avoids clone).
    ///
    /// `f` sees a snapshot; it may write this source without conflict.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.current())
    }

    fn current(&self) -> Rc<T> {
        Rc::clone(&self.value.borrow())
    }

    /// Store the value if it differs from the current one.
    /// Returns true if it changed. Does not notify.
    pub fn set(&self, value: T) -> bool {
        if (self.equals)(&self.current(), &value) {
            return false;
        }

        *self.value.borrow_mut() = Rc::new(value);
        true
    }

    /// Get the equality function
    pub fn equals_fn(&self) -> EqualsFn<T> {
        self.equals
    }
}

impl<T: 'static> AnySource for SourceInner<T> {
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
}

// =============================================================================
// TESTS
// =============================================================================
