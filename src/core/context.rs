// ============================================================================
// spark-state - Reactive Context
// Thread-local state for tracking the currently active reader
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Weak;

use super::types::AnyReaction;

// =============================================================================
// REACTIVE CONTEXT
// =============================================================================

/// Thread-local reactive context holding the dependency-tracking state.
///
/// The active reaction slot is only ever changed through
/// [`ActiveReactionGuard`], which restores the previous reader when dropped.
pub struct ReactiveContext {
    /// Derivation currently running its computation (the "active reader")
    active_reaction: RefCell<Option<Weak<dyn AnyReaction>>>,

    /// Whether reads should skip dependency registration
    untracking: Cell<bool>,
}

impl ReactiveContext {
    /// Create a new reactive context with default values
    pub fn new() -> Self {
        Self {
            active_reaction: RefCell::new(None),
            untracking: Cell::new(false),
        }
    }

    // =========================================================================
    // REACTION TRACKING
    // =========================================================================

    /// Set the active reaction, returning the previous one
    pub fn set_active_reaction(
        &self,
        reaction: Option<Weak<dyn AnyReaction>>,
    ) -> Option<Weak<dyn AnyReaction>> {
        self.active_reaction.replace(reaction)
    }

    /// Get the active reaction
    pub fn get_active_reaction(&self) -> Option<Weak<dyn AnyReaction>> {
        self.active_reaction.borrow().clone()
    }

    /// Check if there's an active reaction
    pub fn has_active_reaction(&self) -> bool {
        self.active_reaction.borrow().is_some()
    }

    /// Set untracking mode, returning previous value
    pub fn set_untracking(&self, value: bool) -> bool {
        self.untracking.replace(value)
    }

    /// Check if currently untracking
    pub fn is_untracking(&self) -> bool {
        self.untracking.get()
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    /// The thread-local reactive context
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

/// Access the thread-local reactive context.
///
/// # Example
///
/// ```
/// use spark_state::with_context;
///
/// assert!(!with_context(|ctx| ctx.has_active_reaction()));
///
/// let was = with_context(|ctx| ctx.set_untracking(true));
/// assert!(with_context(|ctx| ctx.is_untracking()));
/// with_context(|ctx| ctx.set_untracking(was));
/// ```
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

// =============================================================================
// SCOPE GUARD
// =============================================================================

/// Installs a reaction as the active reader for the lifetime of the guard.
///
/// Tracking is switched back on for the guarded run even inside `untrack`,
/// so a derivation created there still discovers its own dependencies. Both
/// the previous reader and the untracking flag are restored on drop, so
/// nested tracked runs compose and a panicking computation cannot leave a
/// stale reader behind.
pub struct ActiveReactionGuard {
    prev: Option<(Option<Weak<dyn AnyReaction>>, bool)>,
}

impl ActiveReactionGuard {
    /// Make `reaction` the active reader until the guard is dropped.
    pub fn enter(reaction: Option<Weak<dyn AnyReaction>>) -> Self {
        let prev = with_context(|ctx| {
            let reader = ctx.set_active_reaction(reaction);
            let untracking = ctx.set_untracking(false);
            (reader, untracking)
        });
        Self { prev: Some(prev) }
    }
}

impl Drop for ActiveReactionGuard {
    fn drop(&mut self) {
        if let Some((reader, untracking)) = self.prev.take() {
            with_context(|ctx| {
                ctx.set_active_reaction(reader);
                ctx.set_untracking(untracking);
            });
        }
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Check if currently tracking dependencies (inside a derivation, not untracking)
pub fn is_tracking() -> bool {
    with_context(|ctx| ctx.has_active_reaction() && !ctx.is_untracking())
}

/// Check if currently untracking
pub fn is_untracking() -> bool {
    with_context(|ctx| ctx.is_untracking())
}

// =============================================================================
// TESTS
// =============================================================================
