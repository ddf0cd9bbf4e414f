// ============================================================================
// spark-state - Untracked Reads
// Reading reactive cells without registering the active reader
// ============================================================================

use crate::core::context::with_context;

/// Run `f` without dependency tracking.
///
/// Reads inside `f` return current values but do not subscribe the active
/// derivation, so it will not recompute when those cells change.
///
/// # Example
///
/// ```
/// use spark_state::{derived, signal, untrack};
///
/// let tracked = signal(1);
/// let hidden = signal(10);
///
/// let sum = derived({
///     let tracked = tracked.clone();
///     let hidden = hidden.clone();
///     move || tracked.get() + untrack(|| hidden.get())
/// });
/// assert_eq!(sum.get(), 11);
///
/// hidden.set(20);
/// assert_eq!(sum.get(), 11); // not a dependency
///
/// tracked.set(2);
/// assert_eq!(sum.get(), 22);
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let prev = with_context(|ctx| ctx.set_untracking(true));

    // Restore even on panic
    struct UntrackGuard {
        prev: bool,
    }

    impl Drop for UntrackGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_untracking(self.prev));
        }
    }

    let _guard = UntrackGuard { prev };
    f()
}

/// Alias for [`untrack`].
pub fn peek<T>(f: impl FnOnce() -> T) -> T {
    untrack(f)
}
