// ============================================================================
// spark-state - Dependency Tracking
// Registering readers on read, pushing notifications on write
// ============================================================================
//
// Propagation is eager and synchronous: a write calls `update()` on every
// dependent before returning, and a dependent that changes notifies its own
// dependents the same way. There is no queue and no batching, so a node can
// be recomputed more than once per outer write (e.g. in a diamond).
//
// Borrow scoping: reaction lists are collected into a Vec before any
// callback runs ("collect-then-mutate"), so callbacks may freely register,
// unregister or write.
// ============================================================================

use std::rc::Rc;

use crate::core::context::{with_context, ActiveReactionGuard};
use crate::core::types::{source_ptr, AnyReaction, AnySource};

// =============================================================================
// TRACK READ - Register dependency when reading a cell
// =============================================================================

/// Track a read of a source, registering the active reader as its dependent.
///
/// Called by `Signal::get()` and `Derived::get()`. Outside a tracked run, or
/// inside `untrack`, this does nothing. Registration is idempotent.
pub fn track_read(source: Rc<dyn AnySource>) {
    let reaction = with_context(|ctx| {
        if ctx.is_untracking() {
            return None;
        }
        ctx.get_active_reaction().and_then(|weak| weak.upgrade())
    });

    let Some(reaction) = reaction else {
        return;
    };

    if reaction.is_disposed() {
        return;
    }

    // A derivation reading its own handle must not subscribe to itself
    if let Some(own) = reaction.as_derived_source() {
        if source_ptr(&own) == source_ptr(&source) {
            return;
        }
    }

    reaction.add_dep(source.clone());
    source.add_reaction(Rc::downgrade(&reaction));
}

// =============================================================================
// NOTIFY WRITE - Called when a cell's value changes
// =============================================================================

/// Invoke every live dependent of `source` once, in registration order.
///
/// Returns the number of dependents that were notified.
pub fn notify_write(source: Rc<dyn AnySource>) -> usize {
    // Prune dropped dependents so lists don't grow without bound
    source.cleanup_dead_reactions();

    // BORROW SAFETY: snapshot the list, then release the borrow
    let reactions: Vec<Rc<dyn AnyReaction>> = {
        let mut collected = Vec::new();
        source.for_each_reaction(&mut |reaction| {
            collected.push(reaction);
            true
        });
        collected
    };

    tracing::trace!(
        dependents = reactions.len(),
        derived = source.is_derived(),
        "notifying dependents"
    );

    let mut notified = 0;
    for reaction in reactions {
        if reaction.is_disposed() {
            continue;
        }
        reaction.update();
        notified += 1;
    }
    notified
}

// =============================================================================
// RUN TRACKED - Execute a computation with a reaction as the active reader
// =============================================================================

/// Releases the sources a run stopped reading, on return or unwind.
struct StaleDeps<'a> {
    reaction: &'a Rc<dyn AnyReaction>,
    previous: Vec<Rc<dyn AnySource>>,
}

impl Drop for StaleDeps<'_> {
    fn drop(&mut self) {
        release_stale_deps(self.reaction, std::mem::take(&mut self.previous));
    }
}

/// Run `f` with `reaction` installed as the active reader.
///
/// Dependencies are re-discovered on every run: the reaction's dependency
/// list is emptied first, refilled by the reads `f` performs, and sources it
/// no longer reads are unsubscribed afterwards. Sources read again keep their
/// original registration slot, so notification order is stable.
///
/// If `f` panics the previous reader is still restored, and the reaction
/// stays subscribed only to the sources read before the panic.
pub fn run_tracked<R>(reaction: &Rc<dyn AnyReaction>, f: impl FnOnce() -> R) -> R {
    let _stale = StaleDeps {
        reaction,
        previous: reaction.take_deps(),
    };
    let _guard = ActiveReactionGuard::enter(Some(Rc::downgrade(reaction)));
    f()
}

/// Unsubscribe `reaction` from every source in `previous` it did not read again.
pub fn release_stale_deps(reaction: &Rc<dyn AnyReaction>, previous: Vec<Rc<dyn AnySource>>) {
    if previous.is_empty() {
        return;
    }

    let mut current = Vec::with_capacity(reaction.dep_count());
    reaction.for_each_dep(&mut |dep| {
        current.push(source_ptr(dep));
        true
    });

    let mut released = 0;
    for dep in previous {
        if !current.contains(&source_ptr(&dep)) {
            dep.remove_reaction(reaction);
            released += 1;
        }
    }

    if released > 0 {
        tracing::debug!(released, "released stale dependencies");
    }
}

/// Detach `reaction` from the graph: unsubscribe it from every source it reads.
pub fn disconnect_reaction(reaction: &Rc<dyn AnyReaction>) {
    let deps = reaction.take_deps();
    for dep in &deps {
        dep.remove_reaction(reaction);
    }
    tracing::debug!(dependencies = deps.len(), "disconnected reaction");
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::*;
    use crate::core::context::is_tracking;
    use crate::core::types::SourceInner;
    use std::any::Any;
    use std::cell::{Cell, RefCell};

    /// Mock reaction that counts updates and records deps
    struct CountingReaction {
        flags: Cell<u32>,
        deps: RefCell<Vec<Rc<dyn AnySource>>>,
        runs: Cell<u32>,
    }

    impl CountingReaction {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                flags: Cell::new(DERIVED),
                deps: RefCell::new(Vec::new()),
                runs: Cell::new(0),
            })
        }
    }

    impl AnyReaction for CountingReaction {
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
            if !deps.iter().any(|d| source_ptr(d) == ptr) {
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
            self.runs.set(self.runs.get() + 1);
            true
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_derived_source(&self) -> Option<Rc<dyn AnySource>> {
            None
        }
    }

    fn as_reaction(r: &Rc<CountingReaction>) -> Rc<dyn AnyReaction> {
        r.clone()
    }

    #[test]
    fn read_outside_tracking_registers_nothing() {
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(1));
        track_read(source.clone());
        assert_eq!(source.reaction_count(), 0);
    }

    #[test]
    fn read_inside_tracked_run_registers_both_sides() {
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(1));
        let reaction = CountingReaction::new();
        let erased = as_reaction(&reaction);

        run_tracked(&erased, || {
            assert!(is_tracking());
            track_read(source.clone());
            track_read(source.clone());
        });

        assert!(!is_tracking());
        assert_eq!(reaction.dep_count(), 1);
        assert_eq!(source.reaction_count(), 1);
    }

    #[test]
    fn notify_write_runs_each_dependent_once() {
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(1));
        let a = CountingReaction::new();
        let b = CountingReaction::new();

        source.add_reaction(Rc::downgrade(&as_reaction(&a)));
        source.add_reaction(Rc::downgrade(&as_reaction(&b)));

        assert_eq!(notify_write(source.clone()), 2);
        assert_eq!(a.runs.get(), 1);
        assert_eq!(b.runs.get(), 1);
    }

    #[test]
    fn notify_skips_disposed_and_dropped() {
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(1));
        let disposed = CountingReaction::new();
        disposed.mark_disposed();
        source.add_reaction(Rc::downgrade(&as_reaction(&disposed)));
        {
            let dropped = CountingReaction::new();
            source.add_reaction(Rc::downgrade(&as_reaction(&dropped)));
        }

        assert_eq!(notify_write(source.clone()), 0);
        assert_eq!(disposed.runs.get(), 0);
        assert_eq!(source.reaction_count(), 1);
    }

    #[test]
    fn rerun_releases_sources_no_longer_read() {
        let first: Rc<dyn AnySource> = Rc::new(SourceInner::new(1));
        let second: Rc<dyn AnySource> = Rc::new(SourceInner::new(2));
        let reaction = CountingReaction::new();
        let erased = as_reaction(&reaction);

        run_tracked(&erased, || {
            track_read(first.clone());
            track_read(second.clone());
        });
        assert_eq!(first.reaction_count(), 1);
        assert_eq!(second.reaction_count(), 1);

        run_tracked(&erased, || {
            track_read(second.clone());
        });

        assert_eq!(first.reaction_count(), 0);
        assert_eq!(second.reaction_count(), 1);
        assert_eq!(reaction.dep_count(), 1);
    }

    #[test]
    fn disconnect_removes_every_edge() {
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(1));
        let reaction = CountingReaction::new();
        let erased = as_reaction(&reaction);

        run_tracked(&erased, || track_read(source.clone()));
        disconnect_reaction(&erased);

        assert_eq!(source.reaction_count(), 0);
        assert_eq!(reaction.dep_count(), 0);
    }

    #[test]
    fn panicking_run_restores_context() {
        let reaction = CountingReaction::new();
        let erased = as_reaction(&reaction);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_tracked::<()>(&erased, || panic!("boom"));
        }));

        assert!(result.is_err());
        assert!(!is_tracking());
    }

    #[test]
    fn panicking_run_releases_sources_it_did_not_reach() {
        let early: Rc<dyn AnySource> = Rc::new(SourceInner::new(1));
        let late: Rc<dyn AnySource> = Rc::new(SourceInner::new(2));
        let reaction = CountingReaction::new();
        let erased = as_reaction(&reaction);

        run_tracked(&erased, || {
            track_read(early.clone());
            track_read(late.clone());
        });
        assert_eq!(late.reaction_count(), 1);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_tracked::<()>(&erased, || {
                track_read(early.clone());
                panic!("boom");
            });
        }));

        assert!(result.is_err());
        assert_eq!(early.reaction_count(), 1);
        assert_eq!(late.reaction_count(), 0);
        assert_eq!(reaction.dep_count(), 1);
    }
}
