// ============================================================================
// spark-state - Persistent State and Fine-Grained Reactivity for Rust
// ============================================================================
//
// Two engines:
// - collections: copy-on-write ImmutableMap / ImmutableSequence trees with
//   path reads and writes, structural equality and plain-data conversion
// - signals: Signal / Derived cells that discover their dependencies by
//   reading, and push changes synchronously to dependents
// ============================================================================

#[macro_use]
mod macros;

pub mod collections;
pub mod core;
pub mod error;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use core::constants;
pub use core::context::{
    is_tracking, is_untracking, with_context, ActiveReactionGuard,
    ReactiveContext,
};
pub use core::types::{AnyReaction, AnySource, EqualsFn, SourceInner};

// Reactive primitives
pub use primitives::derived::{
    create_derivation, derived, derived_with_equals, Derived, DerivedInner,
};
pub use primitives::signal::{create_signal, mutable_signal, signal, signal_with_equals, Signal};

// Reactivity functions
pub use reactivity::equality::{
    always_equals, default_equals, equals, identical, never_equals, safe_equals_f32,
    safe_equals_f64,
};
pub use reactivity::tracking::{notify_write, track_read};
pub use reactivity::untracked::{peek, untrack};

// Persistent collections
pub use collections::{
    from_json_str, from_plain, is_persistent, to_json_string, ImmutableMap, ImmutableSequence,
    Path, PathSegment, Value,
};

pub use error::{Error, Result};

// =============================================================================
// TESTS
// =============================================================================
