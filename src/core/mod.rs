// ============================================================================
// spark-state - Core Module
// Fundamental types, traits, and context for the reactive engine
// ============================================================================

pub mod constants;
pub mod context;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use context::{
    is_tracking, is_untracking, with_context, ActiveReactionGuard,
    ReactiveContext,
};
pub use types::{AnyReaction, AnySource, EqualsFn, SourceInner};
