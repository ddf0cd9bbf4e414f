// ============================================================================
// spark-state - Reactivity Module
// Dependency tracking, synchronous propagation and equality policies
// ============================================================================

pub mod equality;
pub mod tracking;
pub mod untracked;

// Re-export main tracking functions
pub use tracking::{disconnect_reaction, notify_write, release_stale_deps, run_tracked, track_read};

// Re-export untracked reads
pub use untracked::{peek, untrack};
