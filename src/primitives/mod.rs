// ============================================================================
// spark-state - Primitives Module
// Reactive cells: signal and derived
// ============================================================================

pub mod derived;
pub mod signal;

// Re-export for convenience
pub use derived::{create_derivation, derived, derived_with_equals, Derived, DerivedInner};
pub use signal::{create_signal, mutable_signal, signal, signal_with_equals, Signal};
