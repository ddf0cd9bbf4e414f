// ============================================================================
// spark-state - Constants
// Flag constants for reactive graph nodes
// ============================================================================

// =============================================================================
// NODE TYPE FLAGS
// =============================================================================

/// Source cell (writable signal)
pub const SOURCE: u32 = 1 << 0;

/// Node is a derivation (computed, both source and reaction)
pub const DERIVED: u32 = 1 << 1;

// =============================================================================
// NODE STATE FLAGS
// =============================================================================

/// Derivation has been torn down and ignores further notifications
pub const DISPOSED: u32 = 1 << 10;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_distinct() {
        let all_flags = [SOURCE, DERIVED, DISPOSED];

        for (i, &a) in all_flags.iter().enumerate() {
            for (j, &b) in all_flags.iter().enumerate() {
                if i != j {
                    assert_eq!(a & b, 0, "Flags at index {} and {} overlap", i, j);
                }
            }
        }
    }

    #[test]
    fn can_combine_and_clear_flags() {
        let mut flags = DERIVED | SOURCE;
        flags |= DISPOSED;
        assert_ne!(flags & DISPOSED, 0);

        flags &= !DISPOSED;
        assert_eq!(flags & DISPOSED, 0);
        assert_ne!(flags & DERIVED, 0);
    }
}
