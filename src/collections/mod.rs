// ============================================================================
// spark-state - Persistent Collections
// Immutable maps and sequences with structural sharing and path operations
// ============================================================================
//
// Every write returns a new container. Only the top-level spine is copied;
// untouched children are shared by reference count. A write that cannot
// apply (out-of-range index, key on a sequence) returns the receiver itself.
// ============================================================================

mod convert;
mod map;
mod path;
mod sequence;
mod value;

pub use convert::{from_json_str, from_plain, to_json_string};
pub use map::ImmutableMap;
pub use path::{Path, PathSegment};
pub use sequence::ImmutableSequence;
pub use value::{is_persistent, Value};
