//! # Innate Primitives
//!
//! Hardcoded runtime constants for the termstore CORE.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Position time meaning "latest": no upper bound on the queried path.
pub const LATEST_TIME: i64 = i64::MAX;

/// Time stamped on content that predates any recorded history.
pub const PREMUNDANE_TIME: i64 = i64::MIN;

/// Default number of slots per spine segment.
pub const DEFAULT_SPINE_SIZE: usize = 10_240;

/// Magic bytes for persisted spine segments.
///
/// - Segment payload = Magic ("TSPN") + Version (u8) + postcard slots.
pub const MAGIC_BYTES: &[u8; 4] = b"TSPN";

/// Current segment serialization format version.
///
/// Increment this when making breaking changes to the segment format.
pub const FORMAT_VERSION: u8 = 1;

/// Upper bound on any length prefix accepted by the binary reader.
///
/// Rejected before allocation so a corrupt prefix cannot exhaust memory.
pub const MAX_DECODE_ELEMENTS: usize = 16 * 1024 * 1024;

/// Deepest chain of nested records the binary reader will follow.
///
/// Graph-valued vertex properties nest two records per level.
pub const MAX_RECORD_NESTING: usize = 64;

/// Maximum number of paths visited while computing one path closure.
pub const MAX_PATH_CLOSURE: usize = 10_000;

/// Metadata key holding the next nid to hand out.
pub const NEXT_NID_KEY: &str = "next_nid";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"TSPN");
    }

    #[test]
    fn latest_is_max_time() {
        assert_eq!(LATEST_TIME, i64::MAX);
        assert!(PREMUNDANE_TIME < 0);
    }
}
