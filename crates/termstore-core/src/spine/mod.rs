//! # Spine Store
//!
//! Nid-keyed storage for framed chronology records.
//!
//! Every nid maps to `(segment, offset) = (nid / spine_size, nid % spine_size)`.
//! Segments are allocated on first write, loaded lazily from a
//! [`SegmentPersistence`](crate::storage::SegmentPersistence) backend and
//! written back only by an explicit [`SpineStore::flush`].
//!
//! ## Spines
//!
//! | spine                 | slot value                         |
//! |-----------------------|------------------------------------|
//! | `records`             | framed record bytes                |
//! | `definitions`         | definition (pattern) nid           |
//! | `component_semantics` | semantics referencing the nid      |
//! | `pattern_semantics`   | semantics of the pattern nid       |

mod array;
pub mod record;
mod store;

pub use store::SpineStore;

use crate::TermstoreError;
use crate::primitives::DEFAULT_SPINE_SIZE;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

pub const RECORDS: &str = "records";
pub const DEFINITIONS: &str = "definitions";
pub const COMPONENT_SEMANTICS: &str = "component_semantics";
pub const PATTERN_SEMANTICS: &str = "pattern_semantics";

/// Every spine, in flush order.
pub const SPINES: [&str; 4] = [RECORDS, DEFINITIONS, COMPONENT_SEMANTICS, PATTERN_SEMANTICS];

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Spine store configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpineConfig {
    /// Slots per segment. Fixed for the lifetime of a database.
    pub spine_size: usize,
}

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            spine_size: DEFAULT_SPINE_SIZE,
        }
    }
}

impl SpineConfig {
    #[must_use]
    pub fn with_spine_size(spine_size: usize) -> Self {
        Self { spine_size }
    }

    pub fn validate(&self) -> Result<(), TermstoreError> {
        if self.spine_size == 0 {
            return Err(TermstoreError::InvalidConfig(
                "spine_size must be greater than zero".to_string(),
            ));
        }
        if u32::try_from(self.spine_size).is_err() {
            return Err(TermstoreError::InvalidConfig(format!(
                "spine_size {} does not fit a segment",
                self.spine_size
            )));
        }
        Ok(())
    }
}

// =============================================================================
// FLUSH CONTROL
// =============================================================================

/// Bounds and cancels a flush.
///
/// `cancel()` may be called from another thread while a flush runs; the
/// flush stops before its next segment write.
#[derive(Debug, Default)]
pub struct FlushControl {
    cancelled: AtomicBool,
    max_segments: Option<usize>,
}

impl FlushControl {
    /// Unbounded flush.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write at most `max_segments` segments.
    #[must_use]
    pub fn with_max_segments(max_segments: usize) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            max_segments: Some(max_segments),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn max_segments(&self) -> Option<usize> {
        self.max_segments
    }
}

/// Outcome of a flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    /// Segments written by this flush.
    pub written: usize,
    /// Segments still dirty when the flush stopped.
    pub remaining: usize,
    /// The flush stopped because it was cancelled.
    pub cancelled: bool,
}

impl FlushReport {
    /// Nothing left to write.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining == 0 && !self.cancelled
    }
}

/// Segment counts of one spine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpineStats {
    pub spine: String,
    pub resident: usize,
    pub dirty: usize,
}
