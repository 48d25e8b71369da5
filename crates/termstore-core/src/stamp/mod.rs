//! # STAMP Resolution
//!
//! Decides which versions a [`StampCoordinate`](crate::coordinate::StampCoordinate)
//! can see and which of them is latest.
//!
//! ## Algorithm
//!
//! 1. Effective paths: the queried path plus, transitively, its origins,
//!    each with a time bound (`PathRegistry::ancestry`).
//! 2. Candidates: versions on an effective path, at or before its bound,
//!    from a module that is not excluded.
//! 3. Latest: greatest time; at equal time the path closest to the queried
//!    one. The status filter applies to that single version, so an inactive
//!    latest version hides older active ones.
//! 4. Remaining ties are contradictions. The largest stamp wins; the others
//!    are reported on [`Latest`].
//!
//! Resolution never looks at storage order.

mod calculator;
mod latest;
mod path;

pub use calculator::StampCalculator;
pub use latest::Latest;
pub use path::{PathBound, PathRegistry};

use serde::{Deserialize, Serialize};

/// Order of two stamps in path history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativePosition {
    Before,
    After,
    Equal,
    /// Parallel edits on branches with shared history.
    Contradiction,
    /// No shared history at all.
    Unreachable,
}
