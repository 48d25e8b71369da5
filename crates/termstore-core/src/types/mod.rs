//! # Core Type Definitions
//!
//! This module contains the types shared by every termstore layer:
//! - Component identifiers (`Nid`)
//! - The STAMP versioning tuple (`Status`, `Stamp`)
//! - Error types (`TermstoreError`, `ErrorKind`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Dense integer identifier for any component (concept, semantic, pattern...).
///
/// Valid nids are non-negative. `Nid::NOT_A_SEMANTIC` (`i32::MAX`) is the
/// sentinel passed to the spine store for records that do not reference
/// another component.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Nid(pub i32);

impl Nid {
    /// Sentinel meaning "not a referencing-semantic record".
    pub const NOT_A_SEMANTIC: Nid = Nid(i32::MAX);

    /// Create a new nid.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// True when the nid can address a stored component.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// True for the "not a semantic" sentinel.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.0 == i32::MAX
    }

    /// Reject negative nids with a contract violation.
    pub fn check(self) -> Result<Self, TermstoreError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(TermstoreError::NegativeNid(self.0))
        }
    }
}

impl fmt::Display for Nid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Nid {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

// =============================================================================
// STAMP
// =============================================================================

/// Status of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
    Withdrawn,
    Primordial,
}

impl Status {
    /// All statuses in token order.
    pub const ALL: [Status; 4] = [
        Status::Active,
        Status::Inactive,
        Status::Withdrawn,
        Status::Primordial,
    ];

    /// Stable one-byte wire token.
    #[must_use]
    pub const fn token(self) -> u8 {
        match self {
            Status::Active => 0,
            Status::Inactive => 1,
            Status::Withdrawn => 2,
            Status::Primordial => 3,
        }
    }

    /// Inverse of [`Status::token`].
    pub fn from_token(token: u8) -> Result<Self, TermstoreError> {
        match token {
            0 => Ok(Status::Active),
            1 => Ok(Status::Inactive),
            2 => Ok(Status::Withdrawn),
            3 => Ok(Status::Primordial),
            other => Err(TermstoreError::DeserializationError(format!(
                "Unknown status token: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
            Status::Withdrawn => "withdrawn",
            Status::Primordial => "primordial",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Status {
    type Err = TermstoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            "withdrawn" => Ok(Status::Withdrawn),
            "primordial" => Ok(Status::Primordial),
            other => Err(TermstoreError::InvalidConfig(format!(
                "Unknown status '{}'",
                other
            ))),
        }
    }
}

/// The versioning tuple carried by every version: Status, Time, Author,
/// Module, Path.
///
/// The derived `Ord` is only a deterministic tie-break; resolution itself
/// compares `time`, never storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub status: Status,
    /// Logical timestamp (epoch millis in practice).
    pub time: i64,
    pub author: Nid,
    pub module: Nid,
    pub path: Nid,
}

impl Stamp {
    /// Create a new stamp.
    #[must_use]
    pub const fn new(status: Status, time: i64, author: Nid, module: Nid, path: Nid) -> Self {
        Self {
            status,
            time,
            author,
            module,
            path,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Coarse classification of a [`TermstoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid caller input. Fatal, never retried.
    ContractViolation,
    /// Decode-time version mismatch. Fatal.
    FormatIncompatibility,
    /// Bytes that cannot be decoded or encoded. Fatal.
    Corrupt,
    /// Persistence I/O failure. The caller decides whether to retry.
    StorageFailure,
}

/// Errors that can occur in termstore.
///
/// - No silent failures
/// - Use `Result<T, TermstoreError>` for fallible operations
/// - "Nothing visible under this view" is `None`, never an error
#[derive(Debug, Error)]
pub enum TermstoreError {
    /// A negative nid reached an API that requires a stored component.
    #[error("Negative nid: {0}")]
    NegativeNid(i32),

    /// A path nid has no registered definition.
    #[error("Unknown path: {0}")]
    UnknownPath(Nid),

    /// A path is (transitively) its own origin.
    #[error("Path cycle through: {0}")]
    PathCycle(Nid),

    /// A directed graph builder or decoded graph references missing vertices.
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    /// A chronology cannot be converted into an entity.
    #[error("Invalid chronology: {0}")]
    InvalidChronology(String),

    /// Configuration rejected before use.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A record was written by an incompatible format version.
    #[error("Unsupported {record} format version: {actual} (expected {expected})")]
    UnsupportedFormatVersion {
        record: &'static str,
        expected: i32,
        actual: i32,
    },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred in the persistence layer.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl TermstoreError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NegativeNid(_)
            | Self::UnknownPath(_)
            | Self::PathCycle(_)
            | Self::MalformedGraph(_)
            | Self::InvalidChronology(_)
            | Self::InvalidConfig(_) => ErrorKind::ContractViolation,
            Self::UnsupportedFormatVersion { .. } => ErrorKind::FormatIncompatibility,
            Self::SerializationError(_) | Self::DeserializationError(_) => ErrorKind::Corrupt,
            Self::IoError(_) => ErrorKind::StorageFailure,
        }
    }

    /// Only storage failures may succeed if the caller tries again.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::StorageFailure
    }
}

// =============================================================================
// TESTS
// =============================================================================
