//! # termstore-core
//!
//! Versioned storage and view resolution for terminology knowledge bases.
//!
//! Every component (concept, semantic, pattern, logic graph) is an
//! append-only chronology of versions. Each version carries a STAMP:
//! Status, Time, Author, Module, Path. Readers never see "the current
//! value"; they ask what is true under a coordinate.
//!
//! ## Layers
//!
//! - `types` / `terms` / `primitives`: identifiers, stamps, errors, constants
//! - `formats`: deterministic binary codec and segment persistence header
//! - `graph`: rooted directed graphs used for logical definitions
//! - `entity`: chronologies and their framed record encoding
//! - `spine` / `storage`: the segmented nid-keyed store and its backends
//! - `coordinate` / `stamp` / `language`: pure view resolution
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies
//! - `BTreeMap` only, no floats, no randomness
//! - Segments reach disk only through an explicit flush
//! - Resolution never depends on storage order

// =============================================================================
// MODULES
// =============================================================================

pub mod coordinate;
pub mod entity;
pub mod formats;
pub mod graph;
pub mod language;
pub mod primitives;
pub mod spine;
pub mod stamp;
pub mod storage;
pub mod terms;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{ErrorKind, Nid, Stamp, Status, TermstoreError};

// =============================================================================
// RE-EXPORTS: Entities & Graphs
// =============================================================================

pub use entity::{
    Chronology, ConceptChronology, ConceptVersion, Entity, EntityKind, EntityVersion, Field,
    FieldDefinition, GraphChronology, GraphVersion, PatternChronology, PatternVersion,
    SemanticChronology, SemanticVersion, Versioned, to_entity,
};
pub use graph::{DiGraph, DiGraphBuilder, GraphVertex, Vertex};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use spine::{FlushControl, FlushReport, SpineConfig, SpineStats, SpineStore};
pub use storage::{MemorySegments, RedbSegments, SegmentPersistence};

// =============================================================================
// RE-EXPORTS: View Resolution
// =============================================================================

pub use coordinate::{
    LanguageCoordinate, StampCoordinate, StampPath, StampPosition, StateSet,
};
pub use language::{DescriptionCandidate, LanguageCalculator, best_description, rank_descriptions};
pub use stamp::{Latest, PathRegistry, RelativePosition, StampCalculator};
