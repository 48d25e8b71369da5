//! # Well-Known Terms
//!
//! Nids of the concepts every termstore database is bootstrapped with.
//! Coordinate presets and the description layouts refer to these.
//!
//! The low nid range `0..64` is reserved for them.

use crate::Nid;

// Paths
pub const PRIMORDIAL_PATH: Nid = Nid(1);
pub const SANDBOX_PATH: Nid = Nid(2);
pub const MASTER_PATH: Nid = Nid(3);
pub const DEVELOPMENT_PATH: Nid = Nid(4);

// Modules
pub const PRIMORDIAL_MODULE: Nid = Nid(8);
pub const SOLOR_MODULE: Nid = Nid(9);
pub const SOLOR_OVERLAY_MODULE: Nid = Nid(10);

// Authors
pub const USER: Nid = Nid(12);

// Languages. `LANGUAGE` is the wildcard: it matches any description language.
pub const LANGUAGE: Nid = Nid(16);
pub const ENGLISH_LANGUAGE: Nid = Nid(17);
pub const SPANISH_LANGUAGE: Nid = Nid(18);

// Definitions of the non-semantic component kinds
pub const CONCEPT_DEFINITION: Nid = Nid(20);
pub const PATTERN_DEFINITION: Nid = Nid(21);

// Patterns
pub const DESCRIPTION_PATTERN: Nid = Nid(24);
pub const US_DIALECT_PATTERN: Nid = Nid(25);
pub const GB_DIALECT_PATTERN: Nid = Nid(26);
pub const STATED_AXIOMS_PATTERN: Nid = Nid(27);
pub const INFERRED_AXIOMS_PATTERN: Nid = Nid(28);

// Description types
pub const FULLY_QUALIFIED_NAME_DESCRIPTION_TYPE: Nid = Nid(32);
pub const REGULAR_NAME_DESCRIPTION_TYPE: Nid = Nid(33);
pub const DEFINITION_DESCRIPTION_TYPE: Nid = Nid(34);

// Dialect acceptability
pub const PREFERRED: Nid = Nid(40);
pub const ACCEPTABLE: Nid = Nid(41);

// Case significance
pub const DESCRIPTION_NOT_CASE_SENSITIVE: Nid = Nid(44);
pub const DESCRIPTION_CASE_SENSITIVE: Nid = Nid(45);

/// First nid available to content outside the bootstrap set.
pub const FIRST_CONTENT_NID: Nid = Nid(64);
