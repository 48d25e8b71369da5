//! # Formats
//!
//! Byte-level encodings:
//! - `binary`: version-tagged codec for entities and graphs
//! - `persistence`: header + postcard payload for spine segments

pub mod binary;
pub mod persistence;

pub use binary::{BinaryReader, BinaryWriter, Marshal, from_record_bytes, to_record_bytes};
pub use persistence::{PersistenceHeader, segment_from_bytes, segment_to_bytes};
