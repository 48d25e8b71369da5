//! # Segment Persistence Format
//!
//! Binary serialization for spine segments.
//! Storage I/O lives behind `storage::SegmentPersistence`; this module is
//! a pure transformation.
//!
//! Format: Header (5 bytes) + postcard-serialized sparse slot list.
//! - 4 bytes: Magic ("TSPN")
//! - 1 byte: Version
//!
//! Only occupied slots are written, as `(offset, value)` pairs in offset
//! order, together with the spine size the segment was cut with. A segment
//! cut with a different spine size addresses different nids and is refused.
//!
//! ## Security
//!
//! Size and header are validated before the payload is deserialized.

use crate::{TermstoreError, primitives};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Maximum allowed segment payload size (256 MB).
pub const MAX_SEGMENT_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

/// Header length in bytes.
const HEADER_SIZE: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The persistence header precedes every segment payload.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), TermstoreError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(TermstoreError::DeserializationError(
                "Invalid segment magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(TermstoreError::UnsupportedFormatVersion {
                record: "SpineSegment",
                expected: i32::from(primitives::FORMAT_VERSION),
                actual: i32::from(self.version),
            });
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TermstoreError> {
        if bytes.len() < HEADER_SIZE {
            return Err(TermstoreError::DeserializationError(
                "Segment header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

#[derive(Serialize)]
struct SegmentPayloadRef<'a, T> {
    spine_size: u32,
    slots: Vec<(u32, &'a T)>,
}

#[derive(Deserialize)]
struct SegmentPayload<T> {
    spine_size: u32,
    slots: Vec<(u32, T)>,
}

/// Serialize a segment's slots (header + payload).
pub fn segment_to_bytes<T: Serialize>(slots: &[Option<T>]) -> Result<Vec<u8>, TermstoreError> {
    let payload = SegmentPayloadRef {
        spine_size: slots.len() as u32,
        slots: slots
            .iter()
            .enumerate()
            .filter_map(|(offset, slot)| slot.as_ref().map(|value| (offset as u32, value)))
            .collect(),
    };

    let body = postcard::to_stdvec(&payload)
        .map_err(|e| TermstoreError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + body.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&body);
    Ok(result)
}

/// Deserialize a segment into `spine_size` slots.
pub fn segment_from_bytes<T: DeserializeOwned>(
    bytes: &[u8],
    spine_size: usize,
) -> Result<Vec<Option<T>>, TermstoreError> {
    if bytes.len() > MAX_SEGMENT_PAYLOAD_SIZE {
        return Err(TermstoreError::DeserializationError(format!(
            "Segment size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SEGMENT_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload: SegmentPayload<T> = postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
        TermstoreError::DeserializationError(format!("Failed to deserialize segment: {}", e))
    })?;

    if payload.spine_size as usize != spine_size {
        return Err(TermstoreError::InvalidConfig(format!(
            "Segment was written with spine size {} but the store uses {}",
            payload.spine_size, spine_size
        )));
    }

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(spine_size).collect();
    for (offset, value) in payload.slots {
        let slot = slots.get_mut(offset as usize).ok_or_else(|| {
            TermstoreError::DeserializationError(format!(
                "Slot offset {} outside segment of {}",
                offset, spine_size
            ))
        })?;
        *slot = Some(value);
    }
    Ok(slots)
}

// =============================================================================
// TESTS
// =============================================================================
