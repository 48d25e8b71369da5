//! # Binary Codec
//!
//! Length-prefixed, version-tagged encoding used for entity versions and
//! logic definition graphs.
//!
//! All integers are big-endian. Every composite record written through
//! [`BinaryWriter::put_record`] starts with its `i32` marshal version; the
//! reader refuses any other version instead of guessing at the layout.

use crate::primitives::{MAX_DECODE_ELEMENTS, MAX_RECORD_NESTING};
use crate::{Nid, TermstoreError};
use std::collections::BTreeMap;

// =============================================================================
// MARSHAL TRAIT
// =============================================================================

/// A composite record with a fixed field order and an explicit format version.
pub trait Marshal: Sized {
    /// Name used in version mismatch errors.
    const RECORD_NAME: &'static str;

    /// Version tag written ahead of the fields.
    const MARSHAL_VERSION: i32;

    /// Write the fields (not the version tag).
    fn marshal(&self, out: &mut BinaryWriter);

    /// Read the fields (the version tag has already been checked).
    fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError>;
}

/// Encode a record, version tag included.
#[must_use]
pub fn to_record_bytes<T: Marshal>(record: &T) -> Vec<u8> {
    let mut out = BinaryWriter::new();
    out.put_record(record);
    out.into_bytes()
}

/// Decode a record that must occupy the whole buffer.
pub fn from_record_bytes<T: Marshal>(bytes: &[u8]) -> Result<T, TermstoreError> {
    let mut input = BinaryReader::new(bytes);
    let record = input.get_record::<T>()?;
    input.expect_end()?;
    Ok(record)
}

// =============================================================================
// WRITER
// =============================================================================

/// Append-only output buffer.
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_byte(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn put_int(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_long(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_nid(&mut self, nid: Nid) {
        self.put_int(nid.0);
    }

    /// Length-prefixed raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_len(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Length-prefixed UTF-8.
    pub fn put_string(&mut self, value: &str) {
        self.put_bytes(value.as_bytes());
    }

    /// Length-prefixed nid list.
    pub fn put_nid_list(&mut self, nids: &[Nid]) {
        self.put_len(nids.len());
        for nid in nids {
            self.put_nid(*nid);
        }
    }

    /// Length-prefixed `i32` list.
    pub fn put_int_list(&mut self, values: &[i32]) {
        self.put_len(values.len());
        for value in values {
            self.put_int(*value);
        }
    }

    /// Count-prefixed (key, int list) pairs in key order.
    pub fn put_int_list_map(&mut self, map: &BTreeMap<i32, Vec<i32>>) {
        self.put_len(map.len());
        for (key, values) in map {
            self.put_int(*key);
            self.put_int_list(values);
        }
    }

    /// Count-prefixed (key, nid list) pairs in key order.
    pub fn put_nid_list_map(&mut self, map: &BTreeMap<Nid, Vec<Nid>>) {
        self.put_len(map.len());
        for (key, values) in map {
            self.put_nid(*key);
            self.put_nid_list(values);
        }
    }

    /// Version tag followed by the record's fields.
    pub fn put_record<T: Marshal>(&mut self, record: &T) {
        self.put_int(T::MARSHAL_VERSION);
        record.marshal(self);
    }

    /// Collection lengths are written as `i32`.
    ///
    /// Lengths the reader would refuse saturate to `i32::MAX` instead of
    /// wrapping, so they can never decode as a different length.
    pub fn put_len(&mut self, len: usize) {
        debug_assert!(
            len <= MAX_DECODE_ELEMENTS,
            "length {len} exceeds decodable maximum"
        );
        self.put_int(i32::try_from(len).unwrap_or(i32::MAX));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// =============================================================================
// READER
// =============================================================================

/// Cursor over an encoded buffer.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> BinaryReader<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            depth: 0,
        }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail if unread bytes remain.
    pub fn expect_end(&self) -> Result<(), TermstoreError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(TermstoreError::DeserializationError(format!(
                "{} trailing bytes after record",
                self.remaining()
            )))
        }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], TermstoreError> {
        if count > self.remaining() {
            return Err(TermstoreError::DeserializationError(format!(
                "Unexpected end of input: need {} bytes at offset {}, have {}",
                count,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], TermstoreError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn get_byte(&mut self) -> Result<u8, TermstoreError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn get_bool(&mut self) -> Result<bool, TermstoreError> {
        match self.get_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(TermstoreError::DeserializationError(format!(
                "Invalid bool byte: {}",
                other
            ))),
        }
    }

    pub fn get_int(&mut self) -> Result<i32, TermstoreError> {
        Ok(i32::from_be_bytes(self.take_array::<4>()?))
    }

    pub fn get_long(&mut self) -> Result<i64, TermstoreError> {
        Ok(i64::from_be_bytes(self.take_array::<8>()?))
    }

    pub fn get_nid(&mut self) -> Result<Nid, TermstoreError> {
        Ok(Nid(self.get_int()?))
    }

    /// Read an `i32` length and validate it before anything is allocated.
    pub fn get_len(&mut self) -> Result<usize, TermstoreError> {
        let raw = self.get_int()?;
        let len = usize::try_from(raw).map_err(|_| {
            TermstoreError::DeserializationError(format!("Negative length: {}", raw))
        })?;
        if len > MAX_DECODE_ELEMENTS {
            return Err(TermstoreError::DeserializationError(format!(
                "Length {} exceeds maximum {}",
                len, MAX_DECODE_ELEMENTS
            )));
        }
        Ok(len)
    }

    pub fn get_bytes(&mut self) -> Result<&'a [u8], TermstoreError> {
        let len = self.get_len()?;
        self.take(len)
    }

    pub fn get_string(&mut self) -> Result<String, TermstoreError> {
        let bytes = self.get_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| TermstoreError::DeserializationError(format!("Invalid UTF-8: {}", e)))
    }

    pub fn get_int_list(&mut self) -> Result<Vec<i32>, TermstoreError> {
        let len = self.get_len()?;
        // Each entry is 4 bytes; a shorter buffer cannot hold the list.
        if len.saturating_mul(4) > self.remaining() {
            return Err(TermstoreError::DeserializationError(format!(
                "List of {} entries exceeds remaining {} bytes",
                len,
                self.remaining()
            )));
        }
        (0..len).map(|_| self.get_int()).collect()
    }

    pub fn get_nid_list(&mut self) -> Result<Vec<Nid>, TermstoreError> {
        Ok(self.get_int_list()?.into_iter().map(Nid).collect())
    }

    pub fn get_int_list_map(&mut self) -> Result<BTreeMap<i32, Vec<i32>>, TermstoreError> {
        let count = self.get_len()?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = self.get_int()?;
            let values = self.get_int_list()?;
            if map.insert(key, values).is_some() {
                return Err(TermstoreError::DeserializationError(format!(
                    "Duplicate map key: {}",
                    key
                )));
            }
        }
        Ok(map)
    }

    pub fn get_nid_list_map(&mut self) -> Result<BTreeMap<Nid, Vec<Nid>>, TermstoreError> {
        let count = self.get_len()?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = self.get_nid()?;
            let values = self.get_nid_list()?;
            if map.insert(key, values).is_some() {
                return Err(TermstoreError::DeserializationError(format!(
                    "Duplicate map key: {}",
                    key
                )));
            }
        }
        Ok(map)
    }

    /// Read a version tag and the record's fields.
    ///
    /// Records nested deeper than [`MAX_RECORD_NESTING`] are rejected.
    pub fn get_record<T: Marshal>(&mut self) -> Result<T, TermstoreError> {
        let actual = self.get_int()?;
        if actual != T::MARSHAL_VERSION {
            return Err(TermstoreError::UnsupportedFormatVersion {
                record: T::RECORD_NAME,
                expected: T::MARSHAL_VERSION,
                actual,
            });
        }
        if self.depth >= MAX_RECORD_NESTING {
            return Err(TermstoreError::DeserializationError(format!(
                "{} nested deeper than {} records",
                T::RECORD_NAME,
                MAX_RECORD_NESTING
            )));
        }
        self.depth += 1;
        let record = T::unmarshal(self);
        self.depth -= 1;
        record
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[derive(Debug, PartialEq)]
    struct Pair {
        left: Nid,
        right: Vec<Nid>,
    }

    impl Marshal for Pair {
        const RECORD_NAME: &'static str = "Pair";
        const MARSHAL_VERSION: i32 = 7;

        fn marshal(&self, out: &mut BinaryWriter) {
            out.put_nid(self.left);
            out.put_nid_list(&self.right);
        }

        fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
            Ok(Self {
                left: input.get_nid()?,
                right: input.get_nid_list()?,
            })
        }
    }

    #[test]
    fn primitives_are_big_endian() {
        let mut out = BinaryWriter::new();
        out.put_int(1);
        out.put_long(-2);
        assert_eq!(&out.as_slice()[0..4], &[0, 0, 0, 1]);
        assert_eq!(
            &out.as_slice()[4..12],
            &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]
        );
    }

    #[test]
    fn scalar_values_read_back() {
        let mut out = BinaryWriter::new();
        out.put_bool(true);
        out.put_int(-42);
        out.put_long(i64::MAX);
        out.put_string("Heart structure");
        out.put_byte(9);

        let bytes = out.into_bytes();
        let mut input = BinaryReader::new(&bytes);
        assert!(input.get_bool().expect("bool"));
        assert_eq!(input.get_int().expect("int"), -42);
        assert_eq!(input.get_long().expect("long"), i64::MAX);
        assert_eq!(input.get_string().expect("string"), "Heart structure");
        assert_eq!(input.get_byte().expect("byte"), 9);
        assert!(input.is_at_end());
    }

    #[test]
    fn nid_list_map_keeps_value_order() {
        let mut map = BTreeMap::new();
        map.insert(Nid(5), vec![Nid(9), Nid(1)]);
        map.insert(Nid(2), vec![]);

        let mut out = BinaryWriter::new();
        out.put_nid_list_map(&map);
        let bytes = out.into_bytes();

        let restored = BinaryReader::new(&bytes)
            .get_nid_list_map()
            .expect("decode map");
        assert_eq!(restored, map);
        assert_eq!(restored[&Nid(5)], vec![Nid(9), Nid(1)]);
    }

    #[test]
    fn record_carries_version_tag() {
        let record = Pair {
            left: Nid(3),
            right: vec![Nid(4)],
        };
        let bytes = to_record_bytes(&record);
        assert_eq!(&bytes[0..4], &7i32.to_be_bytes());
        assert_eq!(from_record_bytes::<Pair>(&bytes).expect("decode"), record);
    }

    #[test]
    fn version_mismatch_is_fatal() {
        let mut out = BinaryWriter::new();
        out.put_int(6);
        out.put_nid(Nid(3));
        out.put_nid_list(&[]);
        let bytes = out.into_bytes();

        let err = from_record_bytes::<Pair>(&bytes).expect_err("version mismatch");
        assert!(matches!(
            err,
            TermstoreError::UnsupportedFormatVersion {
                record: "Pair",
                expected: 7,
                actual: 6,
            }
        ));
        assert_eq!(err.kind(), ErrorKind::FormatIncompatibility);
    }

    #[test]
    fn truncated_input_rejected() {
        let mut input = BinaryReader::new(&[0, 0, 1]);
        assert!(input.get_int().is_err());
    }

    #[test]
    fn negative_and_oversized_lengths_rejected() {
        let mut out = BinaryWriter::new();
        out.put_int(-1);
        let bytes = out.into_bytes();
        assert!(BinaryReader::new(&bytes).get_nid_list().is_err());

        let mut out = BinaryWriter::new();
        out.put_int(1_000);
        out.put_nid(Nid(1));
        let bytes = out.into_bytes();
        assert!(BinaryReader::new(&bytes).get_nid_list().is_err());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = to_record_bytes(&Pair {
            left: Nid(1),
            right: vec![],
        });
        bytes.push(0);
        assert!(from_record_bytes::<Pair>(&bytes).is_err());
    }

    /// A chain of records, each optionally holding the next.
    #[derive(Debug)]
    struct Link(Option<Box<Link>>);

    impl Marshal for Link {
        const RECORD_NAME: &'static str = "Link";
        const MARSHAL_VERSION: i32 = 1;

        fn marshal(&self, out: &mut BinaryWriter) {
            out.put_bool(self.0.is_some());
            if let Some(next) = &self.0 {
                out.put_record(next.as_ref());
            }
        }

        fn unmarshal(input: &mut BinaryReader<'_>) -> Result<Self, TermstoreError> {
            if input.get_bool()? {
                Ok(Link(Some(Box::new(input.get_record()?))))
            } else {
                Ok(Link(None))
            }
        }
    }

    fn chain(links: usize) -> Vec<u8> {
        let mut out = BinaryWriter::new();
        for _ in 0..links {
            out.put_int(Link::MARSHAL_VERSION);
            out.put_bool(true);
        }
        out.put_int(Link::MARSHAL_VERSION);
        out.put_bool(false);
        out.into_bytes()
    }

    #[test]
    fn nesting_within_limit_decodes() {
        assert!(from_record_bytes::<Link>(&chain(MAX_RECORD_NESTING - 1)).is_ok());
    }

    #[test]
    fn runaway_nesting_is_an_error() {
        let err = from_record_bytes::<Link>(&chain(200_000)).expect_err("too deep");
        assert!(matches!(err, TermstoreError::DeserializationError(_)));
        assert!(from_record_bytes::<Link>(&chain(MAX_RECORD_NESTING)).is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "exceeds decodable maximum")]
    fn undecodable_length_caught_in_debug() {
        BinaryWriter::new().put_len(MAX_DECODE_ELEMENTS + 1);
    }
}
