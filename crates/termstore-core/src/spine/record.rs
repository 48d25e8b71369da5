//! Record framing.
//!
//! ```text
//! [chunk count:i32] ([len:i32] [bytes])*
//! ```
//!
//! Chunk 0 is the chronology header, chunks 1.. are versions. This is all
//! the store knows about a record; chunk contents are opaque here.

use crate::TermstoreError;
use crate::formats::{BinaryReader, BinaryWriter};
use std::collections::BTreeSet;

/// Frame chunks into one record.
#[must_use]
pub fn join_chunks<C: AsRef<[u8]>>(chunks: &[C]) -> Vec<u8> {
    let total: usize = chunks.iter().map(|c| c.as_ref().len() + 4).sum();
    let mut out = BinaryWriter::with_capacity(total + 4);
    out.put_len(chunks.len());
    for chunk in chunks {
        out.put_bytes(chunk.as_ref());
    }
    out.into_bytes()
}

/// Split a record into its chunks without copying.
pub fn split_chunks(bytes: &[u8]) -> Result<Vec<&[u8]>, TermstoreError> {
    let mut input = BinaryReader::new(bytes);
    let count = input.get_len()?;
    // Every chunk needs at least its 4-byte length.
    if count.saturating_mul(4) > input.remaining() {
        return Err(TermstoreError::DeserializationError(format!(
            "Record claims {} chunks in {} bytes",
            count,
            input.remaining()
        )));
    }
    let chunks = (0..count)
        .map(|_| input.get_bytes())
        .collect::<Result<Vec<_>, _>>()?;
    input.expect_end()?;
    Ok(chunks)
}

/// Header followed by the distinct version chunks in byte order.
fn canonical_chunks<'a>(
    header: &'a [u8],
    versions: impl IntoIterator<Item = &'a [u8]>,
) -> Vec<&'a [u8]> {
    let distinct: BTreeSet<&[u8]> = versions.into_iter().collect();
    let mut chunks = Vec::with_capacity(distinct.len() + 1);
    chunks.push(header);
    chunks.extend(distinct);
    chunks
}

/// Rewrite a record into canonical form: exact-byte duplicate versions
/// dropped, the rest sorted by their bytes.
pub fn canonical_record(bytes: &[u8]) -> Result<Vec<u8>, TermstoreError> {
    let chunks = split_chunks(bytes)?;
    let Some((header, versions)) = chunks.split_first() else {
        return Err(TermstoreError::InvalidChronology(
            "Record without header chunk".to_string(),
        ));
    };
    Ok(join_chunks(&canonical_chunks(*header, versions.iter().copied())))
}

/// Union of the versions of `existing` and `incoming`, in canonical form.
///
/// Returns `None` when the stored record already is that union. Both
/// records must carry the same header chunk. The result does not depend on
/// which record arrived first.
pub fn merge_records(existing: &[u8], incoming: &[u8]) -> Result<Option<Vec<u8>>, TermstoreError> {
    let current = split_chunks(existing)?;
    let arriving = split_chunks(incoming)?;

    let (Some(current_header), Some(arriving_header)) = (current.first(), arriving.first()) else {
        return Err(TermstoreError::InvalidChronology(
            "Record without header chunk".to_string(),
        ));
    };
    if current_header != arriving_header {
        return Err(TermstoreError::InvalidChronology(
            "Record header does not match stored chronology".to_string(),
        ));
    }

    let merged = canonical_chunks(
        *current_header,
        current.iter().skip(1).chain(arriving.iter().skip(1)).copied(),
    );
    if merged == current {
        Ok(None)
    } else {
        Ok(Some(join_chunks(&merged)))
    }
}

/// Number of version chunks in a record.
pub fn version_count(bytes: &[u8]) -> Result<usize, TermstoreError> {
    Ok(split_chunks(bytes)?.len().saturating_sub(1))
}
