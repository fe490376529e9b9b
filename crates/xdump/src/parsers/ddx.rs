//! Xbox-native DDX texture header validation and extent computation.
//!
//! Extent is the compressed size: the header plus the LZX chunk
//! descriptor table plus the sum of each chunk's compressed size. The
//! parser never decompresses a chunk to measure it.

use super::{ParseResult, RejectReason};
use crate::binary::{BinaryReader, Endian};
use crate::signature::Signature;

const HEADER_SIZE: usize = 68;
const FETCH_CONSTANT_OFFSET: usize = 8;
const CHUNK_COUNT_OFFSET: usize = 64;
const MAX_DIMENSION: u32 = 16384;
const MAX_CHUNKS: u64 = 65_535;

pub fn parse(window: &[u8], sig: &Signature) -> Result<ParseResult, RejectReason> {
    if window.len() < HEADER_SIZE {
        return Err(RejectReason::HeaderInvalid);
    }
    let r = BinaryReader::new(window);

    let fetch = r
        .u32(FETCH_CONSTANT_OFFSET, Endian::Big)
        .map_err(|_| RejectReason::OutOfBounds)?;
    let width = (fetch & 0x1fff) + 1;
    let height = ((fetch >> 13) & 0x1fff) + 1;
    if width == 0 || width > MAX_DIMENSION || height == 0 || height > MAX_DIMENSION {
        return Err(RejectReason::HeaderInvalid);
    }
    let format_tag = (fetch >> 26) & 0x3f;

    let chunk_count = u64::from(
        r.u16(CHUNK_COUNT_OFFSET, Endian::Big)
            .map_err(|_| RejectReason::OutOfBounds)?,
    );
    if chunk_count == 0 || chunk_count > MAX_CHUNKS {
        return Err(RejectReason::HeaderInvalid);
    }

    let table_len = (chunk_count * 4) as usize;
    let table = r
        .bytes(HEADER_SIZE, table_len)
        .map_err(|_| RejectReason::OutOfBounds)?;

    let mut compressed_total: u64 = 0;
    for entry in table.chunks_exact(4) {
        compressed_total += u64::from(u32::from_be_bytes(entry.try_into().unwrap()));
    }

    let extent = HEADER_SIZE as u64 + table_len as u64 + compressed_total;
    if extent < u64::from(sig.min_size) || extent > u64::from(sig.max_size) {
        return Err(RejectReason::SizeOutOfBounds);
    }

    Ok(ParseResult {
        extent,
        content_type: Some(format!("ddx/fmt{format_tag}")),
        safe_name: None,
        is_compressed: true,
    })
}
