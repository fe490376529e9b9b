//! DDS texture header validation and extent computation.

use super::{ParseResult, RejectReason};
use crate::binary::{BinaryReader, Endian};
use crate::signature::Signature;

const HEADER_TOTAL: usize = 128; // 4-byte magic + 124-byte DDS_HEADER
const FOURCC_OFFSET: usize = 84;
const MIPMAP_COUNT_OFFSET: usize = 28;
const MAX_DIMENSION: u32 = 16384;

pub fn parse(window: &[u8], sig: &Signature) -> Result<ParseResult, RejectReason> {
    if window.len() < HEADER_TOTAL {
        return Err(RejectReason::HeaderInvalid);
    }
    let r = BinaryReader::new(window);

    // Both PC (little-endian) and Xbox (big-endian) headers occur; the one
    // whose declared header size and dimensions are sane wins.
    let (endian, width, height) = [Endian::Little, Endian::Big]
        .into_iter()
        .find_map(|endian| {
            let header_size = r.u32(4, endian).ok()?;
            let height = r.u32(12, endian).ok()?;
            let width = r.u32(16, endian).ok()?;
            let sane = header_size == 124
                && width > 0
                && width <= MAX_DIMENSION
                && height > 0
                && height <= MAX_DIMENSION;
            sane.then_some((endian, width, height))
        })
        .ok_or(RejectReason::HeaderInvalid)?;

    let mip_map_count = r.u32(MIPMAP_COUNT_OFFSET, endian).unwrap_or(1).max(1);
    let fourcc = r
        .bytes(FOURCC_OFFSET, 4)
        .map_err(|_| RejectReason::OutOfBounds)?;

    let bytes_per_pixel = match fourcc {
        b"DXT1" => 0.5,
        b"DXT3" | b"DXT5" | b"BC4U" | b"BC5U" => 1.0,
        _ => 4.0,
    };

    let base_size = f64::from(width) * f64::from(height) * bytes_per_pixel;
    let payload = (base_size * mip_chain_factor(mip_map_count)).round() as u64;
    let extent = HEADER_TOTAL as u64 + payload;

    if extent < u64::from(sig.min_size) || extent > u64::from(sig.max_size) {
        return Err(RejectReason::SizeOutOfBounds);
    }

    Ok(ParseResult {
        extent,
        content_type: Some(String::from_utf8_lossy(fourcc).trim_end().to_string()),
        safe_name: None,
        is_compressed: matches!(fourcc, b"DXT1" | b"DXT3" | b"DXT5" | b"BC4U" | b"BC5U"),
    })
}

/// Sum of `(1/4)^i` for `i` in `0..mip_count`: the classic mip-chain size
/// series, where each successive level is a quarter the byte count.
fn mip_chain_factor(mip_count: u32) -> f64 {
    let mut factor = 0.0;
    let mut scale = 1.0;
    for _ in 0..mip_count.max(1) {
        factor += scale;
        scale *= 0.25;
    }
    factor
}
