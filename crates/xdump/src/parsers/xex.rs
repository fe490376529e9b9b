//! Xbox 360 executable (XEX2) header: extent is the furthest offset any
//! directory entry references, which bounds the image without reading the
//! embedded (often encrypted) PE payload.

use super::{ParseResult, RejectReason};
use crate::binary::{BinaryReader, Endian};
use crate::signature::Signature;

const DIRECTORY_START: usize = 24;
const MAX_DIRECTORY_ENTRIES: u32 = 4096;

pub fn parse(window: &[u8], sig: &Signature) -> Result<ParseResult, RejectReason> {
    if window.len() < DIRECTORY_START {
        return Err(RejectReason::HeaderInvalid);
    }
    let r = BinaryReader::new(window);

    let header_size = r.u32(8, Endian::Big).map_err(|_| RejectReason::OutOfBounds)?;
    let security_offset = r.u32(16, Endian::Big).map_err(|_| RejectReason::OutOfBounds)?;
    let header_count = r.u32(20, Endian::Big).map_err(|_| RejectReason::OutOfBounds)?;
    if header_count == 0 || header_count > MAX_DIRECTORY_ENTRIES {
        return Err(RejectReason::HeaderInvalid);
    }

    let dir_len = header_count as usize * 8;
    let dir = r
        .bytes(DIRECTORY_START, dir_len)
        .map_err(|_| RejectReason::OutOfBounds)?;

    let mut max_ref = header_size.max(security_offset);
    for entry in dir.chunks_exact(8) {
        let value = u32::from_be_bytes(entry[4..8].try_into().unwrap());
        max_ref = max_ref.max(value);
    }

    let extent = u64::from(max_ref);
    if extent < u64::from(sig.min_size) || extent > u64::from(sig.max_size) {
        return Err(RejectReason::SizeOutOfBounds);
    }

    Ok(ParseResult {
        extent,
        content_type: Some("xex".to_string()),
        safe_name: None,
        is_compressed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ParserKind;

    fn signature() -> Signature {
        Signature {
            id: "xex",
            magic: b"XEX2",
            min_size: 24,
            max_size: 64 * 1024 * 1024,
            parser_kind: ParserKind::Xex,
            output_folder: "executables",
            extension: "xex",
            category: "executable",
            priority: 90,
        }
    }

    fn build(header_size: u32, security_offset: u32, entries: &[(u32, u32)]) -> Vec<u8> {
        let mut buf = vec![0u8; DIRECTORY_START];
        buf[0..4].copy_from_slice(b"XEX2");
        buf[8..12].copy_from_slice(&header_size.to_be_bytes());
        buf[16..20].copy_from_slice(&security_offset.to_be_bytes());
        buf[20..24].copy_from_slice(&(entries.len() as u32).to_be_bytes());
        for (id, value) in entries {
            buf.extend_from_slice(&id.to_be_bytes());
            buf.extend_from_slice(&value.to_be_bytes());
        }
        buf
    }

    #[test]
    fn extent_is_max_directory_reference() {
        let window = build(0x1000, 0x2000, &[(1, 0x3000), (2, 0x1800)]);
        let result = parse(&window, &signature()).unwrap();
        assert_eq!(result.extent, 0x3000);
    }

    #[test]
    fn rejects_zero_directory_entries() {
        let window = build(0x1000, 0x2000, &[]);
        assert_eq!(parse(&window, &signature()), Err(RejectReason::HeaderInvalid));
    }
}
