//! PNG: walk chunks until `IEND`. Extent is the offset of `IEND`'s chunk
//! header plus 12 (its length field, type, and CRC — `IEND` always carries
//! zero data bytes).

use super::{ParseResult, RejectReason};
use crate::binary::{BinaryReader, Endian};
use crate::signature::Signature;

const SIGNATURE_LEN: usize = 8;
const MAX_CHUNKS: usize = 100_000;

pub fn parse(window: &[u8], sig: &Signature) -> Result<ParseResult, RejectReason> {
    if window.len() < SIGNATURE_LEN + 12 {
        return Err(RejectReason::HeaderInvalid);
    }
    let r = BinaryReader::new(window);

    let mut cursor = SIGNATURE_LEN;
    for _ in 0..MAX_CHUNKS {
        let length = r
            .u32(cursor, Endian::Big)
            .map_err(|_| RejectReason::OutOfBounds)? as usize;
        let chunk_type = r
            .bytes(cursor + 4, 4)
            .map_err(|_| RejectReason::OutOfBounds)?;

        if chunk_type == b"IEND" {
            let extent = (cursor + 12) as u64;
            if extent < u64::from(sig.min_size) || extent > u64::from(sig.max_size) {
                return Err(RejectReason::SizeOutOfBounds);
            }
            return Ok(ParseResult {
                extent,
                content_type: Some("png".to_string()),
                safe_name: None,
                is_compressed: false,
            });
        }

        cursor = cursor
            .checked_add(12 + length)
            .ok_or(RejectReason::OutOfBounds)?;
    }

    Err(RejectReason::HeaderInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ParserKind;

    fn signature() -> Signature {
        Signature {
            id: "png",
            magic: b"\x89PNG\r\n\x1a\n",
            min_size: 45,
            max_size: 32 * 1024 * 1024,
            parser_kind: ParserKind::Png,
            output_folder: "images",
            extension: "png",
            category: "image",
            priority: 70,
        }
    }

    fn chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(chunk_type);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0u8; 4]); // crc, unchecked
        out
    }

    fn minimal_png() -> Vec<u8> {
        let mut buf = b"\x89PNG\r\n\x1a\n".to_vec();
        buf.extend(chunk(b"IHDR", &[0u8; 13]));
        buf.extend(chunk(b"IDAT", &[1, 2, 3, 4]));
        buf.extend(chunk(b"IEND", &[]));
        buf
    }

    #[test]
    fn extent_stops_at_iend() {
        let data = minimal_png();
        let iend_start = data.len() - 12;
        let result = parse(&data, &signature()).unwrap();
        assert_eq!(result.extent, (iend_start + 12) as u64);
        assert_eq!(result.extent, data.len() as u64);
    }

    #[test]
    fn missing_iend_is_rejected() {
        let mut buf = b"\x89PNG\r\n\x1a\n".to_vec();
        buf.extend(chunk(b"IHDR", &[0u8; 13]));
        assert_eq!(parse(&buf, &signature()), Err(RejectReason::OutOfBounds));
    }
}
