//! XMA audio: a RIFF container whose total size is given directly by the
//! chunk-size field.

use super::{ParseResult, RejectReason};
use crate::binary::{BinaryReader, Endian};
use crate::signature::Signature;

pub fn parse(window: &[u8], sig: &Signature) -> Result<ParseResult, RejectReason> {
    if window.len() < 12 {
        return Err(RejectReason::HeaderInvalid);
    }
    let r = BinaryReader::new(window);

    let form_type = r.bytes(8, 4).map_err(|_| RejectReason::OutOfBounds)?;
    if form_type != b"WAVE" && form_type != b"XWMA" {
        return Err(RejectReason::HeaderInvalid);
    }

    let chunk_size = r
        .u32(4, Endian::Little)
        .map_err(|_| RejectReason::OutOfBounds)?;
    let extent = u64::from(chunk_size) + 8;

    if extent < u64::from(sig.min_size) || extent > u64::from(sig.max_size) {
        return Err(RejectReason::SizeOutOfBounds);
    }

    Ok(ParseResult {
        extent,
        content_type: Some("xma".to_string()),
        safe_name: None,
        is_compressed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ParserKind;

    fn signature() -> Signature {
        Signature {
            id: "xma",
            magic: b"RIFF",
            min_size: 44,
            max_size: 32 * 1024 * 1024,
            parser_kind: ParserKind::Xma,
            output_folder: "audio",
            extension: "xma",
            category: "audio",
            priority: 20,
        }
    }

    #[test]
    fn extent_is_chunk_size_plus_eight() {
        let mut window = vec![0u8; 16];
        window[0..4].copy_from_slice(b"RIFF");
        window[4..8].copy_from_slice(&100u32.to_le_bytes());
        window[8..12].copy_from_slice(b"WAVE");
        let result = parse(&window, &signature()).unwrap();
        assert_eq!(result.extent, 108);
    }

    #[test]
    fn rejects_non_wave_riff() {
        let mut window = vec![0u8; 16];
        window[0..4].copy_from_slice(b"RIFF");
        window[8..12].copy_from_slice(b"AVI ");
        assert_eq!(parse(&window, &signature()), Err(RejectReason::HeaderInvalid));
    }
}
