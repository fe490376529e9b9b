//! Shared parser for formats whose only carving rule is "read an explicit
//! size field from the header and clamp it" (LIP/SCDA/XDBF/XUI/ESP).

use super::{ParseResult, RejectReason};
use crate::binary::{BinaryReader, Endian};
use crate::signature::{Signature, SimpleHeaderLayout, SizeFieldWidth};

pub fn parse(
    window: &[u8],
    sig: &Signature,
    layout: SimpleHeaderLayout,
) -> Result<ParseResult, RejectReason> {
    let r = BinaryReader::new(window);

    let raw_size = match layout.size_field_width {
        SizeFieldWidth::U16 => r
            .u16(layout.size_field_offset, Endian::Big)
            .map(u64::from),
        SizeFieldWidth::U32 => r
            .u32(layout.size_field_offset, Endian::Big)
            .map(u64::from),
    }
    .map_err(|_| RejectReason::OutOfBounds)?;

    let extent = if layout.size_includes_header {
        raw_size
    } else {
        raw_size + u64::from(layout.header_size)
    };

    if extent < u64::from(sig.min_size) || extent > u64::from(sig.max_size) {
        return Err(RejectReason::SizeOutOfBounds);
    }

    Ok(ParseResult {
        extent,
        content_type: None,
        safe_name: None,
        is_compressed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ParserKind;

    fn esp_signature() -> Signature {
        Signature {
            id: "esp",
            magic: b"TES4",
            min_size: 24,
            max_size: 256 * 1024 * 1024,
            parser_kind: ParserKind::SimpleHeader(SimpleHeaderLayout {
                size_field_offset: 4,
                size_field_width: SizeFieldWidth::U32,
                size_includes_header: true,
                header_size: 24,
            }),
            output_folder: "plugins",
            extension: "esp",
            category: "plugin",
            priority: 80,
        }
    }

    #[test]
    fn size_field_taken_as_total_when_includes_header() {
        let mut window = vec![0u8; 24];
        window[0..4].copy_from_slice(b"TES4");
        window[4..8].copy_from_slice(&2048u32.to_be_bytes());
        let sig = esp_signature();
        let ParserKind::SimpleHeader(layout) = sig.parser_kind else {
            unreachable!()
        };
        let result = parse(&window, &sig, layout).unwrap();
        assert_eq!(result.extent, 2048);
    }

    #[test]
    fn size_field_is_extended_by_fixed_header_when_not_inclusive() {
        let layout = SimpleHeaderLayout {
            size_field_offset: 8,
            size_field_width: SizeFieldWidth::U32,
            size_includes_header: false,
            header_size: 16,
        };
        let sig = Signature {
            id: "lip",
            magic: b"LIP ",
            min_size: 16,
            max_size: 1024 * 1024,
            parser_kind: ParserKind::SimpleHeader(layout),
            output_folder: "lipsync",
            extension: "lip",
            category: "lipsync",
            priority: 40,
        };
        let mut window = vec![0u8; 16];
        window[0..4].copy_from_slice(b"LIP ");
        window[8..12].copy_from_slice(&500u32.to_be_bytes());
        let result = parse(&window, &sig, layout).unwrap();
        assert_eq!(result.extent, 516);
    }

    #[test]
    fn out_of_registry_bounds_is_rejected() {
        let mut window = vec![0u8; 24];
        window[0..4].copy_from_slice(b"TES4");
        window[4..8].copy_from_slice(&4u32.to_be_bytes());
        let sig = esp_signature();
        let ParserKind::SimpleHeader(layout) = sig.parser_kind else {
            unreachable!()
        };
        assert_eq!(parse(&window, &sig, layout), Err(RejectReason::SizeOutOfBounds));
    }
}
