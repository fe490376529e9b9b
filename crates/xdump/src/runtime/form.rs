//! The stable header every engine form begins with.

use crate::binary::{BinaryReader, Endian};
use crate::dump::DumpSource;
use crate::error::RuntimeError;

const FORM_TYPE_OFFSET: usize = 8;
const FORM_ID_OFFSET: usize = 12;
const HEADER_WINDOW: u64 = 16;

/// `form_type` at +8 (one byte), `form_id` at +12 (big-endian u32) — stable
/// across every form kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormHeader {
    pub form_type: u8,
    pub form_id: u32,
}

pub fn read_header(dump: &DumpSource, file_offset: u64) -> Result<FormHeader, RuntimeError> {
    let bytes = dump.read_at(file_offset, HEADER_WINDOW)?;
    let r = BinaryReader::new(bytes);
    Ok(FormHeader {
        form_type: r.u8(FORM_TYPE_OFFSET)?,
        form_id: r.u32(FORM_ID_OFFSET, Endian::Big)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_type_and_id() {
        let mut buf = vec![0u8; 16];
        buf[FORM_TYPE_OFFSET] = 0x28;
        buf[FORM_ID_OFFSET..FORM_ID_OFFSET + 4].copy_from_slice(&0x0001_0001u32.to_be_bytes());
        let dump = DumpSource::from_bytes(buf);
        let header = read_header(&dump, 0).unwrap();
        assert_eq!(header.form_type, 0x28);
        assert_eq!(header.form_id, 0x0001_0001);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let dump = DumpSource::from_bytes(vec![0u8; 4]);
        assert!(read_header(&dump, 0).is_err());
    }
}
