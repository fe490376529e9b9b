//! Variable-length engine string reader.
//!
//! An engine string is a small fixed descriptor `{ data_ptr: u32 BE,
//! length: u16 BE, capacity: u16 BE }` pointing at its character data.

use crate::binary::{BinaryReader, Endian};
use crate::dump::{DumpSource, MinidumpIndex};

const DESCRIPTOR_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineString {
    pub data_ptr: u32,
    pub length: u16,
    pub capacity: u16,
}

pub fn read_descriptor(dump: &DumpSource, file_offset: u64) -> Option<EngineString> {
    let bytes = dump.read_at(file_offset, DESCRIPTOR_SIZE).ok()?;
    let r = BinaryReader::new(bytes);
    Some(EngineString {
        data_ptr: r.u32(0, Endian::Big).ok()?,
        length: r.u16(4, Endian::Big).ok()?,
        capacity: r.u16(6, Endian::Big).ok()?,
    })
}

/// Resolves `data_ptr` via the minidump index and reads up to `length`
/// bytes, stopping at the first NUL.
pub fn read_value(
    dump: &DumpSource,
    minidump: &MinidumpIndex,
    descriptor: &EngineString,
) -> Option<String> {
    if descriptor.data_ptr == 0 || descriptor.length == 0 {
        return None;
    }
    let offset = minidump.va_to_file_offset(u64::from(descriptor.data_ptr))?;
    let bytes = dump.read_at(offset, u64::from(descriptor.length)).ok()?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::MemoryRegion;

    #[test]
    fn reads_descriptor_and_resolves_value() {
        let data_va = 0x5000;
        let mut buf = Vec::new();
        buf.extend_from_slice(&(data_va as u32).to_be_bytes());
        buf.extend_from_slice(&5u16.to_be_bytes());
        buf.extend_from_slice(&8u16.to_be_bytes());
        let descriptor_len = buf.len() as u64;
        buf.extend_from_slice(b"hello\0\0\0");

        let dump = DumpSource::from_bytes(buf);
        let minidump = MinidumpIndex::with_regions(vec![MemoryRegion {
            virtual_address: data_va,
            size: 8,
            file_offset: descriptor_len,
        }]);

        let descriptor = read_descriptor(&dump, 0).unwrap();
        assert_eq!(descriptor.length, 5);
        let value = read_value(&dump, &minidump, &descriptor).unwrap();
        assert_eq!(value, "hello");
    }

    #[test]
    fn null_data_ptr_yields_no_value() {
        let descriptor = EngineString {
            data_ptr: 0,
            length: 5,
            capacity: 8,
        };
        let dump = DumpSource::from_bytes(vec![0u8; 16]);
        let minidump = MinidumpIndex::with_regions(vec![]);
        assert!(read_value(&dump, &minidump, &descriptor).is_none());
    }
}
