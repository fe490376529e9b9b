//! Bounded dynamic array traversal: `{ buffer_ptr, capacity, count, growth }`.
//! Iterates `count` u32 BE elements from `buffer_ptr`, bounded to
//! `MAX_DYNAMIC_ARRAY_ENTRIES` regardless of what `count` claims.

use crate::binary::{BinaryReader, Endian};
use crate::dump::{DumpSource, MinidumpIndex};

use super::MAX_DYNAMIC_ARRAY_ENTRIES;

pub fn read_elements(
    dump: &DumpSource,
    minidump: &MinidumpIndex,
    buffer_va: u64,
    count: u32,
) -> Vec<u32> {
    let bounded = (count as usize).min(MAX_DYNAMIC_ARRAY_ENTRIES);
    let Some(offset) = minidump.va_to_file_offset(buffer_va) else {
        return Vec::new();
    };
    let Ok(bytes) = dump.read_at(offset, bounded as u64 * 4) else {
        return Vec::new();
    };
    let r = BinaryReader::new(bytes);
    (0..bounded)
        .filter_map(|i| r.u32(i * 4, Endian::Big).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::MemoryRegion;

    #[test]
    fn reads_count_elements() {
        let base_va = 0x2000;
        let mut bytes = Vec::new();
        for v in [10u32, 20, 30] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        let dump = DumpSource::from_bytes(bytes.clone());
        let minidump = MinidumpIndex::with_regions(vec![MemoryRegion {
            virtual_address: base_va,
            size: bytes.len() as u64,
            file_offset: 0,
        }]);

        let elements = read_elements(&dump, &minidump, base_va, 3);
        assert_eq!(elements, vec![10, 20, 30]);
    }

    #[test]
    fn bounds_claimed_count_to_safety_limit() {
        let base_va = 0x2000;
        let bytes = vec![0u8; 8];
        let dump = DumpSource::from_bytes(bytes.clone());
        let minidump = MinidumpIndex::with_regions(vec![MemoryRegion {
            virtual_address: base_va,
            size: 1_000_000,
            file_offset: 0,
        }]);

        // Claimed count wildly exceeds both the safety cap and the actual
        // dump size; the read must fail closed rather than over-read.
        let elements = read_elements(&dump, &minidump, base_va, u32::MAX);
        assert!(elements.is_empty());
    }
}
