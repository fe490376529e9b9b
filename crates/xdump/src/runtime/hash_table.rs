//! Locates and walks the engine's global editor-ID → form hash table.
//!
//! The table is found by pattern, not by a fixed address: a run of three
//! pointer-sized words `(vptr, bucket_array_ptr, entry_count)` where
//! `entry_count` falls in a plausible, non-power-of-two range and
//! `bucket_array_ptr` resolves to a region big enough to hold that many
//! bucket pointers.

use crate::binary::{BinaryReader, Endian};
use crate::dump::{DumpSource, MinidumpIndex};

use super::{MAX_HASH_BUCKETS, MAX_HASH_CHAIN_STEPS};

const POINTER_SIZE: u64 = 4;
const ENTRY_COUNT_MIN: u32 = 1024;
const ENTRY_COUNT_MAX: u32 = 200_000;
const SCAN_STRIDE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashTableLocation {
    pub bucket_array_va: u64,
    pub entry_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTableEntry {
    pub editor_id: String,
    pub value_va: u64,
}

fn is_plausible_entry_count(n: u32) -> bool {
    (ENTRY_COUNT_MIN..=ENTRY_COUNT_MAX).contains(&n) && !n.is_power_of_two()
}

/// Scans every memory region for the `(vptr, bucket_array_ptr,
/// entry_count)` triple. Returns the first plausible match.
pub fn locate(dump: &DumpSource, minidump: &MinidumpIndex) -> Option<HashTableLocation> {
    for region in minidump.regions() {
        let bytes = dump.read_at(region.file_offset, region.size).ok()?;
        let r = BinaryReader::new(bytes);

        let mut offset = 0usize;
        while offset + 12 <= bytes.len() {
            if let Ok(entry_count) = r.u32(offset + 8, Endian::Big) {
                if is_plausible_entry_count(entry_count) {
                    if let Ok(bucket_ptr) = r.u32(offset + 4, Endian::Big) {
                        let bucket_va = u64::from(bucket_ptr);
                        let needed_bytes = u64::from(entry_count) * POINTER_SIZE;
                        if region_covers(minidump, bucket_va, needed_bytes) {
                            return Some(HashTableLocation {
                                bucket_array_va: bucket_va,
                                entry_count,
                            });
                        }
                    }
                }
            }
            offset += SCAN_STRIDE;
        }
    }
    None
}

fn region_covers(minidump: &MinidumpIndex, va: u64, len: u64) -> bool {
    let Some(offset) = minidump.va_to_file_offset(va) else {
        return false;
    };
    let Some(end_va) = va.checked_add(len.saturating_sub(1)) else {
        return false;
    };
    minidump
        .va_to_file_offset(end_va)
        .is_some_and(|end_offset| end_offset >= offset)
}

/// Walks every bucket's chain of `{ next_ptr, key_ptr, value_ptr }` entries,
/// each 12 bytes, bounded to `MAX_HASH_CHAIN_STEPS` total steps across all
/// buckets and 50 nodes per chain (the same cap [`super::linked_list`]
/// uses) to protect against circular or corrupted data.
pub fn walk(
    dump: &DumpSource,
    minidump: &MinidumpIndex,
    location: &HashTableLocation,
) -> Vec<HashTableEntry> {
    let mut out = Vec::new();
    let mut steps: u64 = 0;
    let bucket_count = location.entry_count.min(MAX_HASH_BUCKETS);

    'buckets: for bucket_index in 0..bucket_count {
        if steps >= MAX_HASH_CHAIN_STEPS {
            break;
        }
        let bucket_va = location.bucket_array_va + u64::from(bucket_index) * POINTER_SIZE;
        let Some(mut node_va) = read_ptr(dump, minidump, bucket_va) else {
            continue;
        };

        let mut chain_len = 0;
        while node_va != 0 && chain_len < super::MAX_LINKED_LIST_NODES {
            if steps >= MAX_HASH_CHAIN_STEPS {
                break 'buckets;
            }
            steps += 1;
            chain_len += 1;

            let Some(offset) = minidump.va_to_file_offset(node_va) else {
                break;
            };
            let Ok(bytes) = dump.read_at(offset, 12) else {
                break;
            };
            let r = BinaryReader::new(bytes);
            let next_ptr = u64::from(r.u32(0, Endian::Big).unwrap_or(0));
            let key_ptr = u64::from(r.u32(4, Endian::Big).unwrap_or(0));
            let value_ptr = u64::from(r.u32(8, Endian::Big).unwrap_or(0));

            if let Some(editor_id) = read_cstring(dump, minidump, key_ptr) {
                out.push(HashTableEntry {
                    editor_id,
                    value_va: value_ptr,
                });
            }

            node_va = next_ptr;
        }
    }

    out
}

fn read_ptr(dump: &DumpSource, minidump: &MinidumpIndex, va: u64) -> Option<u64> {
    let offset = minidump.va_to_file_offset(va)?;
    let bytes = dump.read_at(offset, 4).ok()?;
    BinaryReader::new(bytes).u32(0, Endian::Big).ok().map(u64::from)
}

const MAX_EDITOR_ID_LEN: u64 = 256;

fn read_cstring(dump: &DumpSource, minidump: &MinidumpIndex, va: u64) -> Option<String> {
    if va == 0 {
        return None;
    }
    let offset = minidump.va_to_file_offset(va)?;
    let bytes = dump.read_at(offset, MAX_EDITOR_ID_LEN).ok()?;
    let end = bytes.iter().position(|&b| b == 0)?;
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::MemoryRegion;

    #[test]
    fn implausible_entry_counts_are_rejected() {
        assert!(!is_plausible_entry_count(1024)); // power of two
        assert!(!is_plausible_entry_count(100));
        assert!(is_plausible_entry_count(1025));
    }

    #[test]
    fn walk_finds_two_weapon_targets() {
        // Layout: header triple at VA 0x1000, bucket array of 1025 entries
        // right after, two chains of one entry each pointing at editor-id
        // strings and form targets.
        let header_va = 0x1000u64;
        let bucket_count: u32 = 1025;
        let bucket_array_va = header_va + 12;
        let bucket_array_bytes = u64::from(bucket_count) * POINTER_SIZE;
        let entries_va = bucket_array_va + bucket_array_bytes;

        let name_a_va = entries_va + 100;
        let name_b_va = name_a_va + 32;
        let entry_a_va = name_b_va + 32;
        let entry_b_va = entry_a_va + 12;

        let mut buf = vec![0u8; (entry_b_va - header_va + 12) as usize];
        let put_u32 = |buf: &mut Vec<u8>, at: u64, v: u32| {
            let i = (at - header_va) as usize;
            buf[i..i + 4].copy_from_slice(&v.to_be_bytes());
        };

        // header triple: vptr (ignored), bucket_array_ptr, entry_count
        put_u32(&mut buf, header_va + 4, bucket_array_va as u32);
        put_u32(&mut buf, header_va + 8, bucket_count);

        // bucket 0 -> entry_a, bucket 1 -> entry_b, rest null
        put_u32(&mut buf, bucket_array_va, entry_a_va as u32);
        put_u32(&mut buf, bucket_array_va + 4, entry_b_va as u32);

        // editor-id strings
        let name_a_idx = (name_a_va - header_va) as usize;
        buf[name_a_idx..name_a_idx + 10].copy_from_slice(b"Weapon10mm");
        let name_b_idx = (name_b_va - header_va) as usize;
        buf[name_b_idx..name_b_idx + 4].copy_from_slice(b"Nuka");

        // hash entries: { next_ptr, key_ptr, value_ptr }
        put_u32(&mut buf, entry_a_va, 0);
        put_u32(&mut buf, entry_a_va + 4, name_a_va as u32);
        put_u32(&mut buf, entry_a_va + 8, 0x6000_1000);

        put_u32(&mut buf, entry_b_va, 0);
        put_u32(&mut buf, entry_b_va + 4, name_b_va as u32);
        put_u32(&mut buf, entry_b_va + 8, 0x6000_2000);

        let dump = DumpSource::from_bytes(buf.clone());
        let minidump = MinidumpIndex::with_regions(vec![MemoryRegion {
            virtual_address: header_va,
            size: buf.len() as u64,
            file_offset: 0,
        }]);

        let location = locate(&dump, &minidump).expect("hash table located");
        assert_eq!(location.bucket_array_va, bucket_array_va);
        assert_eq!(location.entry_count, bucket_count);

        let entries = walk(&dump, &minidump, &location);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.editor_id == "Weapon10mm" && e.value_va == 0x6000_1000));
        assert!(entries.iter().any(|e| e.editor_id == "Nuka" && e.value_va == 0x6000_2000));
    }
}
