//! Bounded singly-linked list traversal: `{ head_ptr }`, nodes
//! `{ payload: u32 BE, next_ptr: u32 BE }`.

use crate::binary::{BinaryReader, Endian};
use crate::dump::{DumpSource, MinidumpIndex};

use super::MAX_LINKED_LIST_NODES;

/// Walks the list starting at `head_va`, stopping at a null pointer, an
/// unresolved VA, or after `MAX_LINKED_LIST_NODES` — whichever comes first.
/// Tolerates corrupted tails by simply stopping rather than erroring.
pub fn walk(dump: &DumpSource, minidump: &MinidumpIndex, head_va: u64) -> Vec<u32> {
    let mut out = Vec::new();
    let mut node_va = head_va;

    for _ in 0..MAX_LINKED_LIST_NODES {
        if node_va == 0 {
            break;
        }
        let Some(offset) = minidump.va_to_file_offset(node_va) else {
            break;
        };
        let Ok(bytes) = dump.read_at(offset, 8) else {
            break;
        };
        let r = BinaryReader::new(bytes);
        let payload = r.u32(0, Endian::Big).unwrap_or(0);
        let next_ptr = u64::from(r.u32(4, Endian::Big).unwrap_or(0));
        out.push(payload);
        node_va = next_ptr;
    }

    out
}
