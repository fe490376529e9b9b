//! Reconstructs engine `FormRecord`s by walking the live C++ heap captured
//! in a minidump: the editor-ID hash table, per-kind field tables, and the
//! bounded list/array/string readers those tables lean on.

mod dynamic_array;
mod form;
mod hash_table;
mod kinds;
mod linked_list;
mod strings;

pub use form::FormHeader;
pub use hash_table::{HashTableEntry, HashTableLocation};
pub use kinds::{FieldValue, FormKind, FormRecord};

use crate::dump::{DumpSource, MinidumpIndex};
use crate::error::RuntimeError;
use std::collections::HashMap;

/// Traversal safety limits shared by every bounded reader in this module:
/// no pointer-follow is allowed to run away on circular or corrupted data.
pub const MAX_LINKED_LIST_NODES: usize = 50;
pub const MAX_DYNAMIC_ARRAY_ENTRIES: usize = 4096;
pub const MAX_HASH_CHAIN_STEPS: u64 = 1_000_000;
pub const MAX_HASH_BUCKETS: u32 = 200_000;

/// The `form_type` byte at or above which kind dispatch requires
/// calibration.
const CALIBRATION_THRESHOLD: u8 = 0x45;

/// Reconstructs `FormRecord`s from the heap a [`MinidumpIndex`] indexes.
pub struct RuntimeStructReader<'a> {
    dump: &'a DumpSource,
    minidump: &'a MinidumpIndex,
    info_form_type: Option<u8>,
}

impl<'a> RuntimeStructReader<'a> {
    pub fn new(dump: &'a DumpSource, minidump: &'a MinidumpIndex) -> Self {
        RuntimeStructReader {
            dump,
            minidump,
            info_form_type: None,
        }
    }

    /// Calibrates the `INFO` (dialog topic) `form_type` byte by scanning
    /// hash-table editor-IDs for the substring `"Topic"` and picking the
    /// modal `form_type` byte among their targets.
    pub fn calibrate(&mut self, entries: &[HashTableEntry]) {
        let mut tally: HashMap<u8, u32> = HashMap::new();
        for entry in entries {
            if !entry.editor_id.contains("Topic") {
                continue;
            }
            let Some(offset) = self.minidump.va_to_file_offset(entry.value_va) else {
                continue;
            };
            if let Ok(header) = form::read_header(self.dump, offset) {
                if header.form_type >= CALIBRATION_THRESHOLD {
                    *tally.entry(header.form_type).or_insert(0) += 1;
                }
            }
        }
        self.info_form_type = tally.into_iter().max_by_key(|&(_, count)| count).map(|(ft, _)| ft);
    }

    pub fn calibrated_info_form_type(&self) -> Option<u8> {
        self.info_form_type
    }

    pub fn locate_hash_table(&self) -> Option<HashTableLocation> {
        hash_table::locate(self.dump, self.minidump)
    }

    pub fn walk_hash_table(&self, location: &HashTableLocation) -> Vec<HashTableEntry> {
        hash_table::walk(self.dump, self.minidump, location)
    }

    /// Reconstructs one record at `file_offset`. `Ok(None)` is a plain
    /// rejection (failed header read, unsupported/uncalibrated `form_type`,
    /// or a bounded field read that ran out of window); `Err` is reserved
    /// for the one condition callers want counted rather than silently
    /// dropped — an unresolved `FormRef` pointer.
    pub fn read_record(&self, file_offset: u64) -> Result<Option<FormRecord>, RuntimeError> {
        let header = match form::read_header(self.dump, file_offset) {
            Ok(h) => h,
            Err(RuntimeError::OutOfBounds(_)) => return Ok(None),
            Err(other) => return Err(other),
        };
        let Some(descriptor) = kinds::dispatch(header.form_type, self.info_form_type) else {
            return Ok(None);
        };
        kinds::extract(descriptor, self.dump, self.minidump, file_offset, header.form_id)
    }

    /// End-to-end reconstruction: locate the hash table, calibrate, walk
    /// every entry, and reconstruct its target. Returns the records plus a
    /// count of entries whose target VA never resolved to a file offset
    /// (the `unresolved_target` diagnostic tally).
    pub fn reconstruct_from_hash_table(&mut self) -> (Vec<FormRecord>, u64) {
        let Some(location) = self.locate_hash_table() else {
            return (Vec::new(), 0);
        };
        let entries = self.walk_hash_table(&location);
        self.calibrate(&entries);

        let mut records = Vec::new();
        let mut unresolved = 0u64;

        for entry in &entries {
            match self.minidump.va_to_file_offset(entry.value_va) {
                None => unresolved += 1,
                Some(file_offset) => match self.read_record(file_offset) {
                    Ok(Some(mut record)) => {
                        record.editor_id = Some(entry.editor_id.clone());
                        records.push(record);
                    }
                    Ok(None) => {}
                    Err(RuntimeError::UnresolvedTarget { .. }) => unresolved += 1,
                    Err(_) => {}
                },
            }
        }

        (records, unresolved)
    }
}
