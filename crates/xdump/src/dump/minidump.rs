//! Windows Minidump (MDMP) container parsing.
//!
//! Only the three streams the extraction pipeline actually needs are
//! parsed: System Info (processor architecture), Module List (diagnostics
//! + architecture gating), and Memory64 List (the VA↔file-offset mapping
//! every other component depends on). Everything else in the container is
//! ignored.

use crate::binary::{BinaryReader, Endian};
use crate::dump::region::{MemoryRegion, Module};
use crate::error::MinidumpError;

const MDMP_MAGIC: u32 = 0x504D_444D; // "MDMP", little-endian

const STREAM_MODULE_LIST: u32 = 4;
const STREAM_SYSTEM_INFO: u32 = 7;
const STREAM_MEMORY64_LIST: u32 = 9;

/// Windows `PROCESSOR_ARCHITECTURE_PPC`. A dump reporting this value is a
/// PowerPC (Xbox 360) capture.
pub const PROCESSOR_ARCHITECTURE_PPC: u16 = 3;

const MAX_STREAM_COUNT: usize = 100;
const MAX_MODULE_COUNT: usize = 1000;
const MAX_REGION_COUNT: usize = 10_000;

const MODULE_RECORD_SIZE: usize = 108;

/// Parsed view over an MDMP container's streams. A non-minidump (flat)
/// dump produces an empty index with no VA mapping and
/// `processor_architecture: None`.
#[derive(Debug, Clone, Default)]
pub struct MinidumpIndex {
    regions: Vec<MemoryRegion>,
    modules: Vec<Module>,
    processor_architecture: Option<u16>,
}

impl MinidumpIndex {
    /// An index for a flat (non-minidump) dump: no region mapping at all.
    pub fn empty() -> Self {
        MinidumpIndex::default()
    }

    /// Builds an index directly from a region list, bypassing container
    /// parsing. Used by tests elsewhere in the crate that need a VA↔offset
    /// mapping without constructing a full synthetic MDMP buffer.
    pub fn with_regions(regions: Vec<MemoryRegion>) -> Self {
        MinidumpIndex {
            regions,
            modules: Vec::new(),
            processor_architecture: None,
        }
    }

    /// Detects the `MDMP` magic at offset 0 and, if present, parses the
    /// stream directory and the System Info / Module List / Memory64 List
    /// streams. Returns `Ok(MinidumpIndex::empty())` for non-minidump input.
    pub fn parse(data: &[u8]) -> Result<Self, MinidumpError> {
        if data.len() < 4 || BinaryReader::new(data).u32(0, Endian::Little).unwrap() != MDMP_MAGIC
        {
            return Ok(MinidumpIndex::empty());
        }

        let r = BinaryReader::new(data);
        if data.len() < 32 {
            return Err(MinidumpError::MalformedContainer(
                "header shorter than 32 bytes".into(),
            ));
        }

        let num_streams = r
            .u32(0x08, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(e.to_string()))? as usize;
        let stream_dir_rva = r
            .u32(0x0C, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(e.to_string()))? as usize;

        if num_streams == 0 || num_streams > MAX_STREAM_COUNT {
            return Err(MinidumpError::MalformedContainer(format!(
                "stream count {num_streams} outside [1, {MAX_STREAM_COUNT}]"
            )));
        }

        let mut processor_architecture = None;
        let mut modules = Vec::new();
        let mut regions = Vec::new();

        for i in 0..num_streams {
            let entry_offset = stream_dir_rva + i * 12;
            let stream_type = r
                .u32(entry_offset, Endian::Little)
                .map_err(|e| MinidumpError::MalformedContainer(e.to_string()))?;
            let data_size = r
                .u32(entry_offset + 4, Endian::Little)
                .map_err(|e| MinidumpError::MalformedContainer(e.to_string()))?
                as usize;
            let rva = r
                .u32(entry_offset + 8, Endian::Little)
                .map_err(|e| MinidumpError::MalformedContainer(e.to_string()))?
                as usize;

            match stream_type {
                STREAM_SYSTEM_INFO => {
                    processor_architecture = Some(parse_system_info(&r, rva)?);
                }
                STREAM_MODULE_LIST => {
                    modules = parse_module_list(&r, rva, data_size)?;
                }
                STREAM_MEMORY64_LIST => {
                    regions = parse_memory64_list(&r, rva, data_size)?;
                }
                _ => {}
            }
        }

        Ok(MinidumpIndex {
            regions,
            modules,
            processor_architecture,
        })
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Linear search over regions. A production-scale index would use an
    /// interval tree; for a few thousand regions this is fast enough and
    /// keeps the mapping trivially correct.
    pub fn va_to_file_offset(&self, va: u64) -> Option<u64> {
        self.regions
            .iter()
            .find(|r| r.contains_va(va))
            .map(|r| r.file_offset + (va - r.virtual_address))
    }

    pub fn file_offset_to_va(&self, offset: u64) -> Option<u64> {
        self.regions
            .iter()
            .find(|r| r.contains_offset(offset))
            .map(|r| r.virtual_address + (offset - r.file_offset))
    }

    pub fn module_for_va(&self, va: u64) -> Option<&Module> {
        self.modules.iter().find(|m| m.contains_va(va))
    }

    pub fn module_for_offset(&self, offset: u64) -> Option<&Module> {
        let va = self.file_offset_to_va(offset)?;
        self.module_for_va(va)
    }

    /// `true` iff the dump's reported processor architecture is PowerPC.
    /// Non-minidump dumps (no System Info stream) are never Xbox 360.
    pub fn is_xbox360(&self) -> bool {
        self.processor_architecture == Some(PROCESSOR_ARCHITECTURE_PPC)
    }

    pub fn processor_architecture(&self) -> Option<u16> {
        self.processor_architecture
    }
}

fn parse_system_info(r: &BinaryReader<'_>, rva: usize) -> Result<u16, MinidumpError> {
    r.u16(rva, Endian::Little)
        .map_err(|e| MinidumpError::MalformedContainer(format!("SystemInfo stream: {e}")))
}

fn parse_module_list(
    r: &BinaryReader<'_>,
    rva: usize,
    data_size: usize,
) -> Result<Vec<Module>, MinidumpError> {
    let count = r
        .u32(rva, Endian::Little)
        .map_err(|e| MinidumpError::MalformedContainer(format!("ModuleList count: {e}")))?
        as usize;

    if count > MAX_MODULE_COUNT {
        return Err(MinidumpError::MalformedContainer(format!(
            "module count {count} exceeds {MAX_MODULE_COUNT}"
        )));
    }
    if 4 + count * MODULE_RECORD_SIZE > data_size {
        return Err(MinidumpError::MalformedContainer(
            "ModuleList stream truncated".into(),
        ));
    }

    let mut modules = Vec::with_capacity(count);
    for i in 0..count {
        let base = rva + 4 + i * MODULE_RECORD_SIZE;
        let base_va = r
            .u64(base, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(format!("module base_va: {e}")))?;
        let size = r
            .u32(base + 8, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(format!("module size: {e}")))?
            as u64;
        let checksum = r
            .u32(base + 12, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(format!("module checksum: {e}")))?;
        let timestamp = r
            .u32(base + 16, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(format!("module timestamp: {e}")))?;
        let name_rva = r
            .u32(base + 20, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(format!("module name rva: {e}")))?
            as usize;

        let name = parse_minidump_string(r, name_rva)?;

        modules.push(Module {
            name,
            base_va,
            size,
            checksum,
            timestamp,
        });
    }

    Ok(modules)
}

/// A `MINIDUMP_STRING`: a 4-byte length prefix (bytes, not chars) followed
/// by a UTF-16LE buffer.
fn parse_minidump_string(r: &BinaryReader<'_>, rva: usize) -> Result<String, MinidumpError> {
    let byte_len = r
        .u32(rva, Endian::Little)
        .map_err(|e| MinidumpError::MalformedContainer(format!("module name length: {e}")))?
        as usize;
    let raw = r
        .bytes(rva + 4, byte_len)
        .map_err(|e| MinidumpError::MalformedContainer(format!("module name bytes: {e}")))?;

    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

fn parse_memory64_list(
    r: &BinaryReader<'_>,
    rva: usize,
    data_size: usize,
) -> Result<Vec<MemoryRegion>, MinidumpError> {
    let count = r
        .u64(rva, Endian::Little)
        .map_err(|e| MinidumpError::MalformedContainer(format!("Memory64List count: {e}")))?
        as usize;
    let base_rva = r
        .u64(rva + 8, Endian::Little)
        .map_err(|e| MinidumpError::MalformedContainer(format!("Memory64List base rva: {e}")))?;

    if count > MAX_REGION_COUNT {
        return Err(MinidumpError::MalformedContainer(format!(
            "region count {count} exceeds {MAX_REGION_COUNT}"
        )));
    }
    if 16 + count * 16 > data_size {
        return Err(MinidumpError::MalformedContainer(
            "Memory64List stream truncated".into(),
        ));
    }

    let mut regions = Vec::with_capacity(count);
    let mut running_offset = base_rva;
    for i in 0..count {
        let desc = rva + 16 + i * 16;
        let start_va = r
            .u64(desc, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(format!("region start_va: {e}")))?;
        let size = r
            .u64(desc + 8, Endian::Little)
            .map_err(|e| MinidumpError::MalformedContainer(format!("region size: {e}")))?;

        regions.push(MemoryRegion {
            virtual_address: start_va,
            size,
            file_offset: running_offset,
        });
        running_offset += size;
    }

    Ok(regions)
}
