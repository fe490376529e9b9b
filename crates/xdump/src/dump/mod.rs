//! Dump ingestion: random-access byte source plus optional minidump
//! container indexing.

mod minidump;
mod region;
mod source;

pub use minidump::{MinidumpIndex, PROCESSOR_ARCHITECTURE_PPC};
pub use region::{MemoryRegion, Module};
pub use source::{ChunkWindows, DumpSource, Window};
