//! `xdump modules`: list the minidump's Module List stream.

use std::path::Path;

use anyhow::{Context, Result};
use xdump::dump::{DumpSource, MinidumpIndex};

use crate::dispatch::{EXIT_INVALID_INPUT, EXIT_SUCCESS};

pub fn run(dump_path: &Path) -> Result<i32> {
    let dump = DumpSource::open(dump_path)
        .with_context(|| format!("failed to open {}", dump_path.display()))?;

    let minidump = match MinidumpIndex::parse(dump.as_slice()) {
        Ok(idx) => idx,
        Err(e) => {
            log::error!("malformed dump container: {e}");
            return Ok(EXIT_INVALID_INPUT);
        }
    };

    if minidump.modules().is_empty() {
        log::error!("{} is not a minidump with a Module List stream", dump_path.display());
        return Ok(EXIT_INVALID_INPUT);
    }

    for module in minidump.modules() {
        println!(
            "{:<32} base={:#018x} size={:#x} checksum={:#010x} timestamp={}",
            module.name, module.base_va, module.size, module.checksum, module.timestamp
        );
    }

    Ok(EXIT_SUCCESS)
}
