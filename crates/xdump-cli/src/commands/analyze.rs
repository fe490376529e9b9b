//! `xdump analyze`: summarise a dump's structure without extracting files.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use xdump::dump::{DumpSource, MinidumpIndex};
use xdump::signature::{SignatureRegistry, SignatureScanner};

use crate::dispatch::{EXIT_INVALID_INPUT, EXIT_SUCCESS};

const ANALYZE_CHUNK_SIZE: usize = 4 * 1024 * 1024;

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

    println!("dump: {}", dump_path.display());
    println!("size: {} bytes", dump.len());
    if minidump.regions().is_empty() {
        println!("container: flat image (no MDMP header)");
    } else {
        println!("container: MDMP");
        println!("architecture: {:?}", minidump.processor_architecture());
        println!("xbox360: {}", minidump.is_xbox360());
        println!("regions: {}", minidump.regions().len());
        println!("modules: {}", minidump.modules().len());
    }

    let registry = SignatureRegistry::builtin();
    let scanner = SignatureScanner::build(&registry);
    let candidates = scanner.scan(&dump, ANALYZE_CHUNK_SIZE, |_fraction| {});

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for candidate in &candidates {
        *counts.entry(registry.by_id(&candidate.signature_id).map(|s| s.id).unwrap_or("?")).or_insert(0) += 1;
    }

    println!("candidate signatures found:");
    for (id, count) in &counts {
        println!("  {id:<10} {count}");
    }
    println!("total candidates: {}", candidates.len());

    Ok(EXIT_SUCCESS)
}
