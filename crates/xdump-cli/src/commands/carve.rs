//! `xdump carve`: the full extraction pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use xdump::carve::{CancellationToken, CarveOptions, CarveOrchestrator};
use xdump::converter::ConverterGateway;
use xdump::dump::{DumpSource, MinidumpIndex};
use xdump::progress::ProgressSink;
use xdump::signature::SignatureRegistry;

use crate::config::Config;
use crate::dispatch::{EXIT_INVALID_INPUT, EXIT_IO_ERROR, EXIT_PARTIAL, EXIT_SUCCESS};

#[allow(clippy::too_many_arguments)]
pub fn run(
    dump_path: &Path,
    output: Option<PathBuf>,
    per_type_cap: Option<usize>,
    workers: Option<usize>,
    convert: bool,
    converter_path: Option<String>,
    config: &Config,
    quiet: bool,
) -> Result<i32> {
    let dump_stem = dump_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dump".to_string());

    let dump = match DumpSource::open(dump_path) {
        Ok(d) => d,
        Err(e) => {
            log::error!("failed to open dump {}: {e}", dump_path.display());
            return Ok(EXIT_IO_ERROR);
        }
    };

    // Indexing a minidump container is only required by the runtime
    // reconstruction path, which `analyze`/`modules` also exercise; a
    // malformed container here is an invalid-input condition, not an I/O one.
    let minidump = match MinidumpIndex::parse(dump.as_slice()) {
        Ok(idx) => idx,
        Err(e) => {
            log::error!("malformed dump container: {e}");
            return Ok(EXIT_INVALID_INPUT);
        }
    };
    if minidump.is_xbox360() {
        log::info!("detected Xbox 360 (PowerPC) minidump, {} module(s)", minidump.modules().len());
    }

    let output_root = output
        .or_else(|| config.output_root.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut options = CarveOptions::new(output_root.clone(), dump_stem.clone());
    if let Some(cap) = per_type_cap.or(config.per_type_cap) {
        options.per_type_cap = cap;
    }
    options.workers = workers.or(config.workers);

    let should_convert = convert || config.convert;
    if should_convert {
        let tool = converter_path.unwrap_or_else(|| "ddxconv".to_string());
        options.converter = Some(Arc::new(ConverterGateway::new(tool, Duration::from_secs(30))));
    }

    let registry = SignatureRegistry::builtin();
    let orchestrator = CarveOrchestrator::new(&registry, options);
    let cancel = CancellationToken::new();

    let sink: Box<dyn ProgressSink> = if quiet {
        Box::new(xdump::progress::NullSink)
    } else {
        Box::new(|fraction: f32| {
            eprint!("\rcarving... {:>5.1}%", fraction * 100.0);
        })
    };

    let run = orchestrator
        .run(&dump, sink.as_ref(), &cancel)
        .context("carve run failed")?;
    if !quiet {
        eprintln!();
    }

    for warning in &run.warnings {
        log::warn!("{warning}");
    }

    let manifest_path = output_root.join(&dump_stem).join("manifest.json");
    let json = xdump::carve::to_json(&run.manifest).context("failed to serialize manifest")?;
    std::fs::write(&manifest_path, json)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    println!(
        "carved {} file(s) into {}",
        run.manifest.len(),
        output_root.join(&dump_stem).display()
    );

    if run.cancelled {
        log::warn!("run was cancelled; manifest reflects partial progress");
        return Ok(EXIT_PARTIAL);
    }
    if run.is_partial() {
        return Ok(EXIT_PARTIAL);
    }
    Ok(EXIT_SUCCESS)
}
