//! `CarveOrchestrator`: scan, dedup and cap, parse, resolve overlaps,
//! write and convert, then sort the manifest once at the end.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use crate::carve::interval_set::IntervalSet;
use crate::carve::manifest::{CarveEntry, ManifestSink};
use crate::converter::{ConversionKind, ConverterGateway};
use crate::dump::DumpSource;
use crate::error::CarveError;
use crate::parsers::{self, ParseResult};
use crate::progress::ProgressSink;
use crate::signature::{Signature, SignatureRegistry, SignatureScanner};

/// Cooperative cancellation, checked between scanner windows, before each
/// worker dispatch, and before each per-file write.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tunables for a single carve run: a 10 000-per-type cap and a 64 KiB
/// header window cap by default.
#[derive(Clone)]
pub struct CarveOptions {
    pub output_root: PathBuf,
    pub dump_stem: String,
    pub per_type_cap: usize,
    pub chunk_size: usize,
    pub workers: Option<usize>,
    pub converter: Option<Arc<ConverterGateway>>,
}

impl CarveOptions {
    pub fn new(output_root: impl Into<PathBuf>, dump_stem: impl Into<String>) -> Self {
        CarveOptions {
            output_root: output_root.into(),
            dump_stem: dump_stem.into(),
            per_type_cap: 10_000,
            chunk_size: 4 * 1024 * 1024,
            workers: None,
            converter: None,
        }
    }
}

const MAX_HEADER_WINDOW: u64 = 64 * 1024;

/// Result of one complete carve run.
pub struct CarveRun {
    pub manifest: Vec<CarveEntry>,
    /// Non-fatal per-candidate diagnostics (write failures, conversion
    /// failures) — present in the output even on an otherwise successful run.
    pub warnings: Vec<String>,
    pub cancelled: bool,
}

impl CarveRun {
    /// `true` when the run completed but at least one non-fatal diagnostic
    /// occurred — the CLI maps this to exit code 3.
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

struct AcceptedCandidate<'a> {
    signature: &'a Signature,
    offset: u64,
    parse: ParseResult,
}

pub struct CarveOrchestrator<'a> {
    registry: &'a SignatureRegistry,
    options: CarveOptions,
}

impl<'a> CarveOrchestrator<'a> {
    pub fn new(registry: &'a SignatureRegistry, options: CarveOptions) -> Self {
        CarveOrchestrator { registry, options }
    }

    pub fn run(
        &self,
        dump: &DumpSource,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<CarveRun, CarveError> {
        let scanner = SignatureScanner::build(self.registry);

        // Step 2: scan. Progress [0, 0.5].
        let mut scan_cancelled = false;
        let candidates = scanner.scan(dump, self.options.chunk_size, |fraction| {
            if cancel.is_cancelled() {
                scan_cancelled = true;
            }
            progress.report((fraction as f32) * 0.5);
        });

        if scan_cancelled {
            return Ok(CarveRun { manifest: Vec::new(), warnings: Vec::new(), cancelled: true });
        }

        // Step 3: dedup (signature_id, offset), then per-signature cap.
        let candidates = dedup_and_cap(candidates, self.options.per_type_cap);

        // Steps 4a-4c: acquire header window, dispatch parser. Independent
        // per candidate, so this runs in parallel; accepted extents are
        // gathered before overlap resolution runs.
        let pool_result = self.with_pool(|| {
            candidates
                .par_iter()
                .filter_map(|candidate| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let signature = self.registry.by_id(&candidate.signature_id)?;
                    let window_len = (signature.max_size as u64).min(MAX_HEADER_WINDOW);
                    let window = dump.read_at(candidate.offset, window_len.min(dump.len().saturating_sub(candidate.offset))).ok()?;
                    match parsers::parse(signature, window) {
                        Ok(parse) => {
                            if candidate.offset + parse.extent > dump.len() {
                                None
                            } else {
                                Some(AcceptedCandidate { signature, offset: candidate.offset, parse })
                            }
                        }
                        Err(_) => None,
                    }
                })
                .collect::<Vec<_>>()
        });

        let mut accepted = pool_result;
        accepted.sort_by_key(|c| c.offset);

        // Step 5: overlap resolution, ascending offset, deterministic
        // (priority desc, extent desc, offset asc) tie-break.
        let mut claims = IntervalSet::new();
        let winners: Vec<&AcceptedCandidate> = accepted
            .iter()
            .filter(|c| claims.try_claim(c.offset, c.offset + c.parse.extent, c.signature.priority, c.parse.extent, c.offset))
            .collect();

        // Steps 6-9: create output dirs, name files, write, optionally convert.
        let manifest_sink = ManifestSink::new();
        let warnings = Mutex::new(Vec::new());
        let used_names: Mutex<HashMap<String, u32>> = Mutex::new(HashMap::new());
        let total = winners.len().max(1) as f32;
        let completed = std::sync::atomic::AtomicUsize::new(0);

        self.with_pool(|| {
            winners.par_iter().for_each(|candidate| {
                if cancel.is_cancelled() {
                    return;
                }
                self.extract_one(dump, candidate, &manifest_sink, &warnings, &used_names);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                progress.report(0.5 + 0.5 * (done as f32 / total));
            });
        });

        let manifest = manifest_sink.into_sorted_vec();
        let warnings = warnings.into_inner().expect("warnings mutex poisoned");
        Ok(CarveRun { manifest, warnings, cancelled: false })
    }

    fn with_pool<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        match self.options.workers {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .expect("worker pool builds")
                .install(f),
            None => f(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_one(
        &self,
        dump: &DumpSource,
        candidate: &AcceptedCandidate,
        manifest_sink: &ManifestSink,
        warnings: &Mutex<Vec<String>>,
        used_names: &Mutex<HashMap<String, u32>>,
    ) {
        let Ok(bytes) = dump.read_at(candidate.offset, candidate.parse.extent) else {
            warnings
                .lock()
                .expect("warnings mutex poisoned")
                .push(format!("{}@{:#x}: extent exceeds dump bounds", candidate.signature.id, candidate.offset));
            return;
        };

        let format_dir = self.options.output_root.join(&self.options.dump_stem).join(candidate.signature.output_folder);
        if let Err(e) = std::fs::create_dir_all(&format_dir) {
            warnings.lock().expect("warnings mutex poisoned").push(format!("{}: failed to create output dir: {e}", candidate.signature.id));
            return;
        }

        let base_name = candidate
            .parse
            .safe_name
            .clone()
            .unwrap_or_else(|| format!("{:08X}", candidate.offset));
        let filename = resolve_collision(&format_dir, used_names, &base_name, candidate.signature.extension);

        let path = format_dir.join(&filename);
        if let Err(e) = std::fs::write(&path, bytes) {
            warnings.lock().expect("warnings mutex poisoned").push(format!("{}: write failed: {e}", candidate.signature.id));
            return;
        }

        let mut content_type = candidate.parse.content_type.clone();
        let mut is_partial = false;
        let mut notes = None;

        if candidate.signature.id.starts_with("ddx") {
            if let Some(converter) = &self.options.converter {
                match converter.convert(ConversionKind::DdxToDds, bytes) {
                    Ok(conversion) => {
                        let converted_dir = self.options.output_root.join(&self.options.dump_stem).join(format!("{}_converted", candidate.signature.output_folder));
                        if std::fs::create_dir_all(&converted_dir).is_ok() {
                            let converted_path = converted_dir.join(filename.replace(".ddx", ".dds"));
                            if std::fs::write(&converted_path, &conversion.output_bytes).is_ok() {
                                notes = Some("converted".to_string());
                                content_type = content_type.or(Some("image/dds".to_string()));
                                is_partial = conversion.is_partial;
                            }
                        }
                    }
                    Err(e) => {
                        warnings.lock().expect("warnings mutex poisoned").push(format!("{}@{:#x}: conversion failed: {e}", candidate.signature.id, candidate.offset));
                    }
                }
            }
        }

        manifest_sink.push(CarveEntry {
            file_type: candidate.signature.id.to_string(),
            offset: candidate.offset,
            size_in_dump: candidate.parse.extent as u32,
            size_output: bytes.len() as u32,
            filename,
            is_compressed: candidate.parse.is_compressed,
            content_type,
            is_partial,
            notes,
        });
    }
}

fn dedup_and_cap(candidates: Vec<crate::signature::CandidateMatch>, per_type_cap: usize) -> Vec<crate::signature::CandidateMatch> {
    let mut seen = HashSet::new();
    let mut per_type: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();

    for candidate in candidates {
        let key = (candidate.signature_id.clone(), candidate.offset);
        if !seen.insert(key) {
            continue;
        }
        let count = per_type.entry(candidate.signature_id.clone()).or_insert(0);
        if *count >= per_type_cap {
            continue;
        }
        *count += 1;
        out.push(candidate);
    }

    out
}

fn resolve_collision(dir: &Path, used_names: &Mutex<HashMap<String, u32>>, base_name: &str, extension: &str) -> String {
    let sanitized: String = base_name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' }).collect();
    let mut guard = used_names.lock().expect("used_names mutex poisoned");
    let key = format!("{}/{sanitized}.{extension}", dir.display());

    let counter = guard.entry(key.clone()).or_insert(0);
    let filename = if *counter == 0 {
        format!("{sanitized}.{extension}")
    } else {
        format!("{sanitized}_{counter}.{extension}")
    };
    *counter += 1;
    filename
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignatureRegistry;
    use tempfile::tempdir;

    fn png_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"\x89PNG\r\n\x1a\n");
        buf.extend_from_slice(&13u32.to_be_bytes());
        buf.extend_from_slice(b"IHDR");
        buf.extend_from_slice(&[0u8; 13]);
        buf.extend_from_slice(&[0u8; 4]); // CRC
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(b"IEND");
        buf.extend_from_slice(&[0u8; 4]);
        buf
    }

    #[test]
    fn dedup_and_cap_drops_duplicates_and_enforces_cap() {
        let candidates = vec![
            crate::signature::CandidateMatch { signature_id: "dds".to_string(), offset: 10 },
            crate::signature::CandidateMatch { signature_id: "dds".to_string(), offset: 10 },
            crate::signature::CandidateMatch { signature_id: "dds".to_string(), offset: 20 },
        ];
        let result = dedup_and_cap(candidates, 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].offset, 10);
    }

    fn dds_header_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut header = vec![0u8; 128]; // 4-byte magic + 124-byte DDS_HEADER
        header[0..4].copy_from_slice(b"DDS ");
        header[4..8].copy_from_slice(&124u32.to_le_bytes());
        header[12..16].copy_from_slice(&height.to_le_bytes());
        header[16..20].copy_from_slice(&width.to_le_bytes());
        header[28..32].copy_from_slice(&1u32.to_le_bytes()); // mip count
        header[84..88].copy_from_slice(b"DXT1");
        header
    }

    #[test]
    fn s2_dds_and_png_both_carved() {
        let dir = tempdir().unwrap();
        let registry = SignatureRegistry::builtin();

        let mut buf = vec![0u8; 0x2500];
        let header = dds_header_bytes(64, 64);
        buf[0x100..0x100 + header.len()].copy_from_slice(&header);
        buf.resize(0x100 + 8192, 0);

        buf.extend_from_slice(&png_bytes());

        let dump = DumpSource::from_bytes(buf);
        let options = CarveOptions::new(dir.path(), "dump");
        let orchestrator = CarveOrchestrator::new(&registry, options);
        let run = orchestrator.run(&dump, &crate::progress::NullSink, &CancellationToken::new()).unwrap();

        assert!(run.manifest.iter().any(|e| e.file_type == "dds" && e.offset == 0x100));
        assert!(run.manifest.iter().any(|e| e.file_type == "png"));
    }

    #[test]
    fn manifest_entries_exist_on_disk() {
        let dir = tempdir().unwrap();
        let registry = SignatureRegistry::builtin();
        let mut buf = vec![0u8; 64];
        buf[0..4].copy_from_slice(b"LIP ");
        buf[8..12].copy_from_slice(&32u32.to_be_bytes());

        let dump = DumpSource::from_bytes(buf);
        let options = CarveOptions::new(dir.path(), "dump");
        let orchestrator = CarveOrchestrator::new(&registry, options);
        let run = orchestrator.run(&dump, &crate::progress::NullSink, &CancellationToken::new()).unwrap();

        assert_eq!(run.manifest.len(), 1);
        let entry = &run.manifest[0];
        let path = dir.path().join("dump").join("lipsync").join(&entry.filename);
        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), entry.size_output as u64);
    }
}
