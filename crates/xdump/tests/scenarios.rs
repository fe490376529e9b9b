//! End-to-end carving scenarios against synthetic in-memory dumps.
//!
//! Carving two co-resident formats, a minidump round trip, and the hash
//! table walk already have dedicated end-to-end coverage inline next to
//! the components they exercise (`carve::orchestrator`, `dump::minidump`,
//! `runtime`). This file covers size-overrun rejection and overlap
//! resolution at the orchestrator level, plus per-type capping.

use tempfile::tempdir;
use xdump::carve::{CancellationToken, CarveOptions, CarveOrchestrator};
use xdump::dump::DumpSource;
use xdump::progress::NullSink;
use xdump::signature::SignatureRegistry;

fn dds_header_bytes(width: u32, height: u32, fourcc: &[u8; 4]) -> Vec<u8> {
    let mut header = vec![0u8; 128];
    header[0..4].copy_from_slice(b"DDS ");
    header[4..8].copy_from_slice(&124u32.to_le_bytes());
    header[12..16].copy_from_slice(&height.to_le_bytes());
    header[16..20].copy_from_slice(&width.to_le_bytes());
    header[28..32].copy_from_slice(&1u32.to_le_bytes());
    header[84..88].copy_from_slice(fourcc);
    header
}

/// A DDS header whose declared extent exceeds the signature's `max_size`
/// is rejected outright and never appears in the manifest.
#[test]
fn oversized_candidate_is_rejected() {
    let dir = tempdir().unwrap();
    let registry = SignatureRegistry::builtin();

    // A huge mip count pushes the computed extent past `max_size`
    // (64 MiB for DDS) while still passing header validation.
    let mut buf = dds_header_bytes(16384, 16384, b"\0\0\0\0");
    buf[28..32].copy_from_slice(&12u32.to_le_bytes()); // mip count

    let dump = DumpSource::from_bytes(buf);
    let options = CarveOptions::new(dir.path(), "dump");
    let orchestrator = CarveOrchestrator::new(&registry, options);
    let run = orchestrator
        .run(&dump, &NullSink, &CancellationToken::new())
        .unwrap();

    assert!(run.manifest.is_empty());
}

/// Two signatures whose byte ranges overlap resolve to the
/// higher-priority, longer-extent candidate; the loser is dropped
/// entirely rather than truncated or both being kept.
#[test]
fn overlapping_candidates_resolve_by_priority() {
    let dir = tempdir().unwrap();
    let registry = SignatureRegistry::builtin();

    // XEX (priority 90) header placed so its declared extent overlaps
    // an SCDA candidate (priority 30) whose magic sits inside the XEX
    // body. Only the higher-priority XEX record should survive.
    let mut buf = vec![0u8; 4096];
    buf[0..4].copy_from_slice(b"XEX2");
    buf[8..12].copy_from_slice(&0x400u32.to_be_bytes()); // header_size
    buf[16..20].copy_from_slice(&0u32.to_be_bytes()); // security_offset
    buf[20..24].copy_from_slice(&1u32.to_be_bytes()); // directory entry count
    buf[24..28].copy_from_slice(&1u32.to_be_bytes()); // entry id
    buf[28..32].copy_from_slice(&2048u32.to_be_bytes()); // entry value (furthest reference)

    buf[512..516].copy_from_slice(b"SCDA");
    buf[516..520].copy_from_slice(&64u32.to_be_bytes());

    let dump = DumpSource::from_bytes(buf);
    let options = CarveOptions::new(dir.path(), "dump");
    let orchestrator = CarveOrchestrator::new(&registry, options);
    let run = orchestrator
        .run(&dump, &NullSink, &CancellationToken::new())
        .unwrap();

    assert!(run.manifest.iter().any(|e| e.file_type == "xex" && e.offset == 0));
    assert!(!run.manifest.iter().any(|e| e.file_type == "scda"));
}

/// A combined run exercises the per-type cap alongside normal carving,
/// confirming the cap is honored without starving other signature types
/// of their own budget.
#[test]
fn per_type_cap_does_not_affect_other_signature_types() {
    let dir = tempdir().unwrap();
    let registry = SignatureRegistry::builtin();

    let mut buf = vec![0u8; 1024];
    for i in 0..5u64 {
        let offset = (i * 64) as usize;
        buf[offset..offset + 4].copy_from_slice(b"LIP ");
        buf[offset + 8..offset + 12].copy_from_slice(&16u32.to_be_bytes());
    }
    buf.extend_from_slice(&dds_header_bytes(32, 32, b"DXT1"));
    buf.resize(buf.len() + 512, 0);

    let dump = DumpSource::from_bytes(buf);
    let mut options = CarveOptions::new(dir.path(), "dump");
    options.per_type_cap = 2;
    let orchestrator = CarveOrchestrator::new(&registry, options);
    let run = orchestrator
        .run(&dump, &NullSink, &CancellationToken::new())
        .unwrap();

    assert_eq!(run.manifest.iter().filter(|e| e.file_type == "lip").count(), 2);
    assert!(run.manifest.iter().any(|e| e.file_type == "dds"));
}
