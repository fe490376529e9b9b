//! Multi-pattern magic-byte scanning over a dump.
//!
//! Tens of magic patterns need to stay live concurrently over a
//! multi-gigabyte dump, so this builds one Aho-Corasick automaton over the
//! whole catalog instead of scanning once per signature with
//! `memchr::memmem`.

use crate::dump::DumpSource;
use crate::signature::registry::SignatureRegistry;
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// A raw hit: some signature's magic bytes occur at `offset` in the dump.
/// Not yet validated by a format parser — a hit can still be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMatch {
    pub signature_id: String,
    pub offset: u64,
}

/// Scans a dump for every registered signature's magic bytes in one pass.
pub struct SignatureScanner {
    automaton: AhoCorasick,
    signature_ids: Vec<String>,
    max_pattern_len: usize,
}

impl SignatureScanner {
    /// Builds the automaton from every signature in `registry`. O(sum of
    /// pattern lengths) to build; reused across the whole scan phase.
    pub fn build(registry: &SignatureRegistry) -> Self {
        let signature_ids: Vec<String> = registry
            .signatures()
            .iter()
            .map(|s| s.id.to_string())
            .collect();
        let patterns: Vec<&[u8]> = registry.signatures().iter().map(|s| s.magic).collect();
        let max_pattern_len = patterns.iter().map(|p| p.len()).max().unwrap_or(1);

        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .expect("signature magics form a valid Aho-Corasick automaton");

        SignatureScanner {
            automaton,
            signature_ids,
            max_pattern_len,
        }
    }

    /// Scans the whole dump in bounded, overlapping windows so no magic
    /// straddling a window boundary is missed. `on_progress` is called after
    /// each window with the fraction of the dump consumed so far, in [0, 1].
    ///
    /// Matches are returned in ascending `offset` order within this call, but
    /// duplicate hits from overlapping windows are not removed here — that
    /// is the orchestrator's job, since only it knows which duplicates have
    /// already been claimed by an accepted candidate.
    pub fn scan<F: FnMut(f64)>(
        &self,
        dump: &DumpSource,
        chunk_size: usize,
        mut on_progress: F,
    ) -> Vec<CandidateMatch> {
        let overlap = self.max_pattern_len.saturating_sub(1);
        let total = dump.len().max(1) as f64;
        let mut hits = Vec::new();

        for window in dump.windows(chunk_size, overlap) {
            for m in self.automaton.find_overlapping_iter(window.bytes) {
                hits.push(CandidateMatch {
                    signature_id: self.signature_ids[m.pattern().as_usize()].clone(),
                    offset: window.global_offset + m.start() as u64,
                });
            }
            let consumed = (window.global_offset + window.bytes.len() as u64) as f64;
            on_progress((consumed / total).min(1.0));
        }

        hits.sort_by_key(|h| h.offset);
        hits
    }
}
