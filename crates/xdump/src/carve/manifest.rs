//! The manifest: one row per successfully carved candidate, serialised as
//! a stable JSON array.

use serde::Serialize;
use std::sync::Mutex;

/// One manifest row. Field names and order form an external, stable
/// contract for downstream tooling.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CarveEntry {
    pub file_type: String,
    pub offset: u64,
    pub size_in_dump: u32,
    pub size_output: u32,
    pub filename: String,
    pub is_compressed: bool,
    pub content_type: Option<String>,
    pub is_partial: bool,
    pub notes: Option<String>,
}

/// Append-only accumulator shared by every worker during the extract pass.
/// Order at insertion time is unspecified; [`ManifestSink::into_sorted_vec`]
/// restores the `(file_type, offset)` ordering the output contract
/// requires.
#[derive(Default)]
pub struct ManifestSink {
    entries: Mutex<Vec<CarveEntry>>,
}

impl ManifestSink {
    pub fn new() -> Self {
        ManifestSink::default()
    }

    pub fn push(&self, entry: CarveEntry) {
        self.entries.lock().expect("manifest mutex poisoned").push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("manifest mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the sink and returns entries ordered by `(file_type, offset)`,
    /// the final serialisation order.
    pub fn into_sorted_vec(self) -> Vec<CarveEntry> {
        let mut entries = self.entries.into_inner().expect("manifest mutex poisoned");
        entries.sort_by(|a, b| a.file_type.cmp(&b.file_type).then(a.offset.cmp(&b.offset)));
        entries
    }
}

pub fn to_json(entries: &[CarveEntry]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file_type: &str, offset: u64) -> CarveEntry {
        CarveEntry {
            file_type: file_type.to_string(),
            offset,
            size_in_dump: 100,
            size_output: 100,
            filename: format!("{offset:08X}.bin"),
            is_compressed: false,
            content_type: None,
            is_partial: false,
            notes: None,
        }
    }

    #[test]
    fn sorted_vec_orders_by_type_then_offset() {
        let sink = ManifestSink::new();
        sink.push(entry("png", 200));
        sink.push(entry("dds", 500));
        sink.push(entry("dds", 100));

        let sorted = sink.into_sorted_vec();
        let keys: Vec<(&str, u64)> = sorted.iter().map(|e| (e.file_type.as_str(), e.offset)).collect();
        assert_eq!(keys, vec![("dds", 100), ("dds", 500), ("png", 200)]);
    }

    #[test]
    fn json_round_trips_field_names() {
        let json = to_json(&[entry("dds", 10)]).unwrap();
        assert!(json.contains("\"file_type\""));
        assert!(json.contains("\"size_in_dump\""));
        assert!(json.contains("\"is_compressed\""));
    }
}
