//! Drives the end-to-end scan → parse → extract → manifest pipeline.

mod interval_set;
mod manifest;
mod orchestrator;

pub use manifest::{to_json, CarveEntry, ManifestSink};
pub use orchestrator::{CancellationToken, CarveOptions, CarveOrchestrator, CarveRun};
