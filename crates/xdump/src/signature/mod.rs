//! Signature catalog and magic-byte scanning.

mod registry;
mod scanner;

pub use registry::{ParserKind, Signature, SignatureRegistry, SimpleHeaderLayout, SizeFieldWidth};
pub use scanner::{CandidateMatch, SignatureScanner};
