//! Format parsers: given a candidate's header window, decide accept/reject
//! and compute the byte extent to carve.
//!
//! Every parser here is pure and side-effect free: it reads only from
//! the window it is handed and never touches the
//! filesystem. Rejection is a plain value, not an error — `RejectReason`
//! does not implement `std::error::Error` on purpose, mirroring
//! `crate::error`'s note that bounded-read failures are absorbed here
//! rather than propagated.

mod dds;
mod ddx;
mod nif;
mod png;
mod simple_header;
mod xex;
mod xma;

use crate::signature::{ParserKind, Signature};

/// What a successful parse contributes to the carved record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// Total byte extent of the candidate, starting at its offset.
    pub extent: u64,
    pub content_type: Option<String>,
    /// A sanitised filename derived from an in-file string, if any. The
    /// orchestrator prefers this over the default `{offset_hex}` name.
    pub safe_name: Option<String>,
    pub is_compressed: bool,
}

/// Why a candidate was turned down. Not an error: a rejected candidate is
/// simply dropped by the orchestrator, never surfaced to the caller as a
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    HeaderInvalid,
    SizeOutOfBounds,
    OutOfBounds,
}

/// Dispatches to the parser bound to `signature.parser_kind`. `window` is
/// the header window the orchestrator acquired for this candidate —
/// `min(signature.max_size, 64 KiB)` bytes starting at the candidate offset.
pub fn parse(signature: &Signature, window: &[u8]) -> Result<ParseResult, RejectReason> {
    match signature.parser_kind {
        ParserKind::Dds => dds::parse(window, signature),
        ParserKind::Ddx => ddx::parse(window, signature),
        ParserKind::Xma => xma::parse(window, signature),
        ParserKind::Png => png::parse(window, signature),
        ParserKind::Nif => nif::parse(window, signature),
        ParserKind::Xex => xex::parse(window, signature),
        ParserKind::SimpleHeader(layout) => simple_header::parse(window, signature, layout),
    }
}
