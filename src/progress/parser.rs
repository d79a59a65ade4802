// src/progress/parser.rs

//! Stateless `PROGRESS:<n>` decoder.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::ProgressEvent;

/// Tag emitted by the wiper and factory-reset executables, followed by a
/// decimal percentage. Changing it on either side breaks progress reporting.
pub const PROGRESS_PATTERN: &str = r"PROGRESS:(\d+)";

static PROGRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROGRESS_PATTERN).expect("PROGRESS_PATTERN is a valid regex"));

/// Decode every progress tag in `chunk`.
///
/// The chunk is split on `\n`, `\r\n` and bare `\r`. Each line containing the
/// tag yields one event with the integer exactly as reported (no clamping).
/// Lines without the tag are ignored. Nothing is carried over between calls,
/// so a tag split across two chunks is lost; see
/// [`LineAssembler`](super::LineAssembler) for the buffered variant.
pub fn parse_chunk(chunk: &str) -> Vec<ProgressEvent> {
    chunk.split(['\n', '\r']).filter_map(parse_line).collect()
}

/// Decode a single line, if it carries a progress tag.
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    let caps = PROGRESS_RE.captures(line)?;
    let digits = caps.get(1)?.as_str();
    match digits.parse::<i64>() {
        Ok(percent) => Some(ProgressEvent { percent }),
        Err(e) => {
            debug!(digits, error = %e, "progress value out of range; ignoring line");
            None
        }
    }
}
