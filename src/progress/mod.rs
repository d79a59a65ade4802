// src/progress/mod.rs

//! Progress decoding for privileged process output.
//!
//! - [`parser`] is the stateless line decoder for the `PROGRESS:<n>` tag.
//! - [`assembler`] wraps it with a carry buffer for lines split across
//!   output chunks.

pub mod assembler;
pub mod parser;

pub use assembler::LineAssembler;
pub use parser::{parse_chunk, parse_line, PROGRESS_PATTERN};

/// One decoded progress tick. The value is whatever the process printed; it is
/// not clamped to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: i64,
}
