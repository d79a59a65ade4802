// src/progress/assembler.rs

use super::parser::parse_chunk;
use super::ProgressEvent;

/// Buffers the unterminated tail of each chunk so that a progress line split
/// across reads is decoded once its terminator arrives.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk and decode every line it completes.
    pub fn push(&mut self, chunk: &str) -> Vec<ProgressEvent> {
        self.pending.push_str(chunk);

        let Some(end) = self.pending.rfind(['\n', '\r']) else {
            return Vec::new();
        };

        let tail = self.pending.split_off(end + 1);
        let complete = std::mem::replace(&mut self.pending, tail);
        parse_chunk(&complete)
    }

    /// Decode whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Vec<ProgressEvent> {
        let rest = std::mem::take(&mut self.pending);
        parse_chunk(&rest)
    }

    /// Bytes currently held back waiting for a line terminator.
    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
