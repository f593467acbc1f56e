//! Incremental text edits sent by the host for unsaved buffers.

use serde::{Deserialize, Serialize};

/// Replaces the bytes `[start, end)` of a buffer with `text`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// First byte replaced.
    pub start: usize,
    /// One past the last byte replaced.
    pub end: usize,
    /// Replacement text.
    pub text: String,
}

impl TextEdit {
    /// Creates an edit replacing `[start, end)` with `text`.
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Applies edits in order, each against the buffer produced by the previous
/// ones.
///
/// Offsets past the end of the buffer are clamped to its length and an
/// `end` before `start` is treated as an insertion at `start`.
pub fn apply_edits(content: &[u8], edits: &[TextEdit]) -> Vec<u8> {
    let mut buffer = content.to_vec();
    for edit in edits {
        let start = edit.start.min(buffer.len());
        let end = edit.end.clamp(start, buffer.len());
        buffer.splice(start..end, edit.text.bytes());
    }
    buffer
}
